//! `anc resolve` — resolve manifests to digest-pinned artifact names.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anchorage_build::{HashBuilder, NamingPublisher};
use anchorage_common::cancel::CancelToken;
use anchorage_common::constants::default_concurrent_builds;
use anchorage_resolve::{ResolveOptions, Resolver, Selector};
use clap::Args;

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Manifest file to resolve; repeatable. Use `-` for stdin.
    #[arg(short = 'f', long = "filename", required = true)]
    pub filenames: Vec<PathBuf>,

    /// Repository base the published names are qualified under.
    #[arg(long, env = "ANCHORAGE_REPO")]
    pub repo: String,

    /// Label selector filtering which documents are resolved and emitted.
    #[arg(short = 'l', long)]
    pub selector: Option<String>,

    /// Maximum number of concurrent builds.
    #[arg(short = 'j', long, default_value_t = default_concurrent_builds())]
    pub jobs: usize,

    /// Root directory importable locations are resolved under.
    #[arg(long, default_value = ".")]
    pub workspace_root: PathBuf,
}

/// Executes the `resolve` command.
///
/// # Errors
///
/// Returns an error if a selector is malformed, an input cannot be read,
/// or resolution fails for any file.
pub async fn execute(args: ResolveArgs) -> anyhow::Result<()> {
    let selector = args
        .selector
        .as_deref()
        .map(Selector::parse)
        .transpose()?;
    let options = ResolveOptions {
        selector,
        concurrent_builds: args.jobs,
    };

    let resolver = Resolver::new(
        Arc::new(HashBuilder::new(args.workspace_root.clone())),
        Arc::new(NamingPublisher::new(args.repo.clone())),
    );

    let cancel = CancelToken::new();
    let signal = cancel.clone();
    let _watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            signal.cancel();
        }
    });

    let mut outputs = Vec::with_capacity(args.filenames.len());
    for filename in &args.filenames {
        let input = read_input(filename)?;
        tracing::info!(file = %filename.display(), "resolving");
        let output = resolver.resolve(&input, &options, &cancel).await?;
        outputs.push(output);
    }

    print!("{}", join_outputs(outputs));
    Ok(())
}

/// Joins per-file outputs into one stream.
///
/// Each non-empty output is terminated with a newline before the `---`
/// separator so a file lacking a final newline cannot run into the next
/// document's marker. Outputs emptied by the selector are skipped.
fn join_outputs(outputs: impl IntoIterator<Item = String>) -> String {
    let mut joined = String::new();
    for mut output in outputs {
        if output.is_empty() {
            continue;
        }
        if !output.ends_with('\n') {
            output.push('\n');
        }
        if !joined.is_empty() {
            joined.push_str("---\n");
        }
        joined.push_str(&output);
    }
    joined
}

fn read_input(filename: &Path) -> anyhow::Result<String> {
    if filename.as_os_str() == "-" {
        let mut input = String::new();
        let _ = std::io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        Ok(std::fs::read_to_string(filename)?)
    }
}
