//! CLI command definitions and dispatch.

pub mod resolve;

use clap::{Parser, Subcommand};

/// Anchorage — digest-pinning manifest resolver.
#[derive(Parser, Debug)]
#[command(name = "anc", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve `anc://` references in manifests to digest-pinned names.
    Resolve(resolve::ResolveArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Resolve(args) => resolve::execute(args).await,
    }
}
