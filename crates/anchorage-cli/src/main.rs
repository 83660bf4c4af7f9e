//! # anc — Anchorage CLI
//!
//! Resolves deployment manifests that reference buildable source locations
//! into manifests that reference digest-pinned artifact names.

mod commands;

use clap::Parser;

use crate::commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli).await
}
