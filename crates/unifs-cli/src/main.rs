//! `unifs` command-line entry point.
//!
//! ```bash
//! unifs ls files://reports
//! unifs cp files://reports/q1.csv scratch://q1.csv
//! echo hello | unifs put scratch://greeting.txt
//! ```

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use unifs_cli::Cli;
use unifs_core::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries command output, so logs go to stderr (respects RUST_LOG)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let fs = unifs_cli::load_file_system(cli.config.as_deref())?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling");
            interrupt.cancel();
        }
    });

    let mut stdout = tokio::io::stdout();
    unifs_cli::execute(&fs, cli.command, cli.json, &mut stdout, &cancel).await?;
    stdout.flush().await?;
    Ok(())
}
