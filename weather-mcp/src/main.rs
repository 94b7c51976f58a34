//! Binary crate for the `weather-mcp` command.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging to stderr (stdout carries protocol traffic)
//! - Printing tool output for terminal use

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
