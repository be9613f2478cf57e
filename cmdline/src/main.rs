//! cmdline - run a command and follow its output and exit code.
//!
//! The binary is a thin client over the library's `ProcessWrapper`:
//! child stdout goes to stdout, child stderr goes to stderr, and the
//! process exits with the child's exit code.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!(?cli, "parsed arguments");

    let code = execute(cli).await?;
    std::process::exit(code);
}
