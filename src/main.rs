// Entrypoint for the jflint binary.
// - Logs go to stderr so stdout only ever carries Jenkins' answer.
// - Any error bubbles up here and `anyhow` turns it into a non-zero exit.

use std::io::IsTerminal;

use clap::Parser;
use jflint::cli::{run, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // RUST_LOG wins; otherwise only our own info-level messages are shown.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jflint=info"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .without_time(),
        )
        .with(filter)
        .init();

    run(Cli::parse())
}
