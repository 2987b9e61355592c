//! Read stdin and print a Go source file declaring it as a raw string.

use anyhow::{Context, Result};
use autofit_cli::Verbosity;
use autofit_cli::wrap::wrap_source;
use clap::Parser;
use std::io;

#[derive(Parser, Debug)]
#[command(name = "wrap", version, about, long_about = None)]
struct Cli {
    /// Name of the Go variable to declare
    variable: String,

    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    autofit_cli::init(cli.verbosity);

    let stats = wrap_source(&cli.variable, io::stdin().lock(), io::stdout().lock())
        .context("failed to copy stdin to stdout")?;
    if stats.backtick_lines > 0 {
        tracing::warn!(
            lines = stats.backtick_lines,
            "input contains backticks; the generated source will not compile"
        );
    }
    tracing::debug!(lines = stats.lines, bytes = stats.bytes, "wrapped");
    Ok(())
}
