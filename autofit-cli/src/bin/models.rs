//! List the metadata of every model under a directory.

use anyhow::{Context, Result};
use autofit_cli::Verbosity;
use autofit_ml::ModelRepo;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "models", version, about, long_about = None)]
struct Cli {
    /// Directory holding one sub-directory per model
    model_root: PathBuf,

    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    autofit_cli::init(cli.verbosity);

    let repo = ModelRepo::new(cli.model_root.clone());
    let records = repo
        .index()
        .with_context(|| format!("failed to index {}", cli.model_root.display()))?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
