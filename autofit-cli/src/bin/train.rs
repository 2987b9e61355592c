//! Train the best of the candidate classifiers on a JSON request and save it.

use anyhow::{Context, Result};
use autofit_cli::Verbosity;
use autofit_ml::{TrainingRequest, fit, load_config, metadata, persistence};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "train", version, about, long_about = None)]
struct Cli {
    /// Directory to write the model into; its base name becomes the model id
    output_dir: PathBuf,

    /// Training request: {"data": [...], "labels": [...], "name": "..."}
    input: PathBuf,

    /// Extra configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    autofit_cli::init(cli.verbosity);

    let model_id = cli
        .output_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a model id from {}", cli.output_dir.display()))?;

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    let (name, set) = TrainingRequest::load(&cli.input)
        .and_then(TrainingRequest::into_parts)
        .with_context(|| format!("failed to read training request {}", cli.input.display()))?;
    tracing::info!(
        model_id = %model_id,
        examples = set.len(),
        classes = set.classes().len(),
        "training"
    );

    let model = fit(&set, &config).context("training failed")?;
    persistence::save(&cli.output_dir, &model_id, &model)
        .with_context(|| format!("failed to write model into {}", cli.output_dir.display()))?;
    metadata::save_metadata(&cli.output_dir, &model_id, &name, &model, &set)
        .with_context(|| format!("failed to write metadata into {}", cli.output_dir.display()))?;

    tracing::info!(
        model_id = %model_id,
        algorithm = %model.algorithm(),
        score = model.cv_score(),
        "model trained"
    );
    Ok(())
}
