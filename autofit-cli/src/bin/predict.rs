//! Print per-row class probabilities from a saved model.

use anyhow::{Context, Result};
use autofit_cli::Verbosity;
use autofit_ml::{PredictionRequest, persistence};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "predict", version, about, long_about = None)]
struct Cli {
    /// Directory written by `train`
    model_dir: PathBuf,

    /// Prediction request: {"data": [...]}
    input: PathBuf,

    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    autofit_cli::init(cli.verbosity);

    let model_id = cli
        .model_dir
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("cannot derive a model id from {}", cli.model_dir.display()))?;
    let model = persistence::load(&cli.model_dir, model_id)
        .with_context(|| format!("failed to load model {model_id}"))?;
    let request = PredictionRequest::load(&cli.input)
        .with_context(|| format!("failed to read prediction request {}", cli.input.display()))?;

    let predictions = model
        .predict_labels(&request.data)
        .context("prediction failed")?;
    tracing::debug!(rows = predictions.len(), algorithm = %model.algorithm(), "predicted");
    println!("{}", serde_json::to_string_pretty(&predictions)?);
    Ok(())
}
