//! Model artifact persistence with atomic writes of `<model_id>.pkl`.
//!
//! The artifact is the JSON encoding of [`TrainedModel`]. Floats are written
//! in shortest round-trip form and parsed exactly, so a reloaded model gives
//! the same predictions as the one that was saved.

use crate::error::{MlError, Result};
use crate::training::TrainedModel;
use std::path::{Path, PathBuf};

/// File extension of serialized model artifacts.
pub const MODEL_EXTENSION: &str = "pkl";

/// Atomically write raw bytes to a file.
///
/// Writes to a `<file name>.tmp` sibling, then renames over the target path.
/// Creates parent directories if they don't exist.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Temp sibling of `path`; the full file name is kept so `m.pkl` and
/// `m.json` never share one.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Path of the artifact for `model_id` inside `dir`.
pub fn model_path(dir: &Path, model_id: &str) -> PathBuf {
    dir.join(format!("{model_id}.{MODEL_EXTENSION}"))
}

/// Serialize `model` to `<dir>/<model_id>.pkl`, creating `dir` if needed.
pub fn save(dir: &Path, model_id: &str, model: &TrainedModel) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = model_path(dir, model_id);
    let bytes = serde_json::to_vec(model)?;
    atomic_write(&path, &bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "model saved");
    Ok(())
}

/// Load a model previously written by [`save`].
pub fn load(dir: &Path, model_id: &str) -> Result<TrainedModel> {
    let path = model_path(dir, model_id);
    if !path.exists() {
        return Err(MlError::not_found(format!("model artifact {}", path.display())));
    }
    let bytes = std::fs::read(&path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
