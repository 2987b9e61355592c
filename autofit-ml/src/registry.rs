//! Directory-backed index of trained models.
//!
//! Layout: one sub-directory per model under the root, each holding
//! `<model_id>.pkl` and `<model_id>.json`.

use crate::error::{MlError, Result};
use crate::metadata::{self, ModelMetadata};
use crate::persistence;
use crate::training::TrainedModel;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ModelRepo {
    root: PathBuf,
}

impl ModelRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_dir(&self, model_id: &str) -> PathBuf {
        self.root.join(model_id)
    }

    pub fn load_metadata(&self, model_id: &str) -> Result<ModelMetadata> {
        metadata::load_metadata(&self.model_dir(model_id), model_id)
    }

    pub fn load_model(&self, model_id: &str) -> Result<TrainedModel> {
        persistence::load(&self.model_dir(model_id), model_id)
    }

    /// Metadata of every model under the root, sorted by id.
    ///
    /// Sub-directories without readable metadata are logged and skipped.
    pub fn index(&self) -> Result<Vec<ModelMetadata>> {
        if !self.root.is_dir() {
            return Err(MlError::not_found(format!(
                "model root {}",
                self.root.display()
            )));
        }

        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(model_id) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 directory");
                continue;
            };
            match self.load_metadata(&model_id) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(model_id = %model_id, error = %e, "skipping model directory")
                }
            }
        }
        records.sort_by(|a, b| a.model_id.cmp(&b.model_id));
        tracing::debug!(count = records.len(), root = %self.root.display(), "models indexed");
        Ok(records)
    }
}
