//! Model metadata records written next to each artifact as `<model_id>.json`.

use crate::data::TrainingSet;
use crate::error::{MlError, Result};
use crate::persistence::atomic_write;
use crate::training::{TrainedModel, confusion_matrix};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Nested `true label -> predicted label -> count` table.
pub type ConfusionTable = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub metadata: ModelInfo,
    pub performance: Performance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(with = "micros")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub algorithm: String,
    pub score: f64,
    pub confusion_matrix: ConfusionTable,
}

/// RFC 3339 with microsecond precision and a `Z` suffix.
///
/// The fraction is always written, so a whole second prints `.000000`
/// rather than being dropped.
mod micros {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

pub fn metadata_path(dir: &Path, model_id: &str) -> PathBuf {
    dir.join(format!("{model_id}.json"))
}

/// Assemble the record for `model`, predicting over all of `set` for the
/// confusion matrix.
pub fn build_metadata(
    model_id: &str,
    model_name: &str,
    model: &TrainedModel,
    set: &TrainingSet,
    created_at: DateTime<Utc>,
) -> Result<ModelMetadata> {
    let predicted = model.predict(set.features())?;
    let matrix = confusion_matrix(set.labels(), &predicted, model.classes());
    Ok(ModelMetadata {
        model_id: model_id.to_string(),
        metadata: ModelInfo {
            name: model_name.to_string(),
            created_at,
        },
        performance: Performance {
            algorithm: model.algorithm().to_string(),
            score: model.cv_score(),
            confusion_matrix: matrix.to_float_map(),
        },
    })
}

/// Build the record stamped with the current time (truncated to
/// microseconds) and write it to `<dir>/<model_id>.json`.
pub fn save_metadata(
    dir: &Path,
    model_id: &str,
    model_name: &str,
    model: &TrainedModel,
    set: &TrainingSet,
) -> Result<ModelMetadata> {
    let record = build_metadata(model_id, model_name, model, set, Utc::now().trunc_subsecs(6))?;
    let path = metadata_path(dir, model_id);
    atomic_write(&path, serde_json::to_string_pretty(&record)?.as_bytes())?;
    tracing::info!(path = %path.display(), "metadata saved");
    Ok(record)
}

pub fn load_metadata(dir: &Path, model_id: &str) -> Result<ModelMetadata> {
    let path = metadata_path(dir, model_id);
    if !path.exists() {
        return Err(MlError::not_found(format!("metadata {}", path.display())));
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}
