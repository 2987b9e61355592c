//! # autofit-ml: automatic classifier selection and model persistence
//!
//! Given labelled feature mappings, the trainer vectorizes them, scores a
//! fixed set of candidate classifiers by stratified cross-validation, refits
//! the best one on all data and persists it with a metadata record.
//!
//! ```no_run
//! use autofit_ml::{TrainerConfig, TrainingRequest, fit, persistence, metadata};
//! use std::path::Path;
//!
//! # fn main() -> autofit_ml::Result<()> {
//! let (name, set) = TrainingRequest::load(Path::new("input.json"))?.into_parts()?;
//! let model = fit(&set, &TrainerConfig::default())?;
//! persistence::save(Path::new("out/demo"), "demo", &model)?;
//! metadata::save_metadata(Path::new("out/demo"), "demo", &name, &model, &set)?;
//! # Ok(())
//! # }
//! ```

// Foundation
pub mod config;
pub mod error;

// Data & features
pub mod data;
pub mod features;

// Models
pub mod algorithms;
pub mod training;

// Storage
pub mod metadata;
pub mod persistence;
pub mod registry;

// Re-exports
pub use algorithms::{Algorithm, AlgorithmKind, Classifier};
pub use config::{TrainerConfig, load_config};
pub use data::{FeatureMap, FeatureValue, Label, PredictionRequest, TrainingRequest, TrainingSet};
pub use error::{MlError, Result};
pub use metadata::ModelMetadata;
pub use registry::ModelRepo;
pub use training::{TrainedModel, fit};
