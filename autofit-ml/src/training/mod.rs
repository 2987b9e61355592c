//! Training: pipelines, cross-validation and model selection.

pub mod cross_validation;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod selection;

pub use cross_validation::{Fold, StratifiedKFold, cross_val_score};
pub use metrics::{ConfusionMatrix, accuracy, confusion_matrix};
pub use model::TrainedModel;
pub use pipeline::Pipeline;
pub use selection::{CandidateScore, evaluate_candidates, fit, select_best};
