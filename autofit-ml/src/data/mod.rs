//! Input data model for training and prediction requests.

pub mod dataset;

pub use dataset::{
    FeatureMap, FeatureValue, Label, PredictionRequest, TrainingRequest, TrainingSet, unify_labels,
};
