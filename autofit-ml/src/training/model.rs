//! The trainer's output: a fitted pipeline plus its cross-validation score.

use crate::algorithms::AlgorithmKind;
use crate::data::{FeatureMap, Label};
use crate::error::Result;
use crate::training::pipeline::Pipeline;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pipeline fitted on the full training set.
///
/// `cv_score` is the mean held-out accuracy measured during model selection,
/// not the accuracy of this particular fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pipeline: Pipeline,
    cv_score: f64,
}

impl TrainedModel {
    pub fn new(pipeline: Pipeline, cv_score: f64) -> Self {
        Self { pipeline, cv_score }
    }

    pub fn cv_score(&self) -> f64 {
        self.cv_score
    }

    pub fn algorithm(&self) -> AlgorithmKind {
        self.pipeline.algorithm()
    }

    pub fn classes(&self) -> &[Label] {
        self.pipeline.classes()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn predict(&self, rows: &[FeatureMap]) -> Result<Vec<Label>> {
        self.pipeline.predict(rows)
    }

    pub fn predict_proba(&self, rows: &[FeatureMap]) -> Result<Array2<f64>> {
        self.pipeline.predict_proba(rows)
    }

    /// Per row, a map from label string to class probability.
    pub fn predict_labels(&self, rows: &[FeatureMap]) -> Result<Vec<BTreeMap<String, f64>>> {
        let proba = self.predict_proba(rows)?;
        let names: Vec<String> = self.classes().iter().map(Label::to_string).collect();
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| names.iter().cloned().zip(row.iter().copied()).collect())
            .collect())
    }
}
