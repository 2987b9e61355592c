//! Classifier families evaluated by the trainer.
//!
//! Every family implements [`Classifier`]. [`Algorithm`] is the tagged
//! candidate configuration, [`FittedClassifier`] the tagged fitted model that
//! gets persisted.

pub mod boosting;
pub mod forest;
pub mod linear;
pub mod tree;

pub use boosting::{GradientBoostingClassifier, GradientBoostingParams};
pub use forest::{MaxFeatures, RandomForestClassifier, RandomForestParams};
pub use linear::{LinearParams, LogisticRegression};

use crate::config::TrainerConfig;
use crate::error::Result;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common fit/predict capability of every classifier family.
///
/// `y` holds class indices in `0..n_classes`; label mapping is the
/// pipeline's concern.
pub trait Classifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize], n_classes: usize) -> Result<()>;

    /// Row-wise class probabilities, `n_rows x n_classes`.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// Most probable class per row; the lowest index wins ties.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        Ok(argmax_rows(&self.predict_proba(x)?))
    }
}

pub fn argmax_rows(proba: &Array2<f64>) -> Vec<usize> {
    proba
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (k, &p) in row.iter().enumerate() {
                if p > row[best] {
                    best = k;
                }
            }
            best
        })
        .collect()
}

/// Classifier family name, as reported in model metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    LogisticRegression,
    GradientBoostingClassifier,
    RandomForestClassifier,
}

impl AlgorithmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogisticRegression => "LogisticRegression",
            Self::GradientBoostingClassifier => "GradientBoostingClassifier",
            Self::RandomForestClassifier => "RandomForestClassifier",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum Algorithm {
    Linear(LinearParams),
    GradientBoosting(GradientBoostingParams),
    RandomForest(RandomForestParams),
}

impl Algorithm {
    /// The fixed candidate set, in evaluation priority order.
    pub fn candidates(config: &TrainerConfig) -> Vec<Algorithm> {
        vec![
            Self::Linear(config.linear.clone()),
            Self::GradientBoosting(config.gradient_boosting.clone()),
            Self::RandomForest(config.random_forest.clone()),
        ]
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::Linear(_) => AlgorithmKind::LogisticRegression,
            Self::GradientBoosting(_) => AlgorithmKind::GradientBoostingClassifier,
            Self::RandomForest(_) => AlgorithmKind::RandomForestClassifier,
        }
    }

    /// Build a fresh classifier for this configuration and fit it.
    pub fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<FittedClassifier> {
        let mut clf = match self {
            Self::Linear(p) => FittedClassifier::Linear(LogisticRegression::new(p.clone())),
            Self::GradientBoosting(p) => {
                FittedClassifier::GradientBoosting(GradientBoostingClassifier::new(p.clone()))
            }
            Self::RandomForest(p) => {
                FittedClassifier::RandomForest(RandomForestClassifier::new(p.clone()))
            }
        };
        clf.fit(x, y, n_classes)?;
        Ok(clf)
    }
}

/// A fitted classifier of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum FittedClassifier {
    Linear(LogisticRegression),
    GradientBoosting(GradientBoostingClassifier),
    RandomForest(RandomForestClassifier),
}

impl FittedClassifier {
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::Linear(_) => AlgorithmKind::LogisticRegression,
            Self::GradientBoosting(_) => AlgorithmKind::GradientBoostingClassifier,
            Self::RandomForest(_) => AlgorithmKind::RandomForestClassifier,
        }
    }
}

impl Classifier for FittedClassifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize], n_classes: usize) -> Result<()> {
        match self {
            Self::Linear(c) => c.fit(x, y, n_classes),
            Self::GradientBoosting(c) => c.fit(x, y, n_classes),
            Self::RandomForest(c) => c.fit(x, y, n_classes),
        }
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        match self {
            Self::Linear(c) => c.predict_proba(x),
            Self::GradientBoosting(c) => c.predict_proba(x),
            Self::RandomForest(c) => c.predict_proba(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_candidates_in_priority_order() {
        let kinds: Vec<AlgorithmKind> = Algorithm::candidates(&TrainerConfig::default())
            .iter()
            .map(Algorithm::kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                AlgorithmKind::LogisticRegression,
                AlgorithmKind::GradientBoostingClassifier,
                AlgorithmKind::RandomForestClassifier,
            ]
        );
    }

    #[test]
    fn test_argmax_prefers_lowest_index_on_ties() {
        let proba = array![[0.5, 0.5], [0.2, 0.8], [0.4, 0.4]];
        assert_eq!(argmax_rows(&proba), vec![0, 1, 0]);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(AlgorithmKind::LogisticRegression.to_string(), "LogisticRegression");
        let json = serde_json::to_string(&AlgorithmKind::RandomForestClassifier).unwrap();
        assert_eq!(json, "\"RandomForestClassifier\"");
    }

    #[test]
    fn test_fitted_classifier_serde_tag() {
        let x = array![[0.0], [1.0]];
        let clf = Algorithm::Linear(LinearParams::default())
            .fit(x.view(), &[0, 1], 2)
            .unwrap();
        let value = serde_json::to_value(&clf).unwrap();
        assert_eq!(value["algorithm"], "linear");
        let back: FittedClassifier = serde_json::from_value(value).unwrap();
        assert_eq!(back, clf);
    }
}
