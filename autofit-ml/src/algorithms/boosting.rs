//! Gradient-boosted regression trees with deviance loss.
//!
//! Two classes use the binomial deviance with one tree per stage. More classes
//! use the multinomial deviance with one tree per class per stage. Leaf values
//! are replaced by a single Newton step on the loss after each tree is grown.

use super::Classifier;
use super::linear::sigmoid;
use super::tree::{Criterion, DecisionTree, TreeInput, TreeParams};
use crate::error::{MlError, Result};
use ndarray::{Array2, ArrayView2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const EPS: f64 = 1e-15;

/// Gradient boosting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
        }
    }
}

fn default_n_estimators() -> usize {
    150
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_depth() -> usize {
    3
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    params: GradientBoostingParams,
    n_classes: usize,
    n_features: usize,
    /// Initial raw score per output (one for binary, one per class otherwise).
    init: Vec<f64>,
    /// `stages[m][k]` is the tree for output `k` at stage `m`.
    stages: Vec<Vec<DecisionTree>>,
}

impl GradientBoostingClassifier {
    pub fn new(params: GradientBoostingParams) -> Self {
        Self {
            params,
            n_classes: 0,
            n_features: 0,
            init: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    fn n_outputs(n_classes: usize) -> usize {
        if n_classes == 2 { 1 } else { n_classes }
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: Some(self.params.max_depth),
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: None,
        }
    }

    fn raw_scores(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let outputs = self.init.len();
        let mut raw = Array2::zeros((x.nrows(), outputs));
        for (i, row) in x.rows().into_iter().enumerate() {
            for k in 0..outputs {
                raw[[i, k]] = self.init[k];
            }
            for stage in &self.stages {
                for (k, tree) in stage.iter().enumerate() {
                    raw[[i, k]] += self.params.learning_rate * tree.predict_row(row)[0];
                }
            }
        }
        raw
    }
}

impl Classifier for GradientBoostingClassifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize], n_classes: usize) -> Result<()> {
        if n_classes < 2 {
            return Err(MlError::training(format!(
                "GradientBoostingClassifier needs samples of at least 2 classes; got {n_classes}"
            )));
        }
        if x.nrows() != y.len() || y.is_empty() {
            return Err(MlError::training("feature rows and labels differ in length"));
        }

        let n = y.len();
        let outputs = Self::n_outputs(n_classes);
        let mut counts = vec![0.0; n_classes];
        for &c in y {
            counts[c] += 1.0;
        }
        let priors: Vec<f64> = counts
            .iter()
            .map(|c| (c / n as f64).clamp(EPS, 1.0 - EPS))
            .collect();
        let init: Vec<f64> = if outputs == 1 {
            vec![(priors[1] / (1.0 - priors[1])).ln()]
        } else {
            priors.iter().map(|p| p.ln()).collect()
        };

        // One-hot targets per output.
        let truth = |i: usize, k: usize| -> f64 {
            let class = if outputs == 1 { 1 } else { k };
            if y[i] == class { 1.0 } else { 0.0 }
        };

        let mut raw = Array2::zeros((n, outputs));
        for i in 0..n {
            for k in 0..outputs {
                raw[[i, k]] = init[k];
            }
        }

        let tree_params = self.tree_params();
        let weights = vec![1.0; n];
        let mut rng = StdRng::seed_from_u64(0);
        let mut stages = Vec::with_capacity(self.params.n_estimators);
        let lr = self.params.learning_rate;

        for _ in 0..self.params.n_estimators {
            let proba = probabilities(&raw);
            let mut stage = Vec::with_capacity(outputs);
            for k in 0..outputs {
                let residuals: Vec<f64> = (0..n).map(|i| truth(i, k) - proba[[i, k]]).collect();
                let mut tree = DecisionTree::fit(
                    TreeInput {
                        x: x.view(),
                        targets: &residuals,
                        weights: &weights,
                        samples: (0..n).collect(),
                    },
                    Criterion::SquaredError,
                    &tree_params,
                    &mut rng,
                )?;

                let mut leaves: HashMap<usize, (f64, f64)> = HashMap::new();
                for (i, &r) in residuals.iter().enumerate() {
                    let entry = leaves.entry(tree.apply(x.row(i))).or_default();
                    entry.0 += r;
                    entry.1 += if outputs == 1 {
                        let p = proba[[i, k]];
                        p * (1.0 - p)
                    } else {
                        r.abs() * (1.0 - r.abs())
                    };
                }
                let scale = if outputs == 1 {
                    1.0
                } else {
                    (outputs as f64 - 1.0) / outputs as f64
                };
                for (&leaf, &(numerator, denominator)) in &leaves {
                    let value = if denominator.abs() < 1e-150 {
                        0.0
                    } else {
                        scale * numerator / denominator
                    };
                    tree.set_leaf_value(leaf, vec![value])?;
                }

                for i in 0..n {
                    raw[[i, k]] += lr * tree.predict_row(x.row(i))[0];
                }
                stage.push(tree);
            }
            stages.push(stage);
        }

        tracing::debug!(stages = stages.len(), outputs, "gradient boosting fitted");
        self.n_classes = n_classes;
        self.n_features = x.ncols();
        self.init = init;
        self.stages = stages;
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if self.init.is_empty() {
            return Err(MlError::model("GradientBoostingClassifier used before fit"));
        }
        if x.ncols() != self.n_features {
            return Err(MlError::model(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        let raw = self.raw_scores(x);
        let proba = probabilities(&raw);
        if self.init.len() == 1 {
            let mut two = Array2::zeros((x.nrows(), 2));
            for i in 0..x.nrows() {
                two[[i, 0]] = 1.0 - proba[[i, 0]];
                two[[i, 1]] = proba[[i, 0]];
            }
            Ok(two)
        } else {
            Ok(proba)
        }
    }
}

/// Sigmoid for a single output column, softmax across several.
fn probabilities(raw: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(raw.dim());
    for (i, row) in raw.rows().into_iter().enumerate() {
        if row.len() == 1 {
            out[[i, 0]] = sigmoid(row[0]);
        } else {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = row.iter().map(|v| (v - max).exp()).collect();
            let total: f64 = exps.iter().sum();
            for (k, e) in exps.into_iter().enumerate() {
                out[[i, k]] = e / total;
            }
        }
    }
    out
}
