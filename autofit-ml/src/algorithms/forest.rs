//! Random-forest ensemble of Gini trees.

use super::Classifier;
use super::tree::{Criterion, DecisionTree, TreeInput, TreeParams};
use crate::error::{MlError, Result};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How many features each split may examine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            Self::All => n_features,
            Self::Sqrt => (n_features as f64).sqrt() as usize,
            Self::Log2 => (n_features as f64).log2() as usize,
            Self::Count(k) => k,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    #[serde(default = "default_max_features")]
    pub max_features: MaxFeatures,
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,
    /// Seed for bootstrap draws and feature sampling.
    #[serde(default)]
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: default_max_features(),
            bootstrap: default_bootstrap(),
            seed: 0,
        }
    }
}

fn default_n_estimators() -> usize {
    150
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_max_features() -> MaxFeatures {
    MaxFeatures::Sqrt
}

fn default_bootstrap() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: RandomForestParams,
    n_classes: usize,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn new(params: RandomForestParams) -> Self {
        Self {
            params,
            n_classes: 0,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize], n_classes: usize) -> Result<()> {
        if n_classes == 0 || y.is_empty() {
            return Err(MlError::training("RandomForestClassifier needs labeled samples"));
        }
        if x.nrows() != y.len() {
            return Err(MlError::training("feature rows and labels differ in length"));
        }

        let n = y.len();
        let targets: Vec<f64> = y.iter().map(|&c| c as f64).collect();
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: Some(self.params.max_features.resolve(x.ncols())),
        };

        // Seeds are drawn up front so the forest does not depend on scheduling.
        let mut master = StdRng::seed_from_u64(self.params.seed);
        let seeds: Vec<u64> = (0..self.params.n_estimators)
            .map(|_| master.next_u64())
            .collect();

        let bootstrap = self.params.bootstrap;
        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut weights = vec![0.0; n];
                if bootstrap {
                    for _ in 0..n {
                        weights[rng.gen_range(0..n)] += 1.0;
                    }
                } else {
                    weights.fill(1.0);
                }
                let samples = (0..n).filter(|&i| weights[i] > 0.0).collect();
                DecisionTree::fit(
                    TreeInput {
                        x: x.view(),
                        targets: &targets,
                        weights: &weights,
                        samples,
                    },
                    Criterion::Gini { n_classes },
                    &tree_params,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            trees = trees.len(),
            leaves = trees.iter().map(DecisionTree::n_leaves).sum::<usize>(),
            "random forest fitted"
        );
        self.trees = trees;
        self.n_classes = n_classes;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(MlError::model("RandomForestClassifier used before fit"));
        }
        if x.ncols() != self.n_features {
            return Err(MlError::model(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let scale = 1.0 / self.trees.len() as f64;
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            for tree in &self.trees {
                for (k, p) in tree.predict_row(row).iter().enumerate() {
                    proba[[i, k]] += p * scale;
                }
            }
        }
        Ok(proba)
    }
}
