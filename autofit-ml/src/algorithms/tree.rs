//! CART decision trees shared by the ensemble classifiers.
//!
//! Nodes live in a flat arena; children are referenced by index. Trees are
//! grown depth-first from an explicit work stack.

use crate::error::{MlError, Result};
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Node impurity measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Gini impurity over class indices; leaves hold class distributions.
    Gini { n_classes: usize },
    /// Squared error over real targets; leaves hold the weighted mean.
    SquaredError,
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Non-constant features examined per split; `None` examines all.
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Training view handed to the builder.
pub struct TreeInput<'a> {
    pub x: ArrayView2<'a, f64>,
    /// Class index (as f64) for Gini, regression target otherwise.
    pub targets: &'a [f64],
    pub weights: &'a [f64],
    /// Rows participating in this tree.
    pub samples: Vec<usize>,
}

struct Work {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    cost: f64,
}

impl DecisionTree {
    pub fn fit(
        input: TreeInput<'_>,
        criterion: Criterion,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let TreeInput {
            x,
            targets,
            weights,
            samples,
        } = input;
        if samples.is_empty() {
            return Err(MlError::training("cannot grow a tree from zero samples"));
        }
        if targets.len() != x.nrows() || weights.len() != x.nrows() {
            return Err(MlError::training(format!(
                "tree input has {} rows but {} targets and {} weights",
                x.nrows(),
                targets.len(),
                weights.len()
            )));
        }
        if let Criterion::Gini { n_classes } = criterion {
            if targets.iter().any(|&t| t < 0.0 || t as usize >= n_classes) {
                return Err(MlError::training("class index out of range"));
            }
        }

        let builder = Builder {
            x,
            targets,
            weights,
            criterion,
            params,
        };
        let mut tree = Self { nodes: Vec::new() };
        let mut features: Vec<usize> = (0..x.ncols()).collect();

        tree.nodes.push(Node::Leaf { value: Vec::new() });
        let mut stack = vec![Work {
            node: 0,
            samples,
            depth: 0,
        }];

        while let Some(work) = stack.pop() {
            let stats = builder.stats(&work.samples);
            let leaf = Node::Leaf {
                value: builder.leaf_value(&stats),
            };

            let n = work.samples.len();
            let depth_reached = params.max_depth.is_some_and(|d| work.depth >= d);
            if depth_reached
                || n < params.min_samples_split
                || n < 2 * params.min_samples_leaf
                || builder.impurity(&stats) <= 1e-12
            {
                tree.nodes[work.node] = leaf;
                continue;
            }

            features.shuffle(rng);
            let Some(best) = builder.best_split(&work.samples, &features) else {
                tree.nodes[work.node] = leaf;
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = work
                .samples
                .iter()
                .partition(|&&s| x[[s, best.feature]] <= best.threshold);

            let left = tree.nodes.len();
            tree.nodes.push(Node::Leaf { value: Vec::new() });
            let right = tree.nodes.len();
            tree.nodes.push(Node::Leaf { value: Vec::new() });
            tree.nodes[work.node] = Node::Split {
                feature: best.feature,
                threshold: best.threshold,
                left,
                right,
            };
            tracing::trace!(
                node = work.node,
                feature = best.feature,
                threshold = best.threshold,
                cost = best.cost,
                "split"
            );

            stack.push(Work {
                node: right,
                samples: right_samples,
                depth: work.depth + 1,
            });
            stack.push(Work {
                node: left,
                samples: left_samples,
                depth: work.depth + 1,
            });
        }

        Ok(tree)
    }

    /// Index of the leaf `row` falls into.
    pub fn apply(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { .. } => return idx,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        match &self.nodes[self.apply(row)] {
            Node::Leaf { value } => value,
            Node::Split { .. } => &[],
        }
    }

    /// Replace the value stored in leaf `node`.
    pub fn set_leaf_value(&mut self, node: usize, value: Vec<f64>) -> Result<()> {
        match self.nodes.get_mut(node) {
            Some(Node::Leaf { value: slot }) => {
                *slot = value;
                Ok(())
            }
            _ => Err(MlError::model(format!("node {node} is not a leaf"))),
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

struct Builder<'a, 'p> {
    x: ArrayView2<'a, f64>,
    targets: &'a [f64],
    weights: &'a [f64],
    criterion: Criterion,
    params: &'p TreeParams,
}

impl Builder<'_, '_> {
    /// Gini: weighted class counts. Squared error: `[weight, sum, sum_sq]`.
    fn empty_stats(&self) -> Vec<f64> {
        match self.criterion {
            Criterion::Gini { n_classes } => vec![0.0; n_classes],
            Criterion::SquaredError => vec![0.0; 3],
        }
    }

    fn add(&self, stats: &mut [f64], sample: usize, sign: f64) {
        let w = self.weights[sample] * sign;
        let t = self.targets[sample];
        match self.criterion {
            Criterion::Gini { .. } => stats[t as usize] += w,
            Criterion::SquaredError => {
                stats[0] += w;
                stats[1] += w * t;
                stats[2] += w * t * t;
            }
        }
    }

    fn stats(&self, samples: &[usize]) -> Vec<f64> {
        let mut stats = self.empty_stats();
        for &s in samples {
            self.add(&mut stats, s, 1.0);
        }
        stats
    }

    fn total_weight(&self, stats: &[f64]) -> f64 {
        match self.criterion {
            Criterion::Gini { .. } => stats.iter().sum(),
            Criterion::SquaredError => stats[0],
        }
    }

    fn impurity(&self, stats: &[f64]) -> f64 {
        let w = self.total_weight(stats);
        if w <= 0.0 {
            return 0.0;
        }
        match self.criterion {
            Criterion::Gini { .. } => 1.0 - stats.iter().map(|c| (c / w) * (c / w)).sum::<f64>(),
            Criterion::SquaredError => {
                let mean = stats[1] / w;
                (stats[2] / w - mean * mean).max(0.0)
            }
        }
    }

    fn leaf_value(&self, stats: &[f64]) -> Vec<f64> {
        let w = self.total_weight(stats);
        match self.criterion {
            Criterion::Gini { .. } => {
                if w > 0.0 {
                    stats.iter().map(|c| c / w).collect()
                } else {
                    stats.to_vec()
                }
            }
            Criterion::SquaredError => vec![if w > 0.0 { stats[1] / w } else { 0.0 }],
        }
    }

    fn best_split(&self, samples: &[usize], features: &[usize]) -> Option<BestSplit> {
        let budget = self.params.max_features.unwrap_or(features.len()).max(1);
        let total = self.stats(samples);
        let min_leaf = self.params.min_samples_leaf.max(1);
        let n = samples.len();

        let mut best: Option<BestSplit> = None;
        let mut visited = 0;
        let mut sorted = samples.to_vec();

        for &feature in features {
            if visited >= budget && best.is_some() {
                break;
            }
            sorted.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));
            let lo = self.x[[sorted[0], feature]];
            let hi = self.x[[sorted[n - 1], feature]];
            if hi <= lo {
                continue;
            }
            visited += 1;

            let mut left = self.empty_stats();
            let mut right = total.clone();
            for i in 0..n - 1 {
                let s = sorted[i];
                self.add(&mut left, s, 1.0);
                self.add(&mut right, s, -1.0);

                let here = self.x[[s, feature]];
                let next = self.x[[sorted[i + 1], feature]];
                if next <= here {
                    continue;
                }
                if i + 1 < min_leaf || n - i - 1 < min_leaf {
                    continue;
                }

                let cost = self.total_weight(&left) * self.impurity(&left)
                    + self.total_weight(&right) * self.impurity(&right);
                if best.as_ref().is_none_or(|b| cost < b.cost) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        cost,
                    });
                }
            }
        }

        best
    }
}
