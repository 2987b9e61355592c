//! Classification metrics.

use crate::data::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fraction of positions where `predicted` matches `truth`.
pub fn accuracy(truth: &[Label], predicted: &[Label]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}

/// Square table of counts: rows are true classes, columns predicted classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub classes: Vec<Label>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Pairs whose true or predicted label is not in `classes` are ignored.
    pub fn new(truth: &[Label], predicted: &[Label], classes: &[Label]) -> Self {
        let k = classes.len();
        let mut counts = vec![vec![0; k]; k];
        for (t, p) in truth.iter().zip(predicted) {
            let (Some(i), Some(j)) = (position(classes, t), position(classes, p)) else {
                continue;
            };
            counts[i][j] += 1;
        }
        Self {
            classes: classes.to_vec(),
            counts,
        }
    }

    pub fn row_sums(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn total(&self) -> usize {
        self.row_sums().iter().sum()
    }

    /// Nested `true -> predicted -> count` map with float counts, so every
    /// cell (zeros included) serializes as a JSON number.
    pub fn to_float_map(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.classes
            .iter()
            .zip(&self.counts)
            .map(|(truth, row)| {
                let cells = self
                    .classes
                    .iter()
                    .zip(row)
                    .map(|(pred, &count)| (pred.to_string(), count as f64))
                    .collect();
                (truth.to_string(), cells)
            })
            .collect()
    }
}

/// Confusion matrix over `classes`, in that order.
pub fn confusion_matrix(truth: &[Label], predicted: &[Label], classes: &[Label]) -> ConfusionMatrix {
    ConfusionMatrix::new(truth, predicted, classes)
}

fn position(classes: &[Label], label: &Label) -> Option<usize> {
    classes.iter().position(|c| c == label)
}
