//! Stratified k-fold cross-validation.

use crate::algorithms::Algorithm;
use crate::config::CvConfig;
use crate::data::{Label, TrainingSet};
use crate::error::{MlError, Result};
use crate::training::pipeline::Pipeline;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Train/test index split for one fold. Both lists are ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// K-fold splitter that keeps class proportions roughly equal across folds.
///
/// Each class's samples, in input order, are cut into `n_folds` consecutive
/// groups whose sizes differ by at most one (larger groups first). Fold `i`
/// tests on the union of every class's group `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_folds: usize,
}

impl Default for StratifiedKFold {
    fn default() -> Self {
        Self::new(3)
    }
}

impl StratifiedKFold {
    pub fn new(n_folds: usize) -> Self {
        Self { n_folds }
    }

    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    pub fn split(&self, labels: &[Label]) -> Result<Vec<Fold>> {
        let k = self.n_folds;
        if k < 2 {
            return Err(MlError::invalid_input(format!(
                "cross-validation needs at least 2 folds, got {k}"
            )));
        }
        if labels.len() < k {
            return Err(MlError::invalid_input(format!(
                "cannot split {} samples into {k} folds",
                labels.len()
            )));
        }

        let mut by_class: BTreeMap<&Label, Vec<usize>> = BTreeMap::new();
        for (i, label) in labels.iter().enumerate() {
            by_class.entry(label).or_default().push(i);
        }
        if let Some(smallest) = by_class.values().map(Vec::len).min() {
            if smallest < k {
                tracing::warn!(
                    smallest,
                    n_folds = k,
                    "the least populated class has fewer members than folds"
                );
            }
        }

        let mut test_fold = vec![0; labels.len()];
        for members in by_class.values() {
            let base = members.len() / k;
            let extra = members.len() % k;
            let mut start = 0;
            for fold in 0..k {
                let size = base + usize::from(fold < extra);
                for &i in &members[start..start + size] {
                    test_fold[i] = fold;
                }
                start += size;
            }
        }

        let folds: Vec<Fold> = (0..k)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&i| test_fold[i] == fold);
                Fold { train, test }
            })
            .collect();

        if let Some(i) = folds.iter().position(|f| f.test.is_empty()) {
            return Err(MlError::invalid_input(format!(
                "fold {i} has no test samples; every class has fewer members than {k} folds"
            )));
        }
        Ok(folds)
    }
}

/// Accuracy of `algorithm` on each held-out fold, in fold order.
///
/// Each fold fits a fresh pipeline on its training part only. Folds run on a
/// dedicated pool of `cv.n_jobs` threads; the result does not depend on the
/// pool size.
pub fn cross_val_score(algorithm: &Algorithm, set: &TrainingSet, cv: &CvConfig) -> Result<Vec<f64>> {
    let folds = StratifiedKFold::new(cv.n_folds).split(set.labels())?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cv.n_jobs.max(1))
        .build()
        .map_err(|e| MlError::training(format!("cannot start CV workers: {e}")))?;

    pool.install(|| {
        folds
            .par_iter()
            .enumerate()
            .map(|(i, fold)| -> Result<f64> {
                let train = set.subset(&fold.train)?;
                let test = set.subset(&fold.test)?;
                let pipeline = Pipeline::fit(algorithm, &train)?;
                let score = pipeline.score(&test)?;
                tracing::debug!(
                    algorithm = %algorithm.kind(),
                    fold = i,
                    train = fold.train.len(),
                    test = fold.test.len(),
                    score,
                    "fold scored"
                );
                Ok(score)
            })
            .collect()
    })
}

pub fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
