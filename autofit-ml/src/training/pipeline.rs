//! Vectorizer + classifier, fitted and applied as one unit.

use crate::algorithms::{Algorithm, AlgorithmKind, Classifier, FittedClassifier};
use crate::data::{FeatureMap, Label, TrainingSet};
use crate::error::{MlError, Result};
use crate::features::DictVectorizer;
use crate::training::metrics::accuracy;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    vectorizer: DictVectorizer,
    classifier: FittedClassifier,
    /// Learned class ordering; column `k` of `predict_proba` is `classes[k]`.
    classes: Vec<Label>,
}

impl Pipeline {
    pub fn fit(algorithm: &Algorithm, set: &TrainingSet) -> Result<Self> {
        let classes = set.classes();
        let y = set
            .labels()
            .iter()
            .map(|label| {
                classes
                    .binary_search(label)
                    .map_err(|_| MlError::dataset(format!("label {label} missing from classes")))
            })
            .collect::<Result<Vec<usize>>>()?;

        let mut vectorizer = DictVectorizer::new();
        let x = vectorizer.fit_transform(set.features())?;
        let classifier = algorithm.fit(x.view(), &y, classes.len())?;

        Ok(Self {
            vectorizer,
            classifier,
            classes,
        })
    }

    pub fn predict_proba(&self, rows: &[FeatureMap]) -> Result<Array2<f64>> {
        let x = self.vectorizer.transform(rows)?;
        self.classifier.predict_proba(x.view())
    }

    pub fn predict(&self, rows: &[FeatureMap]) -> Result<Vec<Label>> {
        let x = self.vectorizer.transform(rows)?;
        let indices = self.classifier.predict(x.view())?;
        indices
            .into_iter()
            .map(|k| {
                self.classes
                    .get(k)
                    .cloned()
                    .ok_or_else(|| MlError::model(format!("class index {k} out of range")))
            })
            .collect()
    }

    /// Mean accuracy on `set`.
    pub fn score(&self, set: &TrainingSet) -> Result<f64> {
        let predicted = self.predict(set.features())?;
        Ok(accuracy(set.labels(), &predicted))
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    pub fn algorithm(&self) -> AlgorithmKind {
        self.classifier.kind()
    }

    pub fn vectorizer(&self) -> &DictVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &FittedClassifier {
        &self.classifier
    }
}
