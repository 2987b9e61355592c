//! Labeled attribute-value examples.

use crate::error::{MlError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A single attribute value inside a feature mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Attribute name to value. Ordered so vectorization is deterministic.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// A class label as it appears in the input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Label {
    fn numeric(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Integer(_) => 0,
            Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

impl Ord for Label {
    /// Numbers sort numerically and before text; text sorts lexicographically.
    /// `Integer(1)` and `Float(1.0)` compare equal.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => match (self.numeric(), other.numeric()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Label {}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            // Debug keeps the decimal point: 1.0 renders as "1.0".
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Bring a label column to one representation.
///
/// Any text label turns every label into text (by its display form). Otherwise
/// any float label turns integer labels into floats. A column of one kind is
/// returned unchanged.
pub fn unify_labels(labels: Vec<Label>) -> Vec<Label> {
    let has_text = labels.iter().any(|l| matches!(l, Label::Text(_)));
    let has_number = labels.iter().any(|l| !matches!(l, Label::Text(_)));
    let has_float = labels.iter().any(|l| matches!(l, Label::Float(_)));

    if has_text && has_number {
        labels
            .into_iter()
            .map(|l| match l {
                Label::Text(_) => l,
                other => Label::Text(other.to_string()),
            })
            .collect()
    } else if has_float {
        labels
            .into_iter()
            .map(|l| match l {
                Label::Integer(v) => Label::Float(v as f64),
                other => other,
            })
            .collect()
    } else {
        labels
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Feature mappings paired one-to-one with labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    features: Vec<FeatureMap>,
    labels: Vec<Label>,
}

impl TrainingSet {
    pub fn new(features: Vec<FeatureMap>, labels: Vec<Label>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(MlError::invalid_input(format!(
                "{} feature mappings but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if features.is_empty() {
            return Err(MlError::invalid_input("training set is empty"));
        }
        Ok(Self {
            features,
            labels: unify_labels(labels),
        })
    }

    pub fn features(&self) -> &[FeatureMap] {
        &self.features
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sorted distinct labels.
    pub fn classes(&self) -> Vec<Label> {
        let mut classes = self.labels.clone();
        classes.sort();
        classes.dedup();
        classes
    }

    /// Examples at `indices`, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        let mut features = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            let (Some(f), Some(l)) = (self.features.get(i), self.labels.get(i)) else {
                return Err(MlError::dataset(format!(
                    "index {i} out of range for {} examples",
                    self.len()
                )));
            };
            features.push(f.clone());
            labels.push(l.clone());
        }
        Self::new(features, labels)
    }
}

/// The trainer's input document: `{ "data": [...], "labels": [...], "name": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub data: Vec<FeatureMap>,
    pub labels: Vec<Label>,
    pub name: String,
}

impl TrainingRequest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Split into the model name and a validated training set.
    pub fn into_parts(self) -> Result<(String, TrainingSet)> {
        let set = TrainingSet::new(self.data, self.labels)?;
        Ok((self.name, set))
    }
}

/// Input for prediction: `{ "data": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub data: Vec<FeatureMap>,
}

impl PredictionRequest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_deserialize_by_json_type() {
        let labels: Vec<Label> = serde_json::from_str(r#"[1, 2.5, "x"]"#).unwrap();
        assert!(matches!(labels[0], Label::Integer(1)));
        assert!(matches!(labels[1], Label::Float(v) if v == 2.5));
        assert!(matches!(&labels[2], Label::Text(s) if s == "x"));
    }

    #[test]
    fn test_label_ordering_numeric_before_text() {
        let mut labels = vec![
            Label::from("b"),
            Label::Integer(10),
            Label::from("a"),
            Label::Float(2.5),
            Label::Integer(2),
        ];
        labels.sort();
        let rendered: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        assert_eq!(rendered, vec!["2", "2.5", "10", "a", "b"]);
    }

    #[test]
    fn test_integer_and_float_labels_are_one_class() {
        let labels: Vec<Label> = serde_json::from_str("[1, 1.0, 2, 2.0, 1, 2.0]").unwrap();
        let set = TrainingSet::new(vec![FeatureMap::new(); 6], labels).unwrap();
        assert_eq!(set.classes(), vec![Label::Float(1.0), Label::Float(2.0)]);
        let rendered: Vec<String> = set.classes().iter().map(Label::to_string).collect();
        assert_eq!(rendered, vec!["1.0", "2.0"]);
        assert_eq!(Label::Integer(3), Label::Float(3.0));
    }

    #[test]
    fn test_mixed_text_and_number_labels_become_text() {
        let labels: Vec<Label> = serde_json::from_str(r#"["1", 1, "1", 1, "a", 2.5]"#).unwrap();
        let set = TrainingSet::new(vec![FeatureMap::new(); 6], labels).unwrap();
        assert!(set.labels().iter().all(|l| matches!(l, Label::Text(_))));
        assert_eq!(
            set.classes(),
            vec![Label::from("1"), Label::from("2.5"), Label::from("a")]
        );
    }

    #[test]
    fn test_integer_only_labels_unchanged() {
        let labels = vec![Label::Integer(2), Label::Integer(1)];
        assert_eq!(unify_labels(labels.clone()), labels);
        assert!(matches!(unify_labels(labels)[0], Label::Integer(2)));
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Float(1.0).to_string(), "1.0");
        assert_eq!(Label::Integer(-3).to_string(), "-3");
        assert_eq!(Label::from("spam").to_string(), "spam");
    }

    #[test]
    fn test_feature_values_deserialize() {
        let map: FeatureMap =
            serde_json::from_str(r#"{"a": 1, "b": "red", "c": true}"#).unwrap();
        assert_eq!(map["a"], FeatureValue::Number(1.0));
        assert_eq!(map["b"], FeatureValue::Text("red".into()));
        assert_eq!(map["c"], FeatureValue::Bool(true));
    }

    #[test]
    fn test_null_feature_value_rejected() {
        let parsed: std::result::Result<FeatureMap, _> = serde_json::from_str(r#"{"a": null}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_training_set_length_mismatch() {
        let err = TrainingSet::new(vec![FeatureMap::new()], vec![]).unwrap_err();
        assert!(matches!(err, MlError::InvalidInput(_)));
    }

    #[test]
    fn test_training_set_empty_rejected() {
        assert!(TrainingSet::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_classes_sorted_and_distinct() {
        let set = TrainingSet::new(
            vec![FeatureMap::new(); 4],
            vec!["y".into(), "x".into(), "y".into(), "x".into()],
        )
        .unwrap();
        assert_eq!(set.classes(), vec![Label::from("x"), Label::from("y")]);
    }

    #[test]
    fn test_subset_preserves_order() {
        let set = TrainingSet::new(
            vec![FeatureMap::new(); 3],
            vec![Label::Integer(0), Label::Integer(1), Label::Integer(2)],
        )
        .unwrap();
        let sub = set.subset(&[2, 0]).unwrap();
        assert_eq!(sub.labels(), &[Label::Integer(2), Label::Integer(0)]);
        assert!(set.subset(&[5]).is_err());
    }

    #[test]
    fn test_training_request_parts() {
        let req: TrainingRequest = serde_json::from_str(
            r#"{"data": [{"a": 1}, {"a": 2}], "labels": ["x", "y"], "name": "demo"}"#,
        )
        .unwrap();
        let (name, set) = req.into_parts().unwrap();
        assert_eq!(name, "demo");
        assert_eq!(set.len(), 2);
    }
}
