//! Attribute-mapping vectorizer.
//!
//! Numeric and boolean attributes become one column named after the attribute.
//! String attributes are one-hot encoded into `attr=value` columns. Column
//! names are sorted, so the layout depends only on the set of names seen at
//! fit time.

use crate::data::{FeatureMap, FeatureValue};
use crate::error::{MlError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Dense vectorizer for attribute-value mappings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "VectorizerState", into = "VectorizerState")]
pub struct DictVectorizer {
    feature_names: Vec<String>,
    index: HashMap<String, usize>,
}

/// Persisted form; the column index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct VectorizerState {
    feature_names: Vec<String>,
}

impl From<VectorizerState> for DictVectorizer {
    fn from(state: VectorizerState) -> Self {
        let mut vec = Self {
            feature_names: state.feature_names,
            index: HashMap::new(),
        };
        vec.rebuild_index();
        vec
    }
}

impl From<DictVectorizer> for VectorizerState {
    fn from(vec: DictVectorizer) -> Self {
        Self {
            feature_names: vec.feature_names,
        }
    }
}

impl DictVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the output columns from `rows`.
    pub fn fit(&mut self, rows: &[FeatureMap]) -> Result<()> {
        let mut names = BTreeSet::new();
        for row in rows {
            for (attr, value) in row {
                names.insert(column_name(attr, value));
            }
        }
        if names.is_empty() {
            return Err(MlError::dataset(
                "no attributes found; every feature mapping is empty",
            ));
        }
        self.feature_names = names.into_iter().collect();
        self.rebuild_index();
        Ok(())
    }

    pub fn fit_transform(&mut self, rows: &[FeatureMap]) -> Result<Array2<f64>> {
        self.fit(rows)?;
        self.transform(rows)
    }

    /// Encode `rows` into a dense matrix. Unseen columns are dropped.
    pub fn transform(&self, rows: &[FeatureMap]) -> Result<Array2<f64>> {
        if self.feature_names.is_empty() {
            return Err(MlError::model("vectorizer used before fit"));
        }
        let mut matrix = Array2::zeros((rows.len(), self.feature_names.len()));
        for (r, row) in rows.iter().enumerate() {
            for (attr, value) in row {
                if let Some(&c) = self.index.get(column_name(attr, value).as_str()) {
                    matrix[[r, c]] = encode(value);
                }
            }
        }
        Ok(matrix)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
    }
}

fn column_name(attr: &str, value: &FeatureValue) -> String {
    match value {
        FeatureValue::Text(text) => format!("{attr}={text}"),
        FeatureValue::Bool(_) | FeatureValue::Number(_) => attr.to_string(),
    }
}

fn encode(value: &FeatureValue) -> f64 {
    match value {
        FeatureValue::Number(v) => *v,
        FeatureValue::Bool(true) | FeatureValue::Text(_) => 1.0,
        FeatureValue::Bool(false) => 0.0,
    }
}
