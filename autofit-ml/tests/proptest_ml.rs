//! Property-based tests for vectorization, fold splitting and training.

use proptest::prelude::*;

use autofit_ml::features::DictVectorizer;
use autofit_ml::training::StratifiedKFold;
use autofit_ml::{FeatureMap, FeatureValue, Label, TrainerConfig, TrainingSet, fit};
use std::collections::BTreeSet;

fn row_strategy() -> impl Strategy<Value = FeatureMap> {
    (
        prop::collection::btree_map("n[0-3]", -100.0f64..100.0, 0..4),
        prop::collection::btree_map("s[0-2]", "[a-c]", 0..3),
    )
        .prop_map(|(numeric, text)| {
            let mut row: FeatureMap = numeric
                .into_iter()
                .map(|(k, v)| (k, FeatureValue::Number(v)))
                .collect();
            row.extend(text.into_iter().map(|(k, v)| (k, FeatureValue::Text(v))));
            row
        })
}

// --- Vectorizer properties ---

proptest! {
    #[test]
    fn vectorizer_width_counts_numeric_attrs_and_text_pairs(
        rows in prop::collection::vec(row_strategy(), 1..20),
    ) {
        let mut expected = BTreeSet::new();
        for row in &rows {
            for (attr, value) in row {
                match value {
                    FeatureValue::Text(t) => expected.insert(format!("{attr}={t}")),
                    _ => expected.insert(attr.clone()),
                };
            }
        }
        prop_assume!(!expected.is_empty());

        let mut vec = DictVectorizer::new();
        let x = vec.fit_transform(&rows).unwrap();
        prop_assert_eq!(vec.n_features(), expected.len());
        prop_assert_eq!(x.ncols(), expected.len());
        prop_assert_eq!(x.nrows(), rows.len());
        prop_assert_eq!(vec.feature_names().to_vec(), expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn vectorizer_unseen_values_encode_to_zero(
        rows in prop::collection::vec(row_strategy(), 1..10),
    ) {
        let mut vec = DictVectorizer::new();
        prop_assume!(vec.fit(&rows).is_ok());
        let mut unseen = FeatureMap::new();
        unseen.insert("s9".into(), FeatureValue::Text("zzz".into()));
        unseen.insert("n9".into(), FeatureValue::Number(5.0));
        let x = vec.transform(&[unseen]).unwrap();
        prop_assert!(x.iter().all(|&v| v == 0.0));
    }
}

// --- Fold properties ---

proptest! {
    #[test]
    fn folds_partition_indices_or_report_thin_classes(
        raw in prop::collection::vec(0i64..4, 3..40),
        n_folds in 2usize..5,
    ) {
        prop_assume!(raw.len() >= n_folds);
        let labels: Vec<Label> = raw.iter().copied().map(Label::Integer).collect();
        let largest = (0..4).map(|c| raw.iter().filter(|&&v| v == c).count()).max().unwrap_or(0);

        match StratifiedKFold::new(n_folds).split(&labels) {
            Ok(folds) => {
                prop_assert_eq!(folds.len(), n_folds);
                let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.iter().copied()).collect();
                seen.sort_unstable();
                prop_assert_eq!(seen, (0..labels.len()).collect::<Vec<_>>());
                for fold in &folds {
                    prop_assert!(!fold.test.is_empty());
                    prop_assert_eq!(fold.train.len() + fold.test.len(), labels.len());
                    prop_assert!(fold.train.iter().all(|i| !fold.test.contains(i)));
                }
            }
            Err(_) => prop_assert!(largest < n_folds),
        }
    }
}

// --- Training properties ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn trained_score_is_a_fraction(
        values in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 6..12),
    ) {
        let features: Vec<FeatureMap> = values
            .iter()
            .map(|&(a, b)| {
                FeatureMap::from([
                    ("a".to_string(), FeatureValue::Number(a)),
                    ("b".to_string(), FeatureValue::Number(b)),
                ])
            })
            .collect();
        let labels: Vec<Label> = (0..values.len())
            .map(|i| Label::from(if i % 2 == 0 { "even" } else { "odd" }))
            .collect();
        let set = TrainingSet::new(features, labels).unwrap();

        let mut config = TrainerConfig::default();
        config.gradient_boosting.n_estimators = 10;
        config.random_forest.n_estimators = 10;
        let model = fit(&set, &config).unwrap();
        prop_assert!((0.0..=1.0).contains(&model.cv_score()));
        prop_assert_eq!(model.classes().len(), 2);
    }
}
