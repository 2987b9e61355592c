//! Model selection over the fixed candidate set.

use crate::algorithms::{Algorithm, AlgorithmKind};
use crate::config::TrainerConfig;
use crate::data::TrainingSet;
use crate::error::{MlError, Result};
use crate::training::cross_validation::{cross_val_score, mean};
use crate::training::model::TrainedModel;
use crate::training::pipeline::Pipeline;
use serde::{Deserialize, Serialize};

/// Cross-validation outcome for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub algorithm: AlgorithmKind,
    pub fold_scores: Vec<f64>,
    pub mean: f64,
}

/// Score every candidate, in priority order.
pub fn evaluate_candidates(
    set: &TrainingSet,
    config: &TrainerConfig,
) -> Result<Vec<(Algorithm, CandidateScore)>> {
    Algorithm::candidates(config)
        .into_iter()
        .map(|algorithm| {
            let fold_scores = cross_val_score(&algorithm, set, &config.cv)?;
            let score = CandidateScore {
                algorithm: algorithm.kind(),
                mean: mean(&fold_scores),
                fold_scores,
            };
            tracing::info!(
                algorithm = %score.algorithm,
                score = score.mean,
                "candidate evaluated"
            );
            Ok((algorithm, score))
        })
        .collect()
}

/// Index of the strictly best mean; earlier candidates win ties.
pub fn select_best(scores: &[CandidateScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, candidate) in scores.iter().enumerate() {
        if best.is_none_or(|b| candidate.mean > scores[b].mean) {
            best = Some(i);
        }
    }
    best
}

/// Pick the best candidate by mean CV accuracy, refit it on all of `set`, and
/// attach the CV mean as the model's score.
pub fn fit(set: &TrainingSet, config: &TrainerConfig) -> Result<TrainedModel> {
    config.validate()?;
    let evaluated = evaluate_candidates(set, config)?;
    let scores: Vec<CandidateScore> = evaluated.iter().map(|(_, s)| s.clone()).collect();
    let best = select_best(&scores).ok_or_else(|| MlError::training("no candidate algorithms"))?;
    let (algorithm, score) = &evaluated[best];

    tracing::info!(
        algorithm = %score.algorithm,
        score = score.mean,
        examples = set.len(),
        "refitting best candidate on all data"
    );
    let pipeline = Pipeline::fit(algorithm, set)?;
    Ok(TrainedModel::new(pipeline, score.mean))
}
