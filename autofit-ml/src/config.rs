//! Trainer configuration.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! explicit config file -> environment. The defaults reproduce the fixed
//! candidate set of the trainer (3-fold CV over 3 workers, default
//! logistic regression, 150-tree ensembles).

use crate::algorithms::{GradientBoostingParams, LinearParams, RandomForestParams};
use crate::error::{MlError, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level trainer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Cross-validation settings.
    #[serde(default)]
    pub cv: CvConfig,
    /// Logistic regression candidate.
    #[serde(default)]
    pub linear: LinearParams,
    /// Gradient-boosted ensemble candidate.
    #[serde(default)]
    pub gradient_boosting: GradientBoostingParams,
    /// Random-forest ensemble candidate.
    #[serde(default)]
    pub random_forest: RandomForestParams,
}

/// Cross-validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvConfig {
    /// Number of stratified folds.
    #[serde(default = "default_n_folds")]
    pub n_folds: usize,
    /// Worker threads used to evaluate folds.
    #[serde(default = "default_n_jobs")]
    pub n_jobs: usize,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            n_folds: default_n_folds(),
            n_jobs: default_n_jobs(),
        }
    }
}

fn default_n_folds() -> usize {
    3
}

fn default_n_jobs() -> usize {
    3
}

impl TrainerConfig {
    /// Reject settings no candidate can train with.
    pub fn validate(&self) -> Result<()> {
        if self.cv.n_folds < 2 {
            return Err(MlError::config(format!(
                "cv.n_folds must be at least 2, got {}",
                self.cv.n_folds
            )));
        }
        if self.cv.n_jobs == 0 {
            return Err(MlError::config("cv.n_jobs must be at least 1"));
        }
        if self.linear.c.is_nan() || self.linear.c <= 0.0 {
            return Err(MlError::config("linear.c must be positive"));
        }
        if self.linear.max_iter == 0 {
            return Err(MlError::config("linear.max_iter must be at least 1"));
        }
        let lr = self.gradient_boosting.learning_rate;
        if lr.is_nan() || lr <= 0.0 {
            return Err(MlError::config(
                "gradient_boosting.learning_rate must be positive",
            ));
        }
        if self.gradient_boosting.n_estimators == 0 {
            return Err(MlError::config(
                "gradient_boosting.n_estimators must be at least 1",
            ));
        }
        if self.random_forest.n_estimators == 0 {
            return Err(MlError::config(
                "random_forest.n_estimators must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Path of the user-level config file, if a config directory can be resolved.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "autofit", "autofit")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `AUTOFIT_`, `__` separates sections)
/// 2. Explicit config file (`--config`)
/// 3. User config (`~/.config/autofit/config.toml`)
/// 4. Built-in defaults
pub fn load_config(explicit: Option<&Path>) -> Result<TrainerConfig> {
    let mut figment = Figment::from(Serialized::defaults(TrainerConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(MlError::not_found(format!(
                "config file {}",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    // AUTOFIT_CV__N_FOLDS, AUTOFIT_RANDOM_FOREST__SEED, etc.
    figment = figment.merge(Env::prefixed("AUTOFIT_").split("__"));

    let config: TrainerConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::MaxFeatures;

    #[test]
    fn test_default_trainer_config() {
        let config = TrainerConfig::default();
        assert_eq!(config.cv.n_folds, 3);
        assert_eq!(config.cv.n_jobs, 3);
        assert_eq!(config.linear.c, 1.0);
        assert_eq!(config.gradient_boosting.n_estimators, 150);
        assert_eq!(config.random_forest.n_estimators, 150);
        assert_eq!(config.random_forest.max_features, MaxFeatures::Sqrt);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("empty").display());
            jail.create_file(
                "autofit.toml",
                "[cv]\nn_folds = 5\n\n[random_forest]\nn_estimators = 10\nmax_features = \"all\"\n",
            )?;

            let config = load_config(Some(Path::new("autofit.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.cv.n_folds, 5);
            assert_eq!(config.cv.n_jobs, 3);
            assert_eq!(config.random_forest.n_estimators, 10);
            assert_eq!(config.random_forest.max_features, MaxFeatures::All);
            assert_eq!(config.gradient_boosting.n_estimators, 150);
            Ok(())
        });
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_layer_priority_user_file_explicit_env() {
        figment::Jail::expect_with(|jail| {
            let dir = jail.directory().display().to_string();
            jail.set_env("XDG_CONFIG_HOME", dir);
            std::fs::create_dir_all(jail.directory().join("autofit")).map_err(|e| e.to_string())?;
            jail.create_file(
                "autofit/config.toml",
                "[cv]\nn_folds = 4\n\n[linear]\nc = 2.0\n\n[random_forest]\nn_estimators = 7\n",
            )?;
            jail.create_file(
                "explicit.toml",
                "[cv]\nn_folds = 6\n\n[gradient_boosting]\nn_estimators = 11\n",
            )?;
            jail.set_env("AUTOFIT_CV__N_FOLDS", 5);
            jail.set_env("AUTOFIT_RANDOM_FOREST__SEED", 42);

            let config = load_config(Some(Path::new("explicit.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.cv.n_folds, 5);
            assert_eq!(config.random_forest.seed, 42);
            assert_eq!(config.random_forest.n_estimators, 7);
            assert_eq!(config.linear.c, 2.0);
            assert_eq!(config.gradient_boosting.n_estimators, 11);
            assert_eq!(config.cv.n_jobs, 3);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_defaults_without_files() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("empty").display());
            jail.set_env("AUTOFIT_CV__N_JOBS", 1);
            jail.set_env("AUTOFIT_GRADIENT_BOOSTING__LEARNING_RATE", 0.5);

            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.cv.n_jobs, 1);
            assert_eq!(config.gradient_boosting.learning_rate, 0.5);
            assert_eq!(config.cv.n_folds, 3);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_value_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("empty").display());
            jail.set_env("AUTOFIT_CV__N_FOLDS", 1);
            assert!(matches!(load_config(None), Err(MlError::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/autofit.toml"))).unwrap_err();
        assert!(matches!(err, MlError::NotFound(_)));
    }

    #[test]
    fn test_validate_rejects_single_fold() {
        let mut config = TrainerConfig::default();
        config.cv.n_folds = 1;
        assert!(matches!(config.validate(), Err(MlError::Config(_))));
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = TrainerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrainerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
