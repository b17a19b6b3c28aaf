//! Pipeline configuration
//!
//! Defaults live in code; a TOML file and `MOODCHECK_*` environment
//! variables may override them.

use crate::errors::{AiCoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_TARGET_COLUMN: &str = "Depression";
pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MODEL_PATH: &str = "models/depression_model.json";

pub const ENV_TARGET_COLUMN: &str = "MOODCHECK_TARGET_COLUMN";
pub const ENV_TEST_SIZE: &str = "MOODCHECK_TEST_SIZE";
pub const ENV_SEED: &str = "MOODCHECK_SEED";
pub const ENV_MODEL_PATH: &str = "MOODCHECK_MODEL_PATH";

/// Random Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples a node needs before it may split
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
        }
    }
}

/// Settings for one training pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Label column the classifier predicts
    pub target_column: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the split and the forest
    pub seed: u64,
    /// Where artifacts are saved and loaded by default
    pub model_path: PathBuf,
    pub forest: ForestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            forest: ForestConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file; absent keys keep their defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            AiCoreError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| AiCoreError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply `MOODCHECK_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_TARGET_COLUMN) {
            self.target_column = val;
        }

        if let Some(val) = lookup(ENV_TEST_SIZE) {
            self.test_size = val.trim().parse().map_err(|_| {
                AiCoreError::Config(format!("{} must be a number, got '{}'", ENV_TEST_SIZE, val))
            })?;
        }

        if let Some(val) = lookup(ENV_SEED) {
            self.seed = val.trim().parse().map_err(|_| {
                AiCoreError::Config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    ENV_SEED, val
                ))
            })?;
        }

        if let Some(val) = lookup(ENV_MODEL_PATH) {
            self.model_path = PathBuf::from(val);
        }

        Ok(())
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    /// Reject unusable values; return warnings for questionable ones
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.target_column.trim().is_empty() {
            return Err(AiCoreError::Config("target column name is empty".to_string()));
        }

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AiCoreError::Config(format!(
                "test size must be strictly between 0 and 1, got {}",
                self.test_size
            )));
        }

        if self.forest.n_trees == 0 {
            return Err(AiCoreError::Config("forest needs at least one tree".to_string()));
        }

        if self.forest.max_depth == 0 {
            return Err(AiCoreError::Config("max depth must be at least 1".to_string()));
        }

        if self.forest.min_samples_split < 2 {
            return Err(AiCoreError::Config(
                "min samples split must be at least 2".to_string(),
            ));
        }

        let mut warnings = Vec::new();

        if self.test_size > 0.5 {
            warnings.push(format!(
                "test size {} leaves less than half of the rows for training",
                self.test_size
            ));
        }

        if self.forest.n_trees < 10 {
            warnings.push(format!(
                "only {} trees; probability estimates will be coarse",
                self.forest.n_trees
            ));
        }

        if !warnings.is_empty() {
            warn!("Configuration validation warnings: {:?}", warnings);
        }

        Ok(warnings)
    }
}
