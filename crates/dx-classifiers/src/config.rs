use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// How rows are partitioned into training and evaluation sets.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation, in (0, 1).
    pub test_fraction: f64,
    /// Seed of the row permutation.
    pub split_seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            split_seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn new(test_fraction: f64, split_seed: u64) -> Self {
        Self {
            test_fraction,
            split_seed,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.test_fraction.is_finite() || self.test_fraction <= 0.0 || self.test_fraction >= 1.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}

/// Number of candidate features drawn at each split.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
    Fixed(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns, clamped to
    /// `[1, n_features]`.
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => *k,
        };
        resolved.clamp(1, n_features.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            other => other
                .parse::<usize>()
                .map(MaxFeatures::Fixed)
                .map_err(|_| format!("Unknown max_features: {}. Use sqrt, log2, all or a count", s)),
        }
    }
}

/// Hyper-parameters of the bagged decision-tree ensemble.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of trees in the forest.
    pub n_estimators: usize,
    /// Seed for bootstrap draws and feature sub-sampling.
    pub ensemble_seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            ensemble_seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
        }
    }
}

impl ModelConfig {
    pub fn new(n_estimators: usize, ensemble_seed: u64) -> Self {
        Self {
            n_estimators,
            ensemble_seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PipelineError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "max_depth must be at least 1 when set".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(PipelineError::InvalidConfig(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_features == MaxFeatures::Fixed(0) {
            return Err(PipelineError::InvalidConfig(
                "max_features must select at least one feature".to_string(),
            ));
        }
        Ok(())
    }
}

/// The full configuration surface of one prepare → train → evaluate run.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ExperimentConfig {
    pub split: SplitConfig,
    pub model: ModelConfig,
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        self.model.validate()
    }
}
