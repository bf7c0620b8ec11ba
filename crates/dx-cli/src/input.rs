use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use dx_classifiers::{DataSource, ExperimentConfig, ModelConfig, SplitConfig};

use crate::util::validate_data_location;

/// Everything one `dx train` / `dx evaluate` run needs.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RunConfig {
    pub version: String,
    /// Local `.csv`/`.tsv` path or `http(s)://` URL of the record table.
    pub data: String,
    /// Where `train` writes the model and `evaluate` reads it from.
    pub model_file: Option<String>,
    pub report_file: Option<String>,
    pub heatmap_file: Option<String>,
    pub split: SplitConfig,
    pub model: ModelConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            version: clap::crate_version!().to_string(),
            data: String::from("https://github.com/YBIFoundation/Dataset/raw/main/Cancer.csv"),
            model_file: None,
            report_file: None,
            heatmap_file: None,
            split: SplitConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl RunConfig {
    /// Read a JSON config. Missing or invalid fields fall back to their
    /// defaults with a warning.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let partial: serde_json::Value = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        let mut config = RunConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                if let Some(val) = partial.get(stringify!($field)) {
                    if let Ok(parsed) = serde_json::from_value(val.clone()) {
                        config.$field = parsed;
                    } else {
                        log::warn!(
                            "Config Invalid value for '{}', using default: {:?}",
                            stringify!($field),
                            config.$field
                        );
                    }
                } else {
                    log::warn!(
                        "Config Missing field '{}', using default: {:?}",
                        stringify!($field),
                        config.$field
                    );
                }
            };
        }

        load_or_default!(data);
        load_or_default!(model_file);
        load_or_default!(report_file);
        load_or_default!(heatmap_file);
        load_or_default!(split);
        load_or_default!(model);

        Ok(config)
    }

    /// Build the run configuration from an optional config file plus
    /// command line overrides, then validate it.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(data) = matches.get_one::<String>("data") {
            config.data = data.clone();
        }
        for (arg, field) in [
            ("model_file", &mut config.model_file),
            ("report_file", &mut config.report_file),
            ("heatmap_file", &mut config.heatmap_file),
        ] {
            if let Some(value) = matches.try_get_one::<String>(arg).ok().flatten() {
                *field = Some(value.clone());
            }
        }
        if let Some(&n) = matches.try_get_one::<usize>("n_estimators").ok().flatten() {
            config.model.n_estimators = n;
        }
        if let Some(&fraction) = matches.try_get_one::<f64>("test_fraction").ok().flatten() {
            config.split.test_fraction = fraction;
        }
        if let Some(&seed) = matches.try_get_one::<u64>("seed").ok().flatten() {
            config.split.split_seed = seed;
            config.model.ensemble_seed = seed;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_data_location(&self.data)?;
        self.experiment().validate()?;
        Ok(())
    }

    pub fn experiment(&self) -> ExperimentConfig {
        ExperimentConfig {
            split: self.split.clone(),
            model: self.model.clone(),
        }
    }

    pub fn data_source(&self) -> DataSource {
        DataSource::from_location(&self.data)
    }
}
