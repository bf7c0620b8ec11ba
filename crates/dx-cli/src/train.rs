use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

use dx_classifiers::{ClassifierModel, DataPreprocessor, PreparedData, RandomForestClassifier};

use crate::input::RunConfig;
use crate::util::write_bytes_to_file;

/// Load, clean, encode, split and scale the configured data source.
pub fn prepare_data(config: &RunConfig) -> Result<PreparedData> {
    let source = config.data_source();
    DataPreprocessor::new(config.split.clone())
        .preprocess(&source)
        .with_context(|| format!("Data preparation failed for {}", source.describe()))
}

/// Fit a fresh forest on the training partition.
pub fn fit_model(config: &RunConfig, data: &PreparedData) -> Result<RandomForestClassifier> {
    let start_time = Instant::now();
    let mut model = RandomForestClassifier::new(config.model.clone());
    model
        .fit(&data.x_train, &data.y_train)
        .with_context(|| "Training failed: an error occurred while fitting the random forest")?;
    model.set_training_split(data.training_split());
    log::info!(
        "Trained {} trees on {} rows in {:?}",
        model.n_trees(),
        data.x_train.nrows(),
        start_time.elapsed()
    );
    Ok(model)
}

pub fn run_training(config: &RunConfig) -> Result<RandomForestClassifier> {
    let model_file = config
        .model_file
        .as_deref()
        .context("No model output path: set `model_file` in the config or pass --output_file")?;

    let data = prepare_data(config)?;
    let model = fit_model(config, &data)?;
    model.save(model_file)?;

    // Keep the effective configuration next to the model.
    let config_path = Path::new(model_file).with_extension("json");
    let bytes = serde_json::to_vec_pretty(config)?;
    write_bytes_to_file(&config_path, &bytes)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    log::info!("Run configuration saved to {}", config_path.display());

    Ok(model)
}
