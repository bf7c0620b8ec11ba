use anyhow::{Context, Result};
use std::path::Path;

use dx_classifiers::report::{banner, plot_confusion_matrix, render_detailed_metrics, write_html_report};
use dx_classifiers::{Evaluation, ModelEvaluator, PreparedData, RandomForestClassifier};

use crate::input::RunConfig;
use crate::train::{fit_model, prepare_data};

const REPORT_TITLE: &str = "Cancer Prediction Model Evaluation";

/// A loaded model may only be scored on the evaluation partition of the
/// split it was trained with, on a table of the same size.
fn check_training_split(model: &RandomForestClassifier, data: &PreparedData) -> Result<()> {
    let current = data.training_split();
    match model.training_split() {
        Some(trained) if *trained == current => Ok(()),
        Some(trained) => anyhow::bail!(
            "model was trained on {} rows with test_fraction {} and split_seed {}, \
             but this run splits {} rows with test_fraction {} and split_seed {}; \
             its evaluation rows would overlap the training rows",
            trained.n_rows,
            trained.split.test_fraction,
            trained.split.split_seed,
            current.n_rows,
            current.split.test_fraction,
            current.split.split_seed
        ),
        None => {
            log::warn!(
                "Model carries no training split record; evaluation rows may overlap its training rows"
            );
            Ok(())
        }
    }
}

/// Score the configured model on the evaluation partition. The model is
/// loaded from `model_file` when one is configured and exists, and must have
/// been trained on the same split. Otherwise a fresh one is trained on the
/// training partition.
pub fn run_evaluation(config: &RunConfig) -> Result<Evaluation> {
    let data = prepare_data(config)?;

    let model = match config.model_file.as_deref() {
        Some(path) if Path::new(path).exists() => {
            let model = RandomForestClassifier::load(path)?;
            check_training_split(&model, &data)
                .with_context(|| format!("Cannot evaluate model {}", path))?;
            model
        }
        Some(path) => {
            log::warn!("Model file {} not found; training a new model", path);
            fit_model(config, &data)?
        }
        None => fit_model(config, &data)?,
    };

    let mut evaluator = ModelEvaluator::new(&model);
    let evaluation = evaluator
        .evaluate(&data.x_test, &data.y_test)
        .with_context(|| "Evaluation failed")?
        .clone();

    println!("{}", banner("CLASSIFICATION REPORT"));
    println!("{}", evaluation.classification_report());
    println!("{}", banner("DETAILED METRICS"));
    println!("{}", render_detailed_metrics(&evaluation.confusion));

    if let Some(path) = &config.heatmap_file {
        let plot = plot_confusion_matrix(&evaluation.confusion, "Confusion Matrix - Cancer Prediction");
        std::fs::write(path, plot.to_html())
            .with_context(|| format!("Failed to write confusion matrix to {}", path))?;
        log::info!("Confusion matrix saved to {}", path);
    }
    if let Some(path) = &config.report_file {
        write_html_report(&evaluation, REPORT_TITLE, path)?;
    }

    Ok(evaluation)
}
