//! Prepare, train and evaluate in one go.
//!
//! ```text
//! cargo run --example cancer_prediction -- path/to/Cancer.csv [report.html]
//! ```
use anyhow::{Context, Result};

use dx_classifiers::report::{banner, render_detailed_metrics, write_html_report};
use dx_classifiers::{
    ClassifierModel, DataPreprocessor, DataSource, ExperimentConfig, ModelEvaluator,
    RandomForestClassifier,
};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let data = args
        .next()
        .context("usage: cancer_prediction <data.csv> [report.html]")?;
    let report_path = args.next();

    let config = ExperimentConfig::default();
    config.validate()?;

    println!("{}", banner("CANCER PREDICTION MODEL TRAINING"));
    let prepared = DataPreprocessor::new(config.split.clone()).preprocess(&DataSource::from_location(&data))?;
    let mut model = RandomForestClassifier::new(config.model.clone());
    model.fit(&prepared.x_train, &prepared.y_train)?;

    println!("{}", banner("CANCER PREDICTION MODEL EVALUATION"));
    let mut evaluator = ModelEvaluator::new(&model);
    let evaluation = evaluator.evaluate(&prepared.x_test, &prepared.y_test)?;
    println!(
        "Model Accuracy: {:.4} ({:.2}%)",
        evaluation.accuracy(),
        evaluation.accuracy() * 100.0
    );
    println!("{}", evaluation.classification_report());
    println!("{}", render_detailed_metrics(&evaluation.confusion));

    if let Some(path) = report_path {
        write_html_report(evaluation, "Cancer Prediction Evaluation", &path)?;
    }
    Ok(())
}
