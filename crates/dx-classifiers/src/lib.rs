//! dx-classifiers: a reproducible diagnosis classifier for tabular biopsy data.
//!
//! The crate covers one experiment end to end. Raw records are loaded and
//! cleaned, the `M`/`B` diagnosis is encoded, rows are split with a seeded
//! permutation and features are standardized on the training partition
//! only. A random forest is fitted on the result and scored with a
//! confusion matrix and the usual diagnostic rates.
//!
//! All randomness is seeded from configuration, so identical input and
//! configuration give identical partitions, forests and metrics.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod models;
pub mod preprocessing;
pub mod report;

pub use config::{ExperimentConfig, MaxFeatures, ModelConfig, SplitConfig};
pub use data_handling::{CellValue, Dataset, Diagnosis, RawTable, TrainingSplit};
pub use error::{PipelineError, Result};
pub use evaluation::{
    accuracy, compute_confusion, ClassificationReport, ConfusionMatrix, DiagnosticRates,
    Evaluation, ModelEvaluator,
};
pub use io::DataSource;
pub use models::{ClassifierModel, RandomForestClassifier};
pub use preprocessing::{DataPreprocessor, PreparedData, StandardScaler};
