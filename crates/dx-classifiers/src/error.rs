use std::error::Error;
use std::fmt;

/// Result alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while preparing data, fitting the classifier or scoring it.
///
/// None of these are retried anywhere in the crate: each one is caused by
/// the input or by call order, so the caller has to change something first.
#[derive(Debug)]
pub enum PipelineError {
    /// The record source could not be reached or is not tabular data.
    DataSource(String),
    /// A label outside the fixed `M`/`B` encoding table.
    UnencodableLabel { row: usize, value: String },
    /// Inference or persistence requested before `fit`.
    NotTrained,
    /// Two row-aligned sequences have different lengths.
    LengthMismatch { left: usize, right: usize },
    /// A required column is absent from the table.
    MissingColumn(String),
    /// A feature cell is empty, not a number or not finite.
    NonNumericFeature { column: String, row: usize },
    /// A configuration value is outside its valid range.
    InvalidConfig(String),
    /// An operation that needs rows received none.
    EmptyDataset,
    /// A matrix has a different column count than the one fitted on.
    FeatureCountMismatch { expected: usize, got: usize },
    /// NaN or infinite value in a feature matrix.
    NonFiniteValue { row: usize, column: usize },
    /// Model bytes could not be produced or decoded.
    Serialization(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::DataSource(reason) => write!(f, "Unreadable data source: {}", reason),
            PipelineError::UnencodableLabel { row, value } => write!(
                f,
                "Label '{}' at row {} is not one of the encodable diagnoses (M, B)",
                value, row
            ),
            PipelineError::NotTrained => {
                write!(f, "Model must be trained before making predictions")
            }
            PipelineError::LengthMismatch { left, right } => write!(
                f,
                "Sequences must have equal length, got {} and {}",
                left, right
            ),
            PipelineError::MissingColumn(name) => write!(f, "Missing column '{}'", name),
            PipelineError::NonNumericFeature { column, row } => write!(
                f,
                "Feature column '{}' has a missing, non-numeric or non-finite value at row {}",
                column, row
            ),
            PipelineError::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
            PipelineError::EmptyDataset => write!(f, "Dataset has zero rows"),
            PipelineError::FeatureCountMismatch { expected, got } => write!(
                f,
                "Input has {} feature columns, expected {}",
                got, expected
            ),
            PipelineError::NonFiniteValue { row, column } => write!(
                f,
                "Non-finite value at row {}, feature column {}",
                row, column
            ),
            PipelineError::Serialization(reason) => write!(f, "Model serialization failed: {}", reason),
        }
    }
}

impl Error for PipelineError {}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::DataSource(err.to_string())
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}
