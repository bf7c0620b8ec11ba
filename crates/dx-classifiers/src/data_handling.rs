//! Data structures for raw biopsy records and the labelled feature table.
//!
//! `RawTable` is what a loader produces: ordered column names over
//! row-major cells of mixed type. `Dataset` is the encoded form every later
//! stage works on: a numeric feature matrix plus one `Diagnosis` per row.
//! The helpers here select rows and partition a `Dataset` into training and
//! evaluation sets.
use std::fmt;

use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SplitConfig;
use crate::error::{PipelineError, Result};

/// Name of the target column in the raw table.
pub const LABEL_COLUMN: &str = "diagnosis";

/// One cell of a raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Interpret a raw text field: blank is `Missing`, anything that parses
    /// as a float is `Number`, everything else is kept as `Text`.
    pub fn parse(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return CellValue::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => CellValue::Number(v),
            Err(_) => CellValue::Text(field.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Missing => write!(f, ""),
        }
    }
}

/// Ordered, named columns over row-major cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(PipelineError::DataSource(format!(
                "row {} has {} fields, header has {}",
                idx,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Return a copy without the named columns. Names that are not present
    /// are ignored.
    pub fn without_columns(&self, names: &[String]) -> RawTable {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i]))
            .collect();

        RawTable {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}

/// Binary diagnosis. Benign is the negative class, malignant the positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Diagnosis {
    Benign,
    Malignant,
}

impl Diagnosis {
    /// Translate a raw label through the fixed `{"M": 1, "B": 0}` table.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "M" => Some(Diagnosis::Malignant),
            "B" => Some(Diagnosis::Benign),
            _ => None,
        }
    }

    /// Integer code: 1 for malignant, 0 for benign.
    pub fn code(self) -> u8 {
        match self {
            Diagnosis::Benign => 0,
            Diagnosis::Malignant => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Diagnosis::Benign),
            1 => Some(Diagnosis::Malignant),
            _ => None,
        }
    }

    pub fn is_positive(self) -> bool {
        self == Diagnosis::Malignant
    }

    pub fn name(self) -> &'static str {
        match self {
            Diagnosis::Benign => "Benign",
            Diagnosis::Malignant => "Malignant",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric feature matrix with one encoded label per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Vec<Diagnosis>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    pub fn new(x: Array2<f64>, y: Vec<Diagnosis>, feature_names: Vec<String>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(PipelineError::LengthMismatch {
                left: x.nrows(),
                right: y.len(),
            });
        }
        if x.ncols() != feature_names.len() {
            return Err(PipelineError::FeatureCountMismatch {
                expected: feature_names.len(),
                got: x.ncols(),
            });
        }
        Ok(Self {
            x,
            y,
            feature_names,
        })
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn count(&self, class: Diagnosis) -> usize {
        self.y.iter().filter(|&&d| d == class).count()
    }

    /// Rows at `indices`, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    pub fn log_summary(&self) {
        log::info!(
            "{} rows ({} malignant, {} benign), {} feature columns",
            self.nrows(),
            self.count(Diagnosis::Malignant),
            self.count(Diagnosis::Benign),
            self.n_features()
        );
    }
}

/// Fail on the first NaN or infinite entry of `x`.
pub fn check_finite(x: &Array2<f64>) -> Result<()> {
    for ((row, column), v) in x.indexed_iter() {
        if !v.is_finite() {
            return Err(PipelineError::NonFiniteValue { row, column });
        }
    }
    Ok(())
}

/// Disjoint, exhaustive row assignment produced by [`train_test_split`].
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub train: Dataset,
    pub test: Dataset,
    /// Original row index of each training row.
    pub train_indices: Vec<usize>,
    /// Original row index of each evaluation row.
    pub test_indices: Vec<usize>,
}

/// The split a model's training partition came from, together with the row
/// count of the table that was split. Two equal records select the same
/// training rows from the same table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSplit {
    pub split: SplitConfig,
    pub n_rows: usize,
}

/// Shuffle row indices with a seeded permutation and cut off the first
/// `ceil(test_fraction * n)` as the evaluation partition.
///
/// The split is uniform, not stratified: class balance across partitions is
/// not guaranteed. Both partitions keep permutation order.
pub fn train_test_split(dataset: &Dataset, config: &SplitConfig) -> Result<SplitDataset> {
    config.validate()?;

    let n_samples = dataset.nrows();
    if n_samples == 0 {
        return Err(PipelineError::EmptyDataset);
    }

    let n_test = (config.test_fraction * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::InvalidConfig(format!(
            "test_fraction {} of {} rows leaves {} training and {} evaluation rows",
            config.test_fraction, n_samples, n_train, n_test
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.split_seed);
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    log::info!(
        "Training set size: {}, evaluation set size: {}",
        train_indices.len(),
        test_indices.len()
    );

    Ok(SplitDataset {
        train: dataset.select_rows(&train_indices),
        test: dataset.select_rows(&test_indices),
        train_indices,
        test_indices,
    })
}
