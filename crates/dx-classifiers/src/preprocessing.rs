//! Data preparation: clean → encode → split → scale.
//!
//! Each step is a free function taking the previous step's output by
//! reference and returning a new value, so the stages can be run and tested
//! in isolation. `DataPreprocessor` chains them for the common case.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::SplitConfig;
use crate::data_handling::{
    check_finite, train_test_split, CellValue, Dataset, Diagnosis, RawTable, TrainingSplit,
    LABEL_COLUMN,
};
use crate::error::{PipelineError, Result};
use crate::io::{load, DataSource};

/// Export artifact left behind by some spreadsheet tools.
pub const ARTIFACT_COLUMN: &str = "Unnamed: 32";

/// Columns `clean_columns` would drop: every name containing "id"
/// (case-insensitive, anywhere in the name) plus the export artifact.
pub fn columns_to_remove(table: &RawTable) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|name| name.to_lowercase().contains("id") || name.as_str() == ARTIFACT_COLUMN)
        .cloned()
        .collect()
}

/// Drop identifier and artifact columns.
///
/// The substring rule is broad on purpose and will also drop a feature
/// such as `fluid_volume`. Running it twice is a no-op.
pub fn clean_columns(table: &RawTable) -> RawTable {
    let removed = columns_to_remove(table);
    let cleaned = table.without_columns(&removed);
    log::info!("Removed columns: {:?}", removed);
    log::info!("Dataset shape after cleaning: {:?}", cleaned.shape());
    cleaned
}

/// Translate the `diagnosis` column through `{"M": 1, "B": 0}` and turn the
/// remaining columns into a numeric feature matrix. `NaN` and infinite
/// cells are rejected along with empty and text cells.
pub fn encode_labels(table: &RawTable) -> Result<Dataset> {
    let label_idx = table
        .column_index(LABEL_COLUMN)
        .ok_or_else(|| PipelineError::MissingColumn(LABEL_COLUMN.to_string()))?;
    if table.nrows() == 0 {
        return Err(PipelineError::EmptyDataset);
    }

    let feature_idx: Vec<usize> = (0..table.ncols()).filter(|&i| i != label_idx).collect();
    let feature_names: Vec<String> = feature_idx
        .iter()
        .map(|&i| table.columns()[i].clone())
        .collect();

    let mut labels = Vec::with_capacity(table.nrows());
    let mut values = Vec::with_capacity(table.nrows() * feature_idx.len());

    for (row_idx, row) in table.rows().iter().enumerate() {
        let diagnosis = match &row[label_idx] {
            CellValue::Text(label) => Diagnosis::from_label(label),
            _ => None,
        }
        .ok_or_else(|| PipelineError::UnencodableLabel {
            row: row_idx,
            value: row[label_idx].to_string(),
        })?;
        labels.push(diagnosis);

        for &col in &feature_idx {
            let value = row[col]
                .as_number()
                .filter(|v| v.is_finite())
                .ok_or_else(|| PipelineError::NonNumericFeature {
                    column: table.columns()[col].clone(),
                    row: row_idx,
                })?;
            values.push(value);
        }
    }

    let x = Array2::from_shape_vec((table.nrows(), feature_idx.len()), values)
        .map_err(|e| PipelineError::DataSource(e.to_string()))?;

    log::info!("Labels encoded successfully");
    Dataset::new(x, labels, feature_names)
}

/// Per-feature standardization fitted on one matrix and applied to others.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    /// Population standard deviation (ddof = 0).
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Deviations at or below this are treated as zero variance.
    const MIN_STD: f64 = 1e-12;

    /// Fit mean and standard deviation per column of `x`.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(PipelineError::EmptyDataset);
        }
        check_finite(x)?;
        let mean = x.mean_axis(Axis(0)).ok_or(PipelineError::EmptyDataset)?;
        let std = x.std_axis(Axis(0), 0.0);

        for (col, &s) in std.iter().enumerate() {
            if s <= Self::MIN_STD {
                log::warn!("Feature column {} has zero variance; it will scale to 0", col);
            }
        }
        log::debug!("Fitted scaler on {} rows x {} columns", x.nrows(), x.ncols());

        Ok(StandardScaler { mean, std })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize `x` with the fitted parameters. Zero-variance columns
    /// become exactly 0.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::FeatureCountMismatch {
                expected: self.n_features(),
                got: x.ncols(),
            });
        }
        check_finite(x)?;
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            for (c, v) in row.iter_mut().enumerate() {
                let std = self.std[c];
                *v = if std > Self::MIN_STD { (*v - self.mean[c]) / std } else { 0.0 };
            }
        }
        Ok(out)
    }

    pub fn fit_transform(x: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }
}

/// Scaled training and evaluation partitions, ready for a classifier.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<Diagnosis>,
    pub y_test: Vec<Diagnosis>,
    pub feature_names: Vec<String>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    /// Parameters fitted on `x_train` only.
    pub scaler: StandardScaler,
    pub split: SplitConfig,
}

impl PreparedData {
    /// Record of the split that produced `x_train`.
    pub fn training_split(&self) -> TrainingSplit {
        TrainingSplit {
            split: self.split.clone(),
            n_rows: self.train_indices.len() + self.test_indices.len(),
        }
    }
}

/// Runs the full preparation pipeline with one split configuration.
#[derive(Debug, Clone, Default)]
pub struct DataPreprocessor {
    config: SplitConfig,
}

impl DataPreprocessor {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Load → clean → encode → split → scale.
    pub fn preprocess(&self, source: &DataSource) -> Result<PreparedData> {
        let table = load(source)?;
        self.prepare(&table)
    }

    /// Everything after loading.
    pub fn prepare(&self, table: &RawTable) -> Result<PreparedData> {
        self.config.validate()?;

        let cleaned = clean_columns(table);
        let dataset = encode_labels(&cleaned)?;
        dataset.log_summary();

        let split = train_test_split(&dataset, &self.config)?;

        let scaler = StandardScaler::fit(&split.train.x)?;
        let x_train = scaler.transform(&split.train.x)?;
        let x_test = scaler.transform(&split.test.x)?;
        log::info!("Features scaled successfully");

        Ok(PreparedData {
            x_train,
            x_test,
            y_train: split.train.y,
            y_test: split.test.y,
            feature_names: dataset.feature_names,
            train_indices: split.train_indices,
            test_indices: split.test_indices,
            scaler,
            split: self.config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable::new(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn id_rule_is_a_case_insensitive_substring_match() {
        let t = table(
            &["ID", "patient_Id", "widthid", "radius", "Unnamed: 32", "diagnosis"],
            vec![],
        );
        assert_eq!(
            columns_to_remove(&t),
            vec!["ID", "patient_Id", "widthid", "Unnamed: 32"]
        );
        assert_eq!(clean_columns(&t).columns(), &["radius", "diagnosis"]);
    }

    #[test]
    fn encode_rejects_unknown_label() {
        let t = table(
            &["f", "diagnosis"],
            vec![
                vec![1.0.into(), "M".into()],
                vec![2.0.into(), "X".into()],
            ],
        );
        match encode_labels(&t).unwrap_err() {
            PipelineError::UnencodableLabel { row, value } => {
                assert_eq!(row, 1);
                assert_eq!(value, "X");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn encode_rejects_missing_feature() {
        let t = table(
            &["f", "diagnosis"],
            vec![vec![CellValue::Missing, "B".into()]],
        );
        assert!(matches!(
            encode_labels(&t).unwrap_err(),
            PipelineError::NonNumericFeature { row: 0, .. }
        ));
    }

    #[test]
    fn encode_rejects_non_finite_feature() {
        let t = table(
            &["f", "g", "diagnosis"],
            vec![
                vec![1.0.into(), 2.0.into(), "B".into()],
                vec![3.0.into(), f64::INFINITY.into(), "M".into()],
            ],
        );
        match encode_labels(&t).unwrap_err() {
            PipelineError::NonNumericFeature { column, row } => {
                assert_eq!(column, "g");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn scaler_rejects_non_finite_input() {
        let x = array![[1.0, 2.0], [f64::NAN, 4.0]];
        assert!(matches!(
            StandardScaler::fit(&x).unwrap_err(),
            PipelineError::NonFiniteValue { row: 1, column: 0 }
        ));

        let scaler = StandardScaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[0.0, f64::NEG_INFINITY]]).unwrap_err(),
            PipelineError::NonFiniteValue { row: 0, column: 1 }
        ));
    }

    #[test]
    fn zero_variance_column_scales_to_zero() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&x).unwrap();
        assert_eq!(scaler.std[1], 0.0);
        assert_eq!(scaled.column(1).to_vec(), vec![0.0, 0.0]);

        let other = scaler.transform(&array![[2.0, 9.0]]).unwrap();
        assert_eq!(other[(0, 0)], 0.0);
        assert_eq!(other[(0, 1)], 0.0);
        assert!(other.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn transform_checks_width() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]).unwrap_err(),
            PipelineError::FeatureCountMismatch { expected: 2, got: 1 }
        ));
    }
}
