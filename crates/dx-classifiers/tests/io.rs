mod common;

use std::io::Write;

use dx_classifiers::io::{load, read_table, read_table_from_reader};
use dx_classifiers::{CellValue, DataPreprocessor, DataSource, PipelineError};

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Delimited files
// ---------------------------------------------------------------------------

#[test]
fn csv_cells_are_typed() {
    let csv = "id,diagnosis,radius_mean\n842302,M,17.99\n842517,B,\n";
    let table = read_table_from_reader(csv.as_bytes(), b',').unwrap();
    assert_eq!(table.shape(), (2, 3));
    assert_eq!(table.rows()[0][1], CellValue::Text("M".into()));
    assert_eq!(table.rows()[0][2], CellValue::Number(17.99));
    assert_eq!(table.rows()[1][2], CellValue::Missing);
}

#[test]
fn tsv_extension_switches_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "records.tsv", "diagnosis\tradius_mean\nB\t12.5\n");
    let table = read_table(&path).unwrap();
    assert_eq!(table.columns(), &["diagnosis", "radius_mean"]);
    assert_eq!(table.rows()[0][1], CellValue::Number(12.5));
}

#[test]
fn ragged_file_is_a_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.csv", "a,b\n1,2\n3\n");
    assert!(matches!(read_table(&path), Err(PipelineError::DataSource(_))));
}

#[test]
fn missing_file_is_a_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(&DataSource::Path(dir.path().join("nope.csv"))).unwrap_err();
    assert!(matches!(err, PipelineError::DataSource(_)));
}

#[cfg(not(feature = "remote"))]
#[test]
fn url_without_remote_feature_is_rejected() {
    let source = DataSource::from_location("https://example.org/Cancer.csv");
    assert!(matches!(source, DataSource::Url(_)));
    assert!(matches!(load(&source), Err(PipelineError::DataSource(_))));
}

// ---------------------------------------------------------------------------
// File to prepared partitions
// ---------------------------------------------------------------------------

#[test]
fn preprocess_reads_written_table() {
    let table = common::synthetic_table(25, 17);
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "cancer.csv", &common::to_csv(&table));

    let from_file = DataPreprocessor::default()
        .preprocess(&DataSource::from_location(path.to_str().unwrap()))
        .unwrap();
    let in_memory = DataPreprocessor::default()
        .preprocess(&DataSource::Table(table))
        .unwrap();

    assert_eq!(from_file.feature_names, in_memory.feature_names);
    assert_eq!(from_file.test_indices, in_memory.test_indices);
    assert_eq!(from_file.y_test, in_memory.y_test);
    assert_eq!(from_file.x_train.shape(), in_memory.x_train.shape());
}
