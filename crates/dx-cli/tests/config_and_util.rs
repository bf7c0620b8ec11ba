//! Integration tests for run-config parsing and util helpers.

use clap::{Arg, Command};
use dx_cli::input::RunConfig;
use dx_cli::util::{validate_data_location, write_bytes_to_file};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// validate_data_location
// ---------------------------------------------------------------------------

#[test]
fn validate_tsv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.tsv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_data_location(path.to_str().unwrap()).is_ok());
}

#[test]
fn validate_csv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cancer.CSV");
    std::fs::File::create(&path).unwrap();
    assert!(validate_data_location(path.to_str().unwrap()).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::File::create(&path).unwrap();
    assert!(validate_data_location(path.to_str().unwrap()).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_data_location("/nonexistent/path/data.csv").is_err());
}

#[test]
fn urls_skip_file_validation() {
    assert!(validate_data_location("https://example.org/Cancer.csv").is_ok());
    assert!(validate_data_location("/nonexistent/Cancer.csv").is_err());
}

#[test]
fn write_bytes_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");
    write_bytes_to_file(&path, b"abc").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"abc");
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

#[test]
fn run_config_defaults() {
    let cfg = RunConfig::default();
    assert_eq!(cfg.split.test_fraction, 0.2);
    assert_eq!(cfg.split.split_seed, 42);
    assert_eq!(cfg.model.n_estimators, 100);
    assert!(cfg.model_file.is_none());
    assert!(cfg.data.starts_with("https://"));
}

#[test]
fn run_config_round_trips_json() {
    let cfg = RunConfig::default();
    let json = serde_json::to_string_pretty(&cfg).unwrap();
    assert!(json.contains("\"test_fraction\""));
    assert!(json.contains("\"n_estimators\""));
    let back: RunConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn partial_config_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(
        &path,
        r#"{ "data": "cancer.csv", "model": { "n_estimators": 7 }, "split": "not an object" }"#,
    )
    .unwrap();

    let cfg = RunConfig::from_file(&path).unwrap();
    assert_eq!(cfg.data, "cancer.csv");
    assert_eq!(cfg.model.n_estimators, 7);
    assert_eq!(cfg.model.ensemble_seed, 42);
    assert_eq!(cfg.split, RunConfig::default().split);
    assert!(cfg.report_file.is_none());
}

#[test]
fn missing_config_file_errors() {
    assert!(RunConfig::from_file("/nonexistent/run.json").is_err());
}

#[test]
fn command_line_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("cancer.csv");
    std::fs::File::create(&data).unwrap();
    let config_path = dir.path().join("run.json");
    std::fs::write(&config_path, r#"{ "data": "/elsewhere/other.csv", "model_file": "a.bin" }"#).unwrap();

    let matches = Command::new("t")
        .arg(Arg::new("config").value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("data").short('d'))
        .arg(Arg::new("model_file").short('o'))
        .arg(Arg::new("seed").long("seed").value_parser(clap::value_parser!(u64)))
        .get_matches_from([
            "t",
            config_path.to_str().unwrap(),
            "-d",
            data.to_str().unwrap(),
            "-o",
            "b.bin",
            "--seed",
            "7",
        ]);

    let cfg = RunConfig::from_arguments(matches.get_one::<PathBuf>("config"), &matches).unwrap();
    assert_eq!(cfg.data, data.to_str().unwrap());
    assert_eq!(cfg.model_file.as_deref(), Some("b.bin"));
    assert_eq!(cfg.split.split_seed, 7);
    assert_eq!(cfg.model.ensemble_seed, 7);
}

#[test]
fn invalid_fraction_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("cancer.csv");
    std::fs::File::create(&data).unwrap();

    let matches = Command::new("t")
        .arg(Arg::new("data").short('d'))
        .arg(Arg::new("test_fraction").long("test_fraction").value_parser(clap::value_parser!(f64)))
        .get_matches_from(["t", "-d", data.to_str().unwrap(), "--test_fraction", "1.5"]);

    assert!(RunConfig::from_arguments(None, &matches).is_err());
}
