//! CSV/TSV reader for raw biopsy record tables.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::data_handling::{CellValue, RawTable};
use crate::error::{PipelineError, Result};

/// Where the raw records come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Local `.csv` file, or tab-separated when the extension is `.tsv`.
    Path(PathBuf),
    /// Remote CSV fetched over HTTP(S). Requires the `remote` feature.
    Url(String),
    /// A table the caller already holds in memory.
    Table(RawTable),
}

impl DataSource {
    /// Interpret a location string: `http://` and `https://` prefixes are
    /// URLs, everything else a filesystem path.
    pub fn from_location(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(location.to_string())
        } else {
            DataSource::Path(PathBuf::from(location))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DataSource::Path(p) => p.display().to_string(),
            DataSource::Url(u) => u.clone(),
            DataSource::Table(t) => format!("in-memory table {:?}", t.shape()),
        }
    }
}

/// Load a raw record table from any source.
pub fn load(source: &DataSource) -> Result<RawTable> {
    log::info!("Loading dataset from {}", source.describe());
    let table = match source {
        DataSource::Path(path) => read_table(path)?,
        DataSource::Url(url) => fetch_table(url)?,
        DataSource::Table(table) => table.clone(),
    };
    log::info!("Dataset loaded. Shape: {:?}", table.shape());
    Ok(table)
}

/// Read a delimited file with a header row.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        PipelineError::DataSource(format!("failed to open {}: {}", path.display(), e))
    })?;

    let is_tsv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);
    let delimiter = if is_tsv { b'\t' } else { b',' };

    read_table_from_reader(BufReader::new(file), delimiter)
}

/// Read delimited records from any reader. The first record is the header.
///
/// Blank header names are replaced with `Unnamed: <position>`, so a trailing
/// delimiter on every line shows up as a named, empty column.
pub fn read_table_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(PipelineError::DataSource("missing header row".to_string()));
    }
    let columns = column_names(&headers);

    let mut rows = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            PipelineError::DataSource(format!("failed to read row {}: {}", row_idx + 1, e))
        })?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }

    RawTable::new(columns, rows)
}

fn column_names(headers: &StringRecord) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name.to_string()
            }
        })
        .collect()
}

#[cfg(feature = "remote")]
fn fetch_table(url: &str) -> Result<RawTable> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| PipelineError::DataSource(format!("failed to fetch {}: {}", url, e)))?;
    let bytes = response
        .bytes()
        .map_err(|e| PipelineError::DataSource(format!("failed to read body of {}: {}", url, e)))?;
    let delimiter = if url.to_ascii_lowercase().ends_with(".tsv") {
        b'\t'
    } else {
        b','
    };
    read_table_from_reader(bytes.as_ref(), delimiter)
}

#[cfg(not(feature = "remote"))]
fn fetch_table(url: &str) -> Result<RawTable> {
    Err(PipelineError::DataSource(format!(
        "cannot fetch {}: built without the `remote` feature",
        url
    )))
}
