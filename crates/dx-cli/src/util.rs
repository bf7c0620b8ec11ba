use anyhow::Result;
use std::{fs::File, io::Write, path::Path};

pub fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Check a configured data location before any work starts. URLs are left
/// to the loader; local paths must name an existing `.csv` or `.tsv` file.
pub fn validate_data_location(location: &str) -> Result<()> {
    if is_remote(location) {
        return Ok(());
    }
    let path = Path::new(location);
    let is_table = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv"));
    if !is_table {
        anyhow::bail!("Data file must have a .tsv or .csv extension: {}", location);
    }
    if !path.is_file() {
        anyhow::bail!("Data file does not exist: {}", location);
    }
    Ok(())
}

pub fn write_bytes_to_file<P: AsRef<Path>>(path: P, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path.as_ref())?;
    file.write_all(bytes)?;
    Ok(())
}
