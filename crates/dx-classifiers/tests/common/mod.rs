#![allow(dead_code)]

use dx_classifiers::{CellValue, RawTable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const FEATURES: [&str; 4] = ["radius_mean", "texture_mean", "area_mean", "smoothness_mean"];

/// Biopsy-like table: `id`, `diagnosis`, four features and the trailing
/// `Unnamed: 32` export column. Malignant rows are shifted upwards so the
/// classes are well separated.
pub fn synthetic_table(n_rows: usize, seed: u64) -> RawTable {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut columns = vec!["id".to_string(), "diagnosis".to_string()];
    columns.extend(FEATURES.iter().map(|f| f.to_string()));
    columns.push("Unnamed: 32".to_string());

    let rows = (0..n_rows)
        .map(|i| {
            let malignant = i % 3 == 0;
            let shift = if malignant { 4.0 } else { 0.0 };
            let mut row = vec![
                CellValue::Number(842_302.0 + i as f64),
                CellValue::Text(if malignant { "M" } else { "B" }.to_string()),
            ];
            for (k, _) in FEATURES.iter().enumerate() {
                let base = 10.0 * (k + 1) as f64;
                row.push(CellValue::Number(base + shift + rng.gen_range(-1.0..1.0)));
            }
            row.push(CellValue::Missing);
            row
        })
        .collect();

    RawTable::new(columns, rows).unwrap()
}

/// Same table as CSV text. Missing cells are written as empty fields.
pub fn to_csv(table: &RawTable) -> String {
    let mut out = String::new();
    out.push_str(&table.columns().join(","));
    out.push('\n');
    for row in table.rows() {
        let fields: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// The four-row table `[idX, feat1, feat2, diagnosis]`.
pub fn toy_table() -> RawTable {
    let columns = ["idX", "feat1", "feat2", "diagnosis"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let rows = vec![
        vec![1.0.into(), 0.0.into(), 10.0.into(), "B".into()],
        vec![2.0.into(), 1.0.into(), 20.0.into(), "M".into()],
        vec![3.0.into(), 2.0.into(), 30.0.into(), "M".into()],
        vec![4.0.into(), 3.0.into(), 40.0.into(), "B".into()],
    ];
    RawTable::new(columns, rows).unwrap()
}
