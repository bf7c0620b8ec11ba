use std::fmt::Write;

use crate::evaluation::ConfusionMatrix;

/// Four decimals, or `undefined` when the denominator was zero.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(v) => format!("{:.4}", v),
        None => "undefined".to_string(),
    }
}

/// The confusion cells with their clinical reading, followed by the four
/// diagnostic rates.
pub fn render_detailed_metrics(cm: &ConfusionMatrix) -> String {
    let mut out = String::new();
    let cells = [
        ("True Negatives (Benign correctly classified)", cm.true_negative),
        ("False Positives (Benign misclassified)", cm.false_positive),
        ("False Negatives (Malignant misclassified)", cm.false_negative),
        ("True Positives (Malignant correctly classified)", cm.true_positive),
    ];
    for (label, count) in cells {
        let _ = writeln!(out, "{:<49} {}", format!("{}:", label), count);
    }
    out.push('\n');

    let rates = [
        ("Sensitivity (Recall for Malignant)", cm.sensitivity()),
        ("Specificity (Recall for Benign)", cm.specificity()),
        ("Positive Predictive Value", cm.positive_predictive_value()),
        ("Negative Predictive Value", cm.negative_predictive_value()),
    ];
    for (label, rate) in rates {
        let _ = writeln!(out, "{:<36} {}", format!("{}:", label), format_rate(rate));
    }
    out
}

/// `=====` banner around a heading, as printed by the CLI.
pub fn banner(heading: &str) -> String {
    let rule = "=".repeat(50);
    format!("{rule}\n{heading}\n{rule}")
}
