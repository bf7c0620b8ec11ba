//! Human-readable output for an [`Evaluation`]: console text, a confusion
//! matrix heatmap and a self-contained HTML page.

pub mod plots;
pub mod report;
pub mod text;

use std::path::Path;

use maud::html;

use crate::evaluation::{ClassMetrics, Evaluation};

pub use plots::plot_confusion_matrix;
pub use report::{Report, ReportSection};
pub use text::{banner, format_rate, render_detailed_metrics};

fn metric_cell(value: Option<f64>) -> maud::Markup {
    match value {
        Some(v) => html! { td { (format!("{:.4}", v)) } },
        None => html! { td class="undefined" { "undefined" } },
    }
}

fn metrics_row(name: &str, m: &ClassMetrics) -> maud::Markup {
    html! {
        tr {
            td { (name) }
            (metric_cell(m.precision))
            (metric_cell(m.recall))
            (metric_cell(m.f1))
            td { (m.support) }
        }
    }
}

/// Assemble the evaluation page: classification report, diagnostic rates and
/// the confusion-matrix heatmap.
pub fn build_report(evaluation: &Evaluation, title: &str) -> Report {
    let cm = &evaluation.confusion;
    let rates = evaluation.rates();
    let cr = evaluation.classification_report();

    let mut report = Report::new("dx", env!("CARGO_PKG_VERSION"), title);

    let mut overview = ReportSection::new("Classification Report");
    overview.add_content(html! {
        p { "Accuracy: " strong { (format!("{:.4}", rates.accuracy)) } " on " (cm.total()) " held-out rows." }
        table {
            tr { th { "" } th { "precision" } th { "recall" } th { "f1-score" } th { "support" } }
            (metrics_row("Benign", &cr.benign))
            (metrics_row("Malignant", &cr.malignant))
            (metrics_row("macro avg", &cr.macro_avg))
            (metrics_row("weighted avg", &cr.weighted_avg))
        }
    });
    report.add_section(overview);

    let mut detailed = ReportSection::new("Detailed Metrics");
    detailed.add_content(html! {
        table {
            tr { td { "True Negatives (Benign correctly classified)" } td { (cm.true_negative) } }
            tr { td { "False Positives (Benign misclassified)" } td { (cm.false_positive) } }
            tr { td { "False Negatives (Malignant misclassified)" } td { (cm.false_negative) } }
            tr { td { "True Positives (Malignant correctly classified)" } td { (cm.true_positive) } }
        }
        table {
            tr { td { "Sensitivity (Recall for Malignant)" } (metric_cell(rates.sensitivity)) }
            tr { td { "Specificity (Recall for Benign)" } (metric_cell(rates.specificity)) }
            tr { td { "Positive Predictive Value" } (metric_cell(rates.positive_predictive_value)) }
            tr { td { "Negative Predictive Value" } (metric_cell(rates.negative_predictive_value)) }
        }
    });
    report.add_section(detailed);

    let mut heatmap = ReportSection::new("Confusion Matrix");
    heatmap.add_plot(plot_confusion_matrix(cm, "Confusion Matrix - Cancer Prediction"));
    report.add_section(heatmap);

    report
}

pub fn build_html_report(evaluation: &Evaluation, title: &str) -> String {
    build_report(evaluation, title).render()
}

pub fn write_html_report<P: AsRef<Path>>(evaluation: &Evaluation, title: &str, path: P) -> anyhow::Result<()> {
    build_report(evaluation, title).save_to_file(path)
}
