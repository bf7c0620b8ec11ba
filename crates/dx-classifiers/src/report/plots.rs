use plotly::common::{ColorScale, ColorScalePalette, Font};
use plotly::layout::{Annotation, Axis, Layout};
use plotly::{HeatMap, Plot};

use crate::evaluation::ConfusionMatrix;

/// Axis labels, in `Diagnosis::code` order.
const CLASS_NAMES: [&str; 2] = ["Benign", "Malignant"];

/// Heatmap of the confusion matrix with the count written in every cell.
///
/// Columns are the predicted class, rows the actual class, benign first.
pub fn plot_confusion_matrix(cm: &ConfusionMatrix, title: &str) -> Plot {
    let rows = cm.as_rows();
    let z: Vec<Vec<usize>> = rows.iter().map(|r| r.to_vec()).collect();
    let max = rows.iter().flatten().copied().max().unwrap_or(0);

    let trace = HeatMap::new(CLASS_NAMES.to_vec(), CLASS_NAMES.to_vec(), z)
        .color_scale(ColorScale::Palette(ColorScalePalette::Blues))
        .name("Confusion Matrix");

    let mut annotations = Vec::with_capacity(4);
    for (actual, row) in rows.iter().enumerate() {
        for (predicted, &count) in row.iter().enumerate() {
            // Dark cells get white text.
            let color = if max > 0 && count * 2 > max { "white" } else { "black" };
            annotations.push(
                Annotation::new()
                    .x(CLASS_NAMES[predicted])
                    .y(CLASS_NAMES[actual])
                    .text(&count.to_string())
                    .show_arrow(false)
                    .font(Font::new().color(color)),
            );
        }
    }

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Predicted Class"))
        .y_axis(Axis::new().title("Actual Class"))
        .annotations(annotations);

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}
