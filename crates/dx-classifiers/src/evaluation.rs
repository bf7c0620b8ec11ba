//! Discrimination metrics derived from predicted and true diagnoses.
//!
//! Everything here works on labels only. Ratios whose denominator is zero
//! are reported as `None` rather than 0, so a degenerate evaluation set shows
//! up as "undefined" instead of looking like a bad model.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data_handling::Diagnosis;
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// 2x2 counts over (actual, predicted). Malignant is the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

impl ConfusionMatrix {
    /// Count (actual, predicted) pairs. Both slices must have the same length.
    pub fn from_labels(predictions: &[Diagnosis], ground_truth: &[Diagnosis]) -> Result<Self> {
        if predictions.len() != ground_truth.len() {
            return Err(PipelineError::LengthMismatch {
                left: predictions.len(),
                right: ground_truth.len(),
            });
        }

        let mut cm = ConfusionMatrix::default();
        for (&predicted, &actual) in predictions.iter().zip(ground_truth) {
            match (actual, predicted) {
                (Diagnosis::Benign, Diagnosis::Benign) => cm.true_negative += 1,
                (Diagnosis::Benign, Diagnosis::Malignant) => cm.false_positive += 1,
                (Diagnosis::Malignant, Diagnosis::Benign) => cm.false_negative += 1,
                (Diagnosis::Malignant, Diagnosis::Malignant) => cm.true_positive += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    /// Fraction of correct predictions. An empty matrix yields 0.0 and logs a
    /// warning.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            log::warn!("Accuracy requested on an empty evaluation set; reporting 0");
            return 0.0;
        }
        (self.true_negative + self.true_positive) as f64 / total as f64
    }

    /// TP / (TP + FN), recall of the malignant class.
    pub fn sensitivity(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// TN / (TN + FP), recall of the benign class.
    pub fn specificity(&self) -> Option<f64> {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }

    /// TP / (TP + FP).
    pub fn positive_predictive_value(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// TN / (TN + FN).
    pub fn negative_predictive_value(&self) -> Option<f64> {
        ratio(self.true_negative, self.true_negative + self.false_negative)
    }

    /// `[[tn, fp], [fn, tp]]`: rows are actual, columns predicted, benign first.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    /// Count of rows whose actual class is `class`.
    pub fn support(&self, class: Diagnosis) -> usize {
        match class {
            Diagnosis::Benign => self.true_negative + self.false_positive,
            Diagnosis::Malignant => self.false_negative + self.true_positive,
        }
    }

    pub fn rates(&self) -> DiagnosticRates {
        DiagnosticRates {
            accuracy: self.accuracy(),
            sensitivity: self.sensitivity(),
            specificity: self.specificity(),
            positive_predictive_value: self.positive_predictive_value(),
            negative_predictive_value: self.negative_predictive_value(),
        }
    }
}

/// Confusion matrix of `predictions` against `ground_truth`.
pub fn compute_confusion(predictions: &[Diagnosis], ground_truth: &[Diagnosis]) -> Result<ConfusionMatrix> {
    ConfusionMatrix::from_labels(predictions, ground_truth)
}

/// (TN + TP) / total, 0.0 for empty inputs.
pub fn accuracy(predictions: &[Diagnosis], ground_truth: &[Diagnosis]) -> Result<f64> {
    Ok(compute_confusion(predictions, ground_truth)?.accuracy())
}

/// The four diagnostic-test rates plus accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRates {
    pub accuracy: f64,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub positive_predictive_value: Option<f64>,
    pub negative_predictive_value: Option<f64>,
}

impl DiagnosticRates {
    /// Names of the rates that could not be computed.
    pub fn undefined(&self) -> Vec<&'static str> {
        [
            ("sensitivity", self.sensitivity),
            ("specificity", self.specificity),
            ("positive predictive value", self.positive_predictive_value),
            ("negative predictive value", self.negative_predictive_value),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Precision, recall and F1 for one class (or an average over classes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub support: usize,
}

fn f1_score(precision: Option<f64>, recall: Option<f64>) -> Option<f64> {
    let (p, r) = (precision?, recall?);
    if p + r == 0.0 {
        Some(0.0)
    } else {
        Some(2.0 * p * r / (p + r))
    }
}

impl ClassMetrics {
    fn new(precision: Option<f64>, recall: Option<f64>, support: usize) -> Self {
        ClassMetrics {
            precision,
            recall,
            f1: f1_score(precision, recall),
            support,
        }
    }
}

/// Unweighted mean over the defined values.
fn macro_mean(values: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

/// Support-weighted mean over the defined values.
fn weighted_mean(values: &[(Option<f64>, usize)]) -> Option<f64> {
    let (sum, weight) = values
        .iter()
        .filter_map(|&(v, w)| v.map(|v| (v * w as f64, w)))
        .fold((0.0, 0usize), |(s, n), (v, w)| (s + v, n + w));
    if weight == 0 {
        None
    } else {
        Some(sum / weight as f64)
    }
}

/// Per-class precision/recall/F1 table with overall accuracy and averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub benign: ClassMetrics,
    pub malignant: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let benign = ClassMetrics::new(
            cm.negative_predictive_value(),
            cm.specificity(),
            cm.support(Diagnosis::Benign),
        );
        let malignant = ClassMetrics::new(
            cm.positive_predictive_value(),
            cm.sensitivity(),
            cm.support(Diagnosis::Malignant),
        );
        let total = cm.total();

        let macro_avg = ClassMetrics {
            precision: macro_mean(&[benign.precision, malignant.precision]),
            recall: macro_mean(&[benign.recall, malignant.recall]),
            f1: macro_mean(&[benign.f1, malignant.f1]),
            support: total,
        };
        let weighted_avg = ClassMetrics {
            precision: weighted_mean(&[
                (benign.precision, benign.support),
                (malignant.precision, malignant.support),
            ]),
            recall: weighted_mean(&[(benign.recall, benign.support), (malignant.recall, malignant.support)]),
            f1: weighted_mean(&[(benign.f1, benign.support), (malignant.f1, malignant.support)]),
            support: total,
        };

        ClassificationReport {
            benign,
            malignant,
            accuracy: cm.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }

    pub fn class(&self, class: Diagnosis) -> &ClassMetrics {
        match class {
            Diagnosis::Benign => &self.benign,
            Diagnosis::Malignant => &self.malignant,
        }
    }
}

fn fmt_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "undefined".to_string(),
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in [("Benign", &self.benign), ("Malignant", &self.malignant)] {
            writeln!(
                f,
                "{:>14} {:>10} {:>10} {:>10} {:>10}",
                name,
                fmt_cell(m.precision),
                fmt_cell(m.recall),
                fmt_cell(m.f1),
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10} {:>10} {:>10} {:>10}",
                name,
                fmt_cell(m.precision),
                fmt_cell(m.recall),
                fmt_cell(m.f1),
                m.support
            )?;
        }
        Ok(())
    }
}

/// Result of scoring one model on one evaluation partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub predictions: Vec<Diagnosis>,
    pub ground_truth: Vec<Diagnosis>,
    pub confusion: ConfusionMatrix,
}

impl Evaluation {
    pub fn from_predictions(predictions: Vec<Diagnosis>, ground_truth: Vec<Diagnosis>) -> Result<Self> {
        let confusion = compute_confusion(&predictions, &ground_truth)?;
        Ok(Evaluation {
            predictions,
            ground_truth,
            confusion,
        })
    }

    pub fn accuracy(&self) -> f64 {
        self.confusion.accuracy()
    }

    pub fn rates(&self) -> DiagnosticRates {
        self.confusion.rates()
    }

    pub fn classification_report(&self) -> ClassificationReport {
        ClassificationReport::from_confusion(&self.confusion)
    }
}

/// Scores a trained model and keeps the most recent result so the report
/// calls do not predict again.
pub struct ModelEvaluator<'a, M: ClassifierModel + ?Sized> {
    model: &'a M,
    last: Option<Evaluation>,
}

impl<'a, M: ClassifierModel + ?Sized> ModelEvaluator<'a, M> {
    pub fn new(model: &'a M) -> Self {
        ModelEvaluator { model, last: None }
    }

    /// Predict `x` once, compare against `y` and cache the outcome. A failed
    /// call leaves the previous evaluation in place.
    pub fn evaluate(&mut self, x: &Array2<f64>, y: &[Diagnosis]) -> Result<&Evaluation> {
        log::info!("Evaluating {} on {} rows", self.model.name(), x.nrows());
        let predictions = self.model.predict(x)?;
        let evaluation = Evaluation::from_predictions(predictions, y.to_vec())?;

        let accuracy = evaluation.accuracy();
        log::info!("Model accuracy: {:.4} ({:.2}%)", accuracy, accuracy * 100.0);
        let undefined = evaluation.rates().undefined();
        if !undefined.is_empty() {
            log::warn!("Undefined rates on this evaluation set: {}", undefined.join(", "));
        }

        Ok(&*self.last.insert(evaluation))
    }

    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last.as_ref()
    }

    pub fn confusion_matrix(&self) -> Option<ConfusionMatrix> {
        self.last.as_ref().map(|e| e.confusion)
    }

    pub fn classification_report(&self) -> Option<ClassificationReport> {
        self.last.as_ref().map(Evaluation::classification_report)
    }

    pub fn rates(&self) -> Option<DiagnosticRates> {
        self.last.as_ref().map(Evaluation::rates)
    }
}
