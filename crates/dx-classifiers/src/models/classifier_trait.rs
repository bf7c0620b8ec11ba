use ndarray::Array2;

use crate::data_handling::Diagnosis;
use crate::error::Result;

/// Decision threshold on the malignant-class probability.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// The contract every downstream consumer (evaluator, CLI) relies on.
///
/// An implementation starts untrained; `fit` moves it to trained and a later
/// `fit` replaces the previous model entirely. Inference before the first
/// successful `fit` fails with `PipelineError::NotTrained`.
pub trait ClassifierModel {
    /// Fit the model on scaled features and one label per row.
    fn fit(&mut self, x: &Array2<f64>, y: &[Diagnosis]) -> Result<()>;

    /// Probability of the malignant class per row. The benign probability is
    /// the complement.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>>;

    /// One label per row, malignant when its probability exceeds
    /// [`DECISION_THRESHOLD`].
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Diagnosis>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| {
                if p > DECISION_THRESHOLD {
                    Diagnosis::Malignant
                } else {
                    Diagnosis::Benign
                }
            })
            .collect())
    }

    fn is_trained(&self) -> bool;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
