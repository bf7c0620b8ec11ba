//! Bagged ensemble of CART trees with soft voting.
//!
//! Every tree is grown on its own bootstrap sample of the training rows and
//! draws a random feature subset at each split. Per-tree seeds are drawn
//! up-front from one master generator, so trees can be grown in parallel and
//! the fitted forest is still identical for a given `ensemble_seed`.

use std::path::Path;

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::data_handling::{check_finite, Diagnosis, TrainingSplit};
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::{DecisionTree, TreeParams};

/// Current binary format version of saved models.
const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Forest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

/// Versioned envelope around the serialized forest.
#[derive(Serialize, Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    n_features: usize,
    n_trees: usize,
    config: ModelConfig,
    training_split: Option<TrainingSplit>,
    forest: Forest,
}

/// Random-forest classifier for the malignant/benign diagnosis.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    config: ModelConfig,
    training_split: Option<TrainingSplit>,
    forest: Option<Forest>,
}

impl RandomForestClassifier {
    pub fn new(config: ModelConfig) -> Self {
        RandomForestClassifier {
            config,
            training_split: None,
            forest: None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Split the current fit was trained on, if one was recorded.
    pub fn training_split(&self) -> Option<&TrainingSplit> {
        self.training_split.as_ref()
    }

    /// Record the split behind the current fit. Saved with the model and
    /// cleared by the next `fit`.
    pub fn set_training_split(&mut self, split: TrainingSplit) {
        self.training_split = Some(split);
    }

    /// Number of fitted trees, 0 before training.
    pub fn n_trees(&self) -> usize {
        self.forest.as_ref().map_or(0, |f| f.trees.len())
    }

    /// Number of feature columns seen during `fit`.
    pub fn n_features(&self) -> Option<usize> {
        self.forest.as_ref().map(|f| f.n_features)
    }

    pub fn trees(&self) -> &[DecisionTree] {
        self.forest.as_ref().map_or(&[], |f| f.trees.as_slice())
    }

    fn fitted(&self) -> Result<&Forest> {
        self.forest.as_ref().ok_or(PipelineError::NotTrained)
    }

    /// Encode the trained model as bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let forest = self.fitted()?;
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_features: forest.n_features,
            n_trees: forest.trees.len(),
            config: self.config.clone(),
            training_split: self.training_split.clone(),
            forest: forest.clone(),
        };
        Ok(bincode::serialize(&envelope)?)
    }

    /// Decode a model produced by [`to_bytes`](Self::to_bytes). The result is
    /// already trained.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: ModelEnvelope = bincode::deserialize(bytes)?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(PipelineError::Serialization(format!(
                "incompatible model version: expected {}, found {}",
                FORMAT_VERSION, envelope.format_version
            )));
        }
        let forest = &envelope.forest;
        if forest.trees.is_empty() || envelope.n_features == 0 {
            return Err(PipelineError::Serialization(
                "model holds no trees or no features".to_string(),
            ));
        }
        if forest.trees.len() != envelope.n_trees
            || forest.n_features != envelope.n_features
            || forest.trees.iter().any(|t| t.n_features() != envelope.n_features)
        {
            return Err(PipelineError::Serialization(
                "model header does not match the stored forest".to_string(),
            ));
        }
        for (i, tree) in forest.trees.iter().enumerate() {
            tree.check_structure()
                .map_err(|reason| PipelineError::Serialization(format!("tree {}: {}", i, reason)))?;
        }
        Ok(RandomForestClassifier {
            config: envelope.config,
            training_split: envelope.training_split,
            forest: Some(envelope.forest),
        })
    }

    /// Write the trained model to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        use anyhow::Context;

        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write model to {}", path.display()))?;
        log::info!("Model saved to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Read a model written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model from {}", path.display()))?;
        let model = Self::from_bytes(&bytes)
            .with_context(|| format!("Failed to decode model from {}", path.display()))?;
        log::info!("Model loaded from {}", path.display());
        Ok(model)
    }
}

/// Draw `n` row indices with replacement.
fn bootstrap_sample<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

impl ClassifierModel for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[Diagnosis]) -> Result<()> {
        self.config.validate()?;
        if x.nrows() != y.len() {
            return Err(PipelineError::LengthMismatch {
                left: x.nrows(),
                right: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(PipelineError::EmptyDataset);
        }
        if x.ncols() == 0 {
            return Err(PipelineError::FeatureCountMismatch {
                expected: 1,
                got: 0,
            });
        }
        check_finite(x)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(n_features),
        };

        log::info!(
            "Training random forest: {} trees, {} samples, {} features, {} per split",
            self.config.n_estimators,
            n_samples,
            n_features,
            params.max_features
        );

        let columns: Vec<Vec<f64>> = x.columns().into_iter().map(|c| c.to_vec()).collect();

        let mut master = ChaCha8Rng::seed_from_u64(self.config.ensemble_seed);
        let tree_seeds: Vec<u64> = (0..self.config.n_estimators).map(|_| master.gen()).collect();

        let trees: Vec<DecisionTree> = tree_seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let samples = bootstrap_sample(n_samples, &mut rng);
                DecisionTree::fit(&columns, y, &samples, &params, &mut rng)
            })
            .collect();

        log::debug!(
            "Grown {} trees, mean depth {:.1}",
            trees.len(),
            trees.iter().map(|t| t.depth() as f64).sum::<f64>() / trees.len() as f64
        );

        self.forest = Some(Forest { trees, n_features });
        self.training_split = None;
        log::info!("Model trained successfully");
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let forest = self.fitted()?;
        if x.ncols() != forest.n_features {
            return Err(PipelineError::FeatureCountMismatch {
                expected: forest.n_features,
                got: x.ncols(),
            });
        }

        let n_trees = forest.trees.len() as f64;
        let proba = (0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let row = x.row(r).to_vec();
                forest
                    .trees
                    .iter()
                    .map(|t| t.predict_proba_row(&row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect();
        Ok(proba)
    }

    fn is_trained(&self) -> bool {
        self.forest.is_some()
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Array2<f64>, Vec<Diagnosis>) {
        let mut values = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let offset = i as f64 * 0.1;
            values.extend_from_slice(&[offset, 1.0 - offset]);
            labels.push(Diagnosis::Benign);
            values.extend_from_slice(&[5.0 + offset, 6.0 - offset]);
            labels.push(Diagnosis::Malignant);
        }
        (Array2::from_shape_vec((40, 2), values).unwrap(), labels)
    }

    #[test]
    fn untrained_model_refuses_inference() {
        let (x, _) = blobs();
        let model = RandomForestClassifier::new(ModelConfig::new(5, 1));
        assert!(!model.is_trained());
        assert!(matches!(model.predict(&x), Err(PipelineError::NotTrained)));
        assert!(matches!(model.predict_proba(&x), Err(PipelineError::NotTrained)));
        assert!(matches!(model.to_bytes(), Err(PipelineError::NotTrained)));
    }

    #[test]
    fn separable_blobs_are_learned() {
        let (x, y) = blobs();
        let mut model = RandomForestClassifier::new(ModelConfig::new(25, 42));
        model.fit(&x, &y).unwrap();
        assert!(model.is_trained());
        assert_eq!(model.n_trees(), 25);
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn same_seed_gives_identical_forest() {
        let (x, y) = blobs();
        let mut a = RandomForestClassifier::new(ModelConfig::new(10, 7));
        let mut b = RandomForestClassifier::new(ModelConfig::new(10, 7));
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.trees(), b.trees());
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn failed_refit_keeps_previous_model() {
        let (x, y) = blobs();
        let mut model = RandomForestClassifier::new(ModelConfig::new(5, 3));
        model.fit(&x, &y).unwrap();
        let err = model.fit(&x, &y[..3]).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { left: 40, right: 3 }));
        assert!(model.is_trained());
        assert_eq!(model.n_trees(), 5);
    }

    #[test]
    fn non_finite_training_value_rejected() {
        let (mut x, y) = blobs();
        x[(4, 1)] = f64::NAN;
        let mut model = RandomForestClassifier::new(ModelConfig::new(5, 3));
        assert!(matches!(
            model.fit(&x, &y),
            Err(PipelineError::NonFiniteValue { row: 4, column: 1 })
        ));
    }

    #[test]
    fn bytes_round_trip_preserves_predictions() {
        let (x, y) = blobs();
        let mut model = RandomForestClassifier::new(ModelConfig::new(8, 11));
        model.fit(&x, &y).unwrap();
        let restored = RandomForestClassifier::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert!(restored.is_trained());
        assert_eq!(restored.config(), model.config());
        assert_eq!(restored.predict_proba(&x).unwrap(), model.predict_proba(&x).unwrap());
    }

    fn envelope_bytes(trees: Vec<DecisionTree>, n_features: usize) -> Vec<u8> {
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_features,
            n_trees: trees.len(),
            config: ModelConfig::new(trees.len().max(1), 0),
            training_split: None,
            forest: Forest { trees, n_features },
        };
        bincode::serialize(&envelope).unwrap()
    }

    #[test]
    fn decoded_forest_without_trees_is_rejected() {
        let err = RandomForestClassifier::from_bytes(&envelope_bytes(vec![], 2)).unwrap_err();
        assert!(matches!(err, PipelineError::Serialization(_)));
    }

    #[test]
    fn decoded_tree_with_broken_arena_is_rejected() {
        let (x, y) = blobs();
        let mut model = RandomForestClassifier::new(ModelConfig::new(2, 5));
        model.fit(&x, &y).unwrap();

        let mut trees = model.trees().to_vec();
        trees.push(DecisionTree::from_nodes(vec![], 2));
        let err = RandomForestClassifier::from_bytes(&envelope_bytes(trees, 2)).unwrap_err();
        assert!(matches!(err, PipelineError::Serialization(_)));

        // Header claims fewer features than the trees split on.
        let err = RandomForestClassifier::from_bytes(&envelope_bytes(model.trees().to_vec(), 1))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Serialization(_)));
    }

    #[test]
    fn training_split_is_saved_and_cleared_by_refit() {
        let (x, y) = blobs();
        let mut model = RandomForestClassifier::new(ModelConfig::new(4, 2));
        model.fit(&x, &y).unwrap();
        let record = TrainingSplit {
            split: crate::config::SplitConfig::new(0.25, 9),
            n_rows: 53,
        };
        model.set_training_split(record.clone());

        let restored = RandomForestClassifier::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.training_split(), Some(&record));

        model.fit(&x, &y).unwrap();
        assert_eq!(model.training_split(), None);
    }

    #[test]
    fn corrupt_bytes_are_a_serialization_error() {
        let err = RandomForestClassifier::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, PipelineError::Serialization(_)));
    }
}
