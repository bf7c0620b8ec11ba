mod common;

use approx::assert_abs_diff_eq;
use dx_classifiers::preprocessing::{clean_columns, encode_labels};
use dx_classifiers::{
    ClassifierModel, DataPreprocessor, DataSource, Diagnosis, ModelConfig, ModelEvaluator, PipelineError,
    RandomForestClassifier, Result, SplitConfig,
};
use ndarray::{Array2, Axis};

/// Predicts whichever class was more frequent in its training labels.
#[derive(Default)]
struct MajorityClassifier {
    majority: Option<Diagnosis>,
}

impl ClassifierModel for MajorityClassifier {
    fn fit(&mut self, _x: &Array2<f64>, y: &[Diagnosis]) -> Result<()> {
        let malignant = y.iter().filter(|d| d.is_positive()).count();
        self.majority = Some(if malignant * 2 > y.len() {
            Diagnosis::Malignant
        } else {
            Diagnosis::Benign
        });
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let majority = self.majority.ok_or(PipelineError::NotTrained)?;
        Ok(vec![f64::from(majority.code()); x.nrows()])
    }

    fn is_trained(&self) -> bool {
        self.majority.is_some()
    }

    fn name(&self) -> &str {
        "majority"
    }
}

// ---------------------------------------------------------------------------
// Four-row toy table
// ---------------------------------------------------------------------------

#[test]
fn toy_table_runs_through_every_stage() {
    let table = common::toy_table();

    let cleaned = clean_columns(&table);
    assert_eq!(cleaned.columns(), &["feat1", "feat2", "diagnosis"]);

    let encoded = encode_labels(&cleaned).unwrap();
    let codes: Vec<u8> = encoded.y.iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec![0, 1, 1, 0]);

    let prepared = DataPreprocessor::new(SplitConfig::new(0.5, 42))
        .prepare(&table)
        .unwrap();
    assert_eq!(prepared.x_train.nrows(), 2);
    assert_eq!(prepared.x_test.nrows(), 2);

    let train_mean = prepared.x_train.mean_axis(Axis(0)).unwrap();
    for &m in train_mean.iter() {
        assert_abs_diff_eq!(m, 0.0, epsilon = 1e-12);
    }
    // Evaluation rows are scaled with the training parameters.
    for (pos, &orig) in prepared.test_indices.iter().enumerate() {
        for c in 0..2 {
            let raw = encoded.x[(orig, c)];
            let expected = (raw - prepared.scaler.mean[c]) / prepared.scaler.std[c];
            assert_abs_diff_eq!(prepared.x_test[(pos, c)], expected, epsilon = 1e-12);
        }
    }

    let mut model = MajorityClassifier::default();
    model.fit(&prepared.x_train, &prepared.y_train).unwrap();
    let mut evaluator = ModelEvaluator::new(&model);
    let evaluation = evaluator.evaluate(&prepared.x_test, &prepared.y_test).unwrap();
    assert_eq!(evaluation.confusion.total(), 2);
}

// ---------------------------------------------------------------------------
// Full experiment with the random forest
// ---------------------------------------------------------------------------

#[test]
fn prepare_train_evaluate_is_deterministic() {
    let run = || {
        let prepared = DataPreprocessor::default()
            .preprocess(&DataSource::Table(common::synthetic_table(150, 99)))
            .unwrap();
        let mut model = RandomForestClassifier::new(ModelConfig::new(25, 42));
        model.fit(&prepared.x_train, &prepared.y_train).unwrap();
        let mut evaluator = ModelEvaluator::new(&model);
        evaluator.evaluate(&prepared.x_test, &prepared.y_test).unwrap().clone()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(first.confusion.total(), 30);
    assert!(first.accuracy() >= 0.9);
}

#[test]
fn model_trait_objects_are_interchangeable() {
    let prepared = DataPreprocessor::new(SplitConfig::new(0.25, 3))
        .prepare(&common::synthetic_table(40, 4))
        .unwrap();
    let mut models: Vec<Box<dyn ClassifierModel>> = vec![
        Box::new(MajorityClassifier::default()),
        Box::new(RandomForestClassifier::new(ModelConfig::new(5, 1))),
    ];
    for model in models.iter_mut() {
        model.fit(&prepared.x_train, &prepared.y_train).unwrap();
        let mut evaluator = ModelEvaluator::new(model.as_ref());
        let evaluation = evaluator.evaluate(&prepared.x_test, &prepared.y_test).unwrap();
        assert_eq!(evaluation.confusion.total(), prepared.y_test.len(), "{}", model.name());
    }
}
