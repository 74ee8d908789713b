//! Churn model training and scoring on top of linfa's logistic regression

use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::error::{ChurnError, Result};
use crate::models::{ChurnScore, ConfusionMatrix, FeatureSnapshot, Gender};
use crate::validation::InputValidator;

/// Column order of encoded feature vectors, recorded in model metadata notes
///
/// `churn_label` is the training target and is never part of the input
/// vector.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "age",
    "gender",
    "city",
    "total_orders",
    "total_spent",
    "days_since_last_order",
];

const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Strategy interface for training churn models
///
/// Implementations own their hyperparameters and take only labeled feature
/// snapshots, so the pipeline can swap classifiers without touching the
/// feature or storage layers.
pub trait ChurnClassifier {
    /// Short model name recorded alongside training metrics
    fn name(&self) -> &str;

    /// Fit a model on labeled feature snapshots
    fn train(&self, labeled: &[FeatureSnapshot]) -> Result<Box<dyn ChurnModel>>;
}

/// A fitted model that scores individual customer snapshots
pub trait ChurnModel {
    /// Score one customer snapshot
    ///
    /// The returned label always equals `probability >= threshold()`.
    fn predict(&self, snapshot: &FeatureSnapshot) -> Result<ChurnScore>;

    /// Decision threshold applied to probabilities
    fn threshold(&self) -> f64;
}

/// Encodes feature snapshots into standardized numeric vectors
///
/// Categorical columns are label encoded: gender by its position in
/// [`Gender::ALL`], city by its position in the sorted distinct city list
/// observed at fit time. Cities unseen during training map to a reserved
/// index one past the known range rather than colliding with a real city.
/// Numeric columns are z-scored with statistics fitted on the training set;
/// a zero-variance column keeps scale 1.0 so encoding never divides by zero.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    cities: Vec<String>,
    means: [f64; FEATURE_COUNT],
    scales: [f64; FEATURE_COUNT],
}

impl FeatureEncoder {
    /// Fit the city vocabulary and standardization statistics
    pub fn fit(snapshots: &[FeatureSnapshot]) -> Self {
        let mut cities: Vec<String> = snapshots.iter().map(|s| s.city.clone()).collect();
        cities.sort();
        cities.dedup();

        let mut encoder = Self {
            cities,
            means: [0.0; FEATURE_COUNT],
            scales: [1.0; FEATURE_COUNT],
        };
        if snapshots.is_empty() {
            return encoder;
        }

        let rows: Vec<[f64; FEATURE_COUNT]> =
            snapshots.iter().map(|s| encoder.raw_vector(s)).collect();
        let count = rows.len() as f64;

        let mut means = [0.0; FEATURE_COUNT];
        for row in &rows {
            for (mean, value) in means.iter_mut().zip(row.iter()) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= count;
        }

        let mut scales = [0.0; FEATURE_COUNT];
        for row in &rows {
            for ((scale, value), mean) in scales.iter_mut().zip(row.iter()).zip(means.iter()) {
                *scale += (value - mean).powi(2);
            }
        }
        for scale in &mut scales {
            let std_dev = (*scale / count).sqrt();
            *scale = if std_dev > f64::EPSILON { std_dev } else { 1.0 };
        }

        encoder.means = means;
        encoder.scales = scales;
        encoder
    }

    /// Cities known to the encoder, in index order
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Encode one snapshot as a standardized feature vector
    pub fn encode(&self, snapshot: &FeatureSnapshot) -> [f64; FEATURE_COUNT] {
        let mut values = self.raw_vector(snapshot);
        for ((value, mean), scale) in values
            .iter_mut()
            .zip(self.means.iter())
            .zip(self.scales.iter())
        {
            *value = (*value - mean) / scale;
        }
        values
    }

    /// Encode a batch of snapshots as a feature matrix, one row per snapshot
    pub fn encode_matrix(&self, snapshots: &[FeatureSnapshot]) -> Result<Array2<f64>> {
        let mut data = Vec::with_capacity(snapshots.len() * FEATURE_COUNT);
        for snapshot in snapshots {
            data.extend_from_slice(&self.encode(snapshot));
        }

        Array2::from_shape_vec((snapshots.len(), FEATURE_COUNT), data)
            .map_err(|e| ChurnError::Training(format!("feature matrix shape error: {e}")))
    }

    fn raw_vector(&self, snapshot: &FeatureSnapshot) -> [f64; FEATURE_COUNT] {
        [
            f64::from(snapshot.age),
            self.gender_index(snapshot.gender) as f64,
            self.city_index(&snapshot.city) as f64,
            snapshot.total_orders as f64,
            snapshot.total_spent,
            snapshot.days_since_last_order as f64,
        ]
    }

    fn gender_index(&self, gender: Gender) -> usize {
        Gender::ALL
            .iter()
            .position(|g| *g == gender)
            .unwrap_or(Gender::ALL.len())
    }

    fn city_index(&self, city: &str) -> usize {
        self.cities
            .binary_search_by(|known| known.as_str().cmp(city))
            .unwrap_or(self.cities.len())
    }
}

/// Logistic regression classifier over standardized snapshot features
#[derive(Debug, Clone)]
pub struct LogisticRegressionClassifier {
    decision_threshold: f64,
    max_iterations: u64,
}

impl LogisticRegressionClassifier {
    /// Create a classifier with an explicit threshold and iteration cap
    pub fn new(decision_threshold: f64, max_iterations: u64) -> Result<Self> {
        InputValidator::validate_probability(decision_threshold)?;
        if max_iterations == 0 {
            return Err(ChurnError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            decision_threshold,
            max_iterations,
        })
    }

    /// Create a classifier from the model section of the application config
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Self::new(config.decision_threshold, config.max_iterations)
    }
}

impl ChurnClassifier for LogisticRegressionClassifier {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn train(&self, labeled: &[FeatureSnapshot]) -> Result<Box<dyn ChurnModel>> {
        if labeled.is_empty() {
            return Err(ChurnError::Training(
                "cannot train on an empty snapshot set".to_string(),
            ));
        }

        let churned = labeled.iter().filter(|s| s.churn_label).count();
        if churned == 0 || churned == labeled.len() {
            return Err(ChurnError::Training(format!(
                "training data must contain both churned and active customers, got {churned} churned of {}",
                labeled.len()
            )));
        }

        let encoder = FeatureEncoder::fit(labeled);
        let records = encoder.encode_matrix(labeled)?;
        let targets: Array1<bool> = labeled.iter().map(|s| s.churn_label).collect();
        let dataset = Dataset::new(records, targets);

        let model = LogisticRegression::default()
            .max_iterations(self.max_iterations)
            .fit(&dataset)
            .map_err(|e| ChurnError::Training(e.to_string()))?;

        info!(
            samples = labeled.len(),
            churned,
            cities = encoder.cities().len(),
            threshold = self.decision_threshold,
            "Trained logistic regression model"
        );

        Ok(Box::new(FittedChurnModel {
            model,
            encoder,
            decision_threshold: self.decision_threshold,
        }))
    }
}

/// Fitted logistic regression bundled with the encoder it was trained with
#[derive(Debug)]
pub struct FittedChurnModel {
    model: FittedLogisticRegression<f64, bool>,
    encoder: FeatureEncoder,
    decision_threshold: f64,
}

impl ChurnModel for FittedChurnModel {
    fn predict(&self, snapshot: &FeatureSnapshot) -> Result<ChurnScore> {
        let encoded = self.encoder.encode(snapshot);
        let records = Array2::from_shape_vec((1, FEATURE_COUNT), encoded.to_vec())
            .map_err(|e| ChurnError::Training(format!("feature matrix shape error: {e}")))?;

        // predict_probabilities returns P of the greater class, which for
        // bool targets is the churned class.
        let probability = self.model.predict_probabilities(&records)[0];

        Ok(ChurnScore {
            label: probability >= self.decision_threshold,
            probability,
        })
    }

    fn threshold(&self) -> f64 {
        self.decision_threshold
    }
}

/// Score every labeled snapshot and tabulate predictions against labels
pub fn evaluate(model: &dyn ChurnModel, labeled: &[FeatureSnapshot]) -> Result<ConfusionMatrix> {
    let mut matrix = ConfusionMatrix::new();
    for snapshot in labeled {
        let score = model.predict(snapshot)?;
        matrix.observe(snapshot.churn_label, score.label);
    }

    debug!(observations = matrix.total(), "Evaluated churn model");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot(
        customer_id: i64,
        city: &str,
        days_since_last_order: i64,
        total_spent: f64,
        churned: bool,
    ) -> FeatureSnapshot {
        let total_orders = if churned { 1 } else { 8 };
        FeatureSnapshot {
            customer_id,
            age: 25 + (customer_id % 20) as i32,
            gender: if customer_id % 2 == 0 {
                Gender::Female
            } else {
                Gender::Male
            },
            city: city.to_string(),
            total_orders,
            total_spent,
            avg_order_value: total_spent / total_orders as f64,
            last_order_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            days_since_last_order,
            churn_label: churned,
        }
    }

    fn training_set() -> Vec<FeatureSnapshot> {
        vec![
            snapshot(1, "Pune", 150, 400.0, true),
            snapshot(2, "Delhi", 120, 250.0, true),
            snapshot(3, "Pune", 180, 600.0, true),
            snapshot(4, "Mumbai", 200, 150.0, true),
            snapshot(5, "Delhi", 140, 300.0, true),
            snapshot(6, "Pune", 5, 9000.0, false),
            snapshot(7, "Delhi", 12, 7500.0, false),
            snapshot(8, "Mumbai", 3, 12000.0, false),
            snapshot(9, "Pune", 20, 6800.0, false),
            snapshot(10, "Delhi", 8, 10100.0, false),
        ]
    }

    #[test]
    fn test_encoder_sorts_cities_and_reserves_unknown_index() {
        let encoder = FeatureEncoder::fit(&training_set());

        assert_eq!(encoder.cities(), ["Delhi", "Mumbai", "Pune"]);
        assert_eq!(encoder.city_index("Delhi"), 0);
        assert_eq!(encoder.city_index("Pune"), 2);
        assert_eq!(encoder.city_index("Bengaluru"), 3);
    }

    #[test]
    fn test_encoder_standardizes_training_columns() {
        let snapshots = training_set();
        let encoder = FeatureEncoder::fit(&snapshots);

        for column in 0..FEATURE_COLUMNS.len() {
            let mean: f64 = snapshots
                .iter()
                .map(|s| encoder.encode(s)[column])
                .sum::<f64>()
                / snapshots.len() as f64;
            assert!(
                mean.abs() < 1e-9,
                "column {} not centered, mean {mean}",
                FEATURE_COLUMNS[column]
            );
        }
    }

    #[test]
    fn test_encoder_keeps_constant_column_at_zero() {
        let mut snapshots = training_set();
        for s in &mut snapshots {
            s.age = 40;
        }
        let encoder = FeatureEncoder::fit(&snapshots);

        for s in &snapshots {
            assert_eq!(encoder.encode(s)[0], 0.0);
        }
    }

    #[test]
    fn test_train_rejects_empty_set() {
        let classifier = LogisticRegressionClassifier::new(0.5, 100).unwrap();
        let result = classifier.train(&[]);

        assert!(matches!(result, Err(ChurnError::Training(_))));
    }

    #[test]
    fn test_train_rejects_single_class_set() {
        let classifier = LogisticRegressionClassifier::new(0.5, 100).unwrap();
        let all_churned: Vec<FeatureSnapshot> = training_set()
            .into_iter()
            .filter(|s| s.churn_label)
            .collect();

        let result = classifier.train(&all_churned);
        assert!(matches!(result, Err(ChurnError::Training(_))));
    }

    #[test]
    fn test_invalid_hyperparameters_rejected() {
        assert!(LogisticRegressionClassifier::new(1.5, 100).is_err());
        assert!(LogisticRegressionClassifier::new(-0.1, 100).is_err());
        assert!(LogisticRegressionClassifier::new(0.5, 0).is_err());
    }

    #[test]
    fn test_predicted_label_matches_threshold_rule() {
        let snapshots = training_set();
        let classifier = LogisticRegressionClassifier::new(0.5, 100).unwrap();
        let model = classifier.train(&snapshots).unwrap();

        for s in &snapshots {
            let score = model.predict(s).unwrap();
            assert!((0.0..=1.0).contains(&score.probability));
            assert_eq!(score.label, score.probability >= model.threshold());
        }
    }

    #[test]
    fn test_model_separates_inactive_from_active() {
        let snapshots = training_set();
        let classifier = LogisticRegressionClassifier::new(0.5, 100).unwrap();
        let model = classifier.train(&snapshots).unwrap();

        let mean_prob = |churned: bool| {
            let probs: Vec<f64> = snapshots
                .iter()
                .filter(|s| s.churn_label == churned)
                .map(|s| model.predict(s).unwrap().probability)
                .collect();
            probs.iter().sum::<f64>() / probs.len() as f64
        };

        assert!(mean_prob(true) > mean_prob(false));
    }

    #[test]
    fn test_zero_threshold_labels_everyone_churned() {
        let snapshots = training_set();
        let classifier = LogisticRegressionClassifier::new(0.0, 100).unwrap();
        let model = classifier.train(&snapshots).unwrap();

        for s in &snapshots {
            assert!(model.predict(s).unwrap().label);
        }
    }

    #[test]
    fn test_predict_handles_unseen_city() {
        let classifier = LogisticRegressionClassifier::new(0.5, 100).unwrap();
        let model = classifier.train(&training_set()).unwrap();

        let unseen = snapshot(99, "Kolkata", 45, 2000.0, false);
        let score = model.predict(&unseen).unwrap();
        assert!(score.probability.is_finite());
    }

    #[test]
    fn test_evaluate_counts_every_observation() {
        let snapshots = training_set();
        let classifier = LogisticRegressionClassifier::new(0.5, 100).unwrap();
        let model = classifier.train(&snapshots).unwrap();

        let matrix = evaluate(model.as_ref(), &snapshots).unwrap();
        assert_eq!(matrix.total(), snapshots.len() as u64);
        assert!(matrix.accuracy().is_some());
    }
}
