//! Pipeline orchestration over the feature, training and scoring stages
//!
//! Stage ordering lives here: training reads only the published snapshot
//! set, batch scoring upserts every prediction in one transaction, and the
//! metadata row is written after the predictions it describes.

use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info};

use crate::analytics::AnalyticsEngine;
use crate::classifier::{evaluate, ChurnClassifier, ChurnModel, FEATURE_COLUMNS};
use crate::config::AppConfig;
use crate::db::Database;
use crate::error::{ChurnError, Result};
use crate::features::FeatureBuilder;
use crate::metrics::MetricsCollector;
use crate::models::{
    ChurnScore, ConfusionMatrix, FeatureSnapshot, NewModelMetadata, PredictionRecord,
};

/// Snapshot count below which no holdout is split off
const MIN_SPLIT_SAMPLES: usize = 5;

/// Summary of one training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    /// Classifier strategy that produced the model
    pub model_name: String,
    /// Snapshots the model was fitted on
    pub training_samples: usize,
    /// Snapshots held out for evaluation, 0 when the set was too small to split
    pub holdout_samples: usize,
    /// Customers scored and upserted into the prediction table
    pub scored_customers: usize,
    /// Confusion matrix over the evaluation set
    pub confusion: ConfusionMatrix,
    /// Timestamp shared by every prediction row of the run
    pub trained_at: NaiveDateTime,
}

/// Orchestrates feature builds, training runs and per-customer scoring
pub struct ChurnPipeline {
    db: Database,
    config: AppConfig,
    metrics: MetricsCollector,
}

impl ChurnPipeline {
    /// Create a pipeline over an opened database
    pub fn new(db: Database, config: AppConfig) -> Self {
        Self {
            db,
            config,
            metrics: MetricsCollector::default(),
        }
    }

    /// Analytics engine sharing this pipeline's connection pool
    pub fn analytics(&self) -> AnalyticsEngine {
        AnalyticsEngine::new(self.db.clone())
    }

    /// Metrics collected so far
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Mutable metrics access for callers recording their own operations
    pub fn metrics_mut(&mut self) -> &mut MetricsCollector {
        &mut self.metrics
    }

    /// Rebuild and publish the full feature snapshot set as of a date
    pub fn run_feature_build(&mut self, as_of: NaiveDate) -> Result<usize> {
        let start = Instant::now();
        let builder = FeatureBuilder::new(self.config.churn.inactivity_days)?;

        match builder.run(&self.db, as_of) {
            Ok(count) => {
                self.metrics.record_feature_build(count, start.elapsed());
                Ok(count)
            }
            Err(e) => {
                self.metrics.record_error("feature_build", "run");
                error!(error = %e, "Feature build aborted");
                Err(e)
            }
        }
    }

    /// Train a model, evaluate it and refresh every stored prediction
    ///
    /// Reads the published snapshot set, splits off a seeded holdout for the
    /// confusion matrix, scores every snapshot, upserts the whole batch in
    /// one transaction and records a metadata row. `trained_at` stamps the
    /// metadata and every prediction of the run.
    pub fn run_training(
        &mut self,
        classifier: &dyn ChurnClassifier,
        trained_at: NaiveDateTime,
    ) -> Result<TrainingReport> {
        let start = Instant::now();

        match self.train_and_score(classifier, trained_at) {
            Ok(report) => {
                self.metrics.record_training_run(
                    report.training_samples,
                    report.holdout_samples,
                    start.elapsed(),
                );
                self.metrics
                    .record_scoring(report.scored_customers, start.elapsed());
                Ok(report)
            }
            Err(e) => {
                self.metrics.record_error("training", classifier.name());
                error!(error = %e, model = classifier.name(), "Training run aborted");
                Err(e)
            }
        }
    }

    /// Score one customer against an already-trained model
    ///
    /// A customer without a published snapshot is a lookup error, never a
    /// default-zero score. The stored prediction for the customer is
    /// refreshed with the new score.
    pub fn score_customer(
        &mut self,
        model: &dyn ChurnModel,
        customer_id: i64,
    ) -> Result<ChurnScore> {
        let snapshot = self
            .db
            .get_feature_snapshot(customer_id)?
            .ok_or(ChurnError::SnapshotNotFound(customer_id))?;

        let start = Instant::now();
        let score = model.predict(&snapshot)?;
        self.db.upsert_prediction(&PredictionRecord {
            customer_id,
            churn_prediction: score.label,
            churn_probability: score.probability,
            prediction_date: Utc::now().naive_utc(),
        })?;
        self.metrics.record_scoring(1, start.elapsed());

        info!(
            customer_id,
            probability = score.probability,
            label = score.label,
            "Scored customer"
        );
        Ok(score)
    }

    fn train_and_score(
        &mut self,
        classifier: &dyn ChurnClassifier,
        trained_at: NaiveDateTime,
    ) -> Result<TrainingReport> {
        let snapshots = self.db.list_feature_snapshots()?;
        if snapshots.is_empty() {
            return Err(ChurnError::Training(
                "feature table is empty; run the feature build stage first".to_string(),
            ));
        }

        let (train, holdout) = split_snapshots(
            &snapshots,
            self.config.model.holdout_fraction,
            self.config.model.seed,
        );
        let model = classifier.train(&train)?;

        // An unsplit run evaluates on its own training data; the sample
        // counts in the metadata row make that visible.
        let eval_set: &[FeatureSnapshot] = if holdout.is_empty() { &train } else { &holdout };
        let confusion = evaluate(model.as_ref(), eval_set)?;

        let mut predictions = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            let score = model.predict(snapshot)?;
            predictions.push(PredictionRecord {
                customer_id: snapshot.customer_id,
                churn_prediction: score.label,
                churn_probability: score.probability,
                prediction_date: trained_at,
            });
        }
        let scored_customers = self.db.upsert_predictions(&predictions)?;

        self.db.insert_model_metadata(NewModelMetadata {
            model_name: classifier.name().to_string(),
            accuracy: confusion.accuracy(),
            precision_score: confusion.precision(),
            recall: confusion.recall(),
            f1_score: confusion.f1_score(),
            training_samples: train.len() as i64,
            test_samples: holdout.len() as i64,
            trained_at,
            notes: Some(format!("features: {}", FEATURE_COLUMNS.join(", "))),
        })?;

        info!(
            model = classifier.name(),
            training_samples = train.len(),
            holdout_samples = holdout.len(),
            scored_customers,
            "Training run complete"
        );

        Ok(TrainingReport {
            model_name: classifier.name().to_string(),
            training_samples: train.len(),
            holdout_samples: holdout.len(),
            scored_customers,
            confusion,
            trained_at,
        })
    }
}

/// Seeded train/holdout split
///
/// Below [`MIN_SPLIT_SAMPLES`] snapshots no holdout is split off and the
/// caller evaluates on the training set. The holdout size is the rounded
/// fraction of the set, kept between 1 and len - 2 so both sides stay
/// usable.
fn split_snapshots(
    snapshots: &[FeatureSnapshot],
    holdout_fraction: f64,
    seed: u64,
) -> (Vec<FeatureSnapshot>, Vec<FeatureSnapshot>) {
    if snapshots.len() < MIN_SPLIT_SAMPLES {
        return (snapshots.to_vec(), Vec::new());
    }

    let mut shuffled = snapshots.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let requested = (snapshots.len() as f64 * holdout_fraction).round() as usize;
    let holdout_size = requested.clamp(1, snapshots.len() - 2);
    let holdout = shuffled.split_off(snapshots.len() - holdout_size);
    (shuffled, holdout)
}
