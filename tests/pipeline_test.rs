//! End-to-end tests over the feature, training and scoring stages

use chrono::{Duration, NaiveDateTime};

use churn_analysis_rust::classifier::{ChurnClassifier, LogisticRegressionClassifier};
use churn_analysis_rust::config::AppConfig;
use churn_analysis_rust::db::Database;
use churn_analysis_rust::error::ChurnError;
use churn_analysis_rust::service::ChurnPipeline;

mod common;
use common::{date, seed_customer, seed_order, test_db};

fn datetime(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).expect("valid time")
}

/// Ten long-inactive low spenders and ten recently active high spenders
fn seed_split_population(db: &Database) {
    for i in 0..10 {
        let churned = seed_customer(db, &format!("Churned {i}"), "Mumbai", date(2024, 1, 1));
        seed_order(db, churned, date(2024, 8, 1), 150.0 + f64::from(i) * 10.0);

        let active = seed_customer(db, &format!("Active {i}"), "Delhi", date(2024, 1, 1));
        seed_order(db, active, date(2025, 4, 10), 1000.0 + f64::from(i) * 50.0);
        seed_order(db, active, date(2025, 5, 20), 1000.0 + f64::from(i) * 50.0);
    }
}

#[test]
fn test_inactivity_listing_agrees_with_churn_labels() {
    let (_dir, db) = test_db();
    let as_of = date(2025, 6, 1);
    let lapsed = seed_customer(&db, "Asha", "Mumbai", as_of - Duration::days(200));
    seed_order(&db, lapsed, as_of - Duration::days(120), 5000.0);
    let fresh = seed_customer(&db, "Ravi", "Delhi", as_of - Duration::days(10));

    let mut pipeline = ChurnPipeline::new(db.clone(), AppConfig::default());
    pipeline
        .run_feature_build(as_of)
        .expect("Failed to build features");

    let snapshots = db.list_feature_snapshots().expect("Failed to list snapshots");
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots[0].churn_label);
    assert!(!snapshots[1].churn_label);

    let inactive = pipeline
        .analytics()
        .inactive_customers(90, as_of)
        .expect("Failed to list inactive customers");
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].customer_id, lapsed);
    assert_eq!(inactive[0].days_inactive, 120);
    assert!((inactive[0].lifetime_value - 5000.0).abs() < f64::EPSILON);
    assert!(inactive.iter().all(|c| c.customer_id != fresh));
}

#[test]
fn test_training_run_scores_every_snapshot() {
    let (_dir, db) = test_db();
    seed_split_population(&db);
    let config = AppConfig::default();
    let trained_at = datetime(2025, 6, 1, 12);

    let mut pipeline = ChurnPipeline::new(db.clone(), config.clone());
    let published = pipeline
        .run_feature_build(date(2025, 6, 1))
        .expect("Failed to build features");
    assert_eq!(published, 20);

    let classifier =
        LogisticRegressionClassifier::from_config(&config.model).expect("Failed to build classifier");
    let report = pipeline
        .run_training(&classifier, trained_at)
        .expect("Failed to run training");

    assert_eq!(report.model_name, "logistic_regression");
    assert_eq!(report.training_samples, 16);
    assert_eq!(report.holdout_samples, 4);
    assert_eq!(report.scored_customers, 20);
    assert_eq!(report.trained_at, trained_at);
    assert_eq!(report.confusion.total(), 4);

    // Every customer in the feature table got a prediction stamped with the
    // run timestamp, and the stored label matches the stored probability
    let predictions = db.list_predictions().expect("Failed to list predictions");
    assert_eq!(predictions.len(), 20);
    for prediction in &predictions {
        assert_eq!(prediction.prediction_date, trained_at);
        assert_eq!(
            prediction.churn_prediction,
            prediction.churn_probability >= config.model.decision_threshold
        );
    }

    let metadata = db
        .latest_model_metadata()
        .expect("Failed to read model metadata")
        .expect("Metadata row missing");
    assert_eq!(metadata.model_name, "logistic_regression");
    assert_eq!(metadata.training_samples, 16);
    assert_eq!(metadata.test_samples, 4);
    assert_eq!(metadata.trained_at, trained_at);
}

#[test]
fn test_second_training_run_replaces_predictions() {
    let (_dir, db) = test_db();
    for i in 0..3 {
        let churned = seed_customer(&db, &format!("Churned {i}"), "Mumbai", date(2024, 1, 1));
        seed_order(&db, churned, date(2024, 8, 1), 300.0);
        let active = seed_customer(&db, &format!("Active {i}"), "Delhi", date(2024, 1, 1));
        seed_order(&db, active, date(2025, 5, 20), 2500.0);
    }
    let config = AppConfig::default();

    let mut pipeline = ChurnPipeline::new(db.clone(), config.clone());
    pipeline
        .run_feature_build(date(2025, 6, 1))
        .expect("Failed to build features");
    let classifier =
        LogisticRegressionClassifier::from_config(&config.model).expect("Failed to build classifier");

    let first_run = datetime(2025, 6, 1, 8);
    pipeline
        .run_training(&classifier, first_run)
        .expect("Failed to run first training");
    let second_run = datetime(2025, 6, 2, 8);
    pipeline
        .run_training(&classifier, second_run)
        .expect("Failed to run second training");

    let predictions = db.list_predictions().expect("Failed to list predictions");
    assert_eq!(predictions.len(), 6);
    assert!(predictions.iter().all(|p| p.prediction_date == second_run));

    let metadata = db
        .latest_model_metadata()
        .expect("Failed to read model metadata")
        .expect("Metadata row missing");
    assert_eq!(metadata.trained_at, second_run);
}

#[test]
fn test_scoring_unknown_customer_is_a_lookup_error() {
    let (_dir, db) = test_db();
    for i in 0..2 {
        let churned = seed_customer(&db, &format!("Churned {i}"), "Mumbai", date(2024, 1, 1));
        seed_order(&db, churned, date(2024, 8, 1), 300.0);
        let active = seed_customer(&db, &format!("Active {i}"), "Delhi", date(2024, 1, 1));
        seed_order(&db, active, date(2025, 5, 20), 2500.0);
    }
    let config = AppConfig::default();

    let mut pipeline = ChurnPipeline::new(db.clone(), config.clone());
    pipeline
        .run_feature_build(date(2025, 6, 1))
        .expect("Failed to build features");
    let classifier =
        LogisticRegressionClassifier::from_config(&config.model).expect("Failed to build classifier");
    let snapshots = db.list_feature_snapshots().expect("Failed to list snapshots");
    let model = classifier.train(&snapshots).expect("Failed to train model");

    let result = pipeline.score_customer(model.as_ref(), 9999);
    assert!(matches!(result, Err(ChurnError::SnapshotNotFound(9999))));
}

#[test]
fn test_score_customer_refreshes_stored_prediction() {
    let (_dir, db) = test_db();
    let mut scored_id = 0;
    for i in 0..2 {
        let churned = seed_customer(&db, &format!("Churned {i}"), "Mumbai", date(2024, 1, 1));
        seed_order(&db, churned, date(2024, 8, 1), 300.0);
        let active = seed_customer(&db, &format!("Active {i}"), "Delhi", date(2024, 1, 1));
        seed_order(&db, active, date(2025, 5, 20), 2500.0);
        scored_id = active;
    }
    let config = AppConfig::default();

    let mut pipeline = ChurnPipeline::new(db.clone(), config.clone());
    pipeline
        .run_feature_build(date(2025, 6, 1))
        .expect("Failed to build features");
    let classifier =
        LogisticRegressionClassifier::from_config(&config.model).expect("Failed to build classifier");
    let snapshots = db.list_feature_snapshots().expect("Failed to list snapshots");
    let model = classifier.train(&snapshots).expect("Failed to train model");

    let score = pipeline
        .score_customer(model.as_ref(), scored_id)
        .expect("Failed to score customer");

    let stored = db
        .get_prediction(scored_id)
        .expect("Failed to read prediction")
        .expect("Prediction row missing");
    assert_eq!(stored.churn_prediction, score.label);
    assert!((stored.churn_probability - score.probability).abs() < f64::EPSILON);
}

#[test]
fn test_training_on_empty_feature_table_fails() {
    let (_dir, db) = test_db();
    let config = AppConfig::default();

    let mut pipeline = ChurnPipeline::new(db, config.clone());
    let classifier =
        LogisticRegressionClassifier::from_config(&config.model).expect("Failed to build classifier");

    let result = pipeline.run_training(&classifier, datetime(2025, 6, 1, 12));
    assert!(matches!(result, Err(ChurnError::Training(_))));
}

#[test]
fn test_training_rejects_single_class_data() {
    let (_dir, db) = test_db();
    for i in 0..3 {
        let active = seed_customer(&db, &format!("Active {i}"), "Delhi", date(2024, 1, 1));
        seed_order(&db, active, date(2025, 5, 20), 2500.0);
    }
    let config = AppConfig::default();

    let mut pipeline = ChurnPipeline::new(db, config.clone());
    pipeline
        .run_feature_build(date(2025, 6, 1))
        .expect("Failed to build features");
    let classifier =
        LogisticRegressionClassifier::from_config(&config.model).expect("Failed to build classifier");

    let result = pipeline.run_training(&classifier, datetime(2025, 6, 1, 12));
    assert!(matches!(result, Err(ChurnError::Training(_))));
}
