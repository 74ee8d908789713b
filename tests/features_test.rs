//! Integration tests for the feature build stage

use chrono::Duration;
use rusqlite::Connection;

use churn_analysis_rust::error::ChurnError;
use churn_analysis_rust::features::FeatureBuilder;

mod common;
use common::{date, seed_customer, seed_order, test_db};

#[test]
fn test_every_customer_gets_exactly_one_snapshot() {
    let (_dir, db) = test_db();
    let as_of = date(2025, 6, 1);
    let first = seed_customer(&db, "Asha", "Mumbai", date(2024, 1, 1));
    let second = seed_customer(&db, "Ravi", "Delhi", date(2024, 2, 1));
    let idle = seed_customer(&db, "Meera", "Pune", date(2025, 5, 1));
    seed_order(&db, first, date(2025, 4, 1), 400.0);
    seed_order(&db, second, date(2025, 5, 20), 900.0);

    let builder = FeatureBuilder::new(90).expect("builder");
    let published = builder.run(&db, as_of).expect("Failed to build features");
    assert_eq!(published, 3);

    let snapshots = db.list_feature_snapshots().expect("Failed to list snapshots");
    let ids: Vec<_> = snapshots.iter().map(|s| s.customer_id).collect();
    assert_eq!(ids, vec![first, second, idle]);
}

#[test]
fn test_orderless_customer_is_measured_from_signup() {
    let (_dir, db) = test_db();
    let as_of = date(2025, 6, 1);
    let customer_id = seed_customer(&db, "Meera", "Pune", date(2025, 5, 12));

    let builder = FeatureBuilder::new(90).expect("builder");
    builder.run(&db, as_of).expect("Failed to build features");

    let snapshot = db
        .get_feature_snapshot(customer_id)
        .expect("Failed to get snapshot")
        .expect("Snapshot missing");
    assert_eq!(snapshot.total_orders, 0);
    assert!((snapshot.total_spent).abs() < f64::EPSILON);
    assert!((snapshot.avg_order_value).abs() < f64::EPSILON);
    assert_eq!(snapshot.last_order_date, date(2025, 5, 12));
    assert_eq!(snapshot.days_since_last_order, 20);
    assert!(!snapshot.churn_label);
}

#[test]
fn test_snapshot_aggregates_order_history() {
    let (_dir, db) = test_db();
    let as_of = date(2025, 6, 1);
    let customer_id = seed_customer(&db, "Asha", "Mumbai", date(2024, 1, 1));
    seed_order(&db, customer_id, date(2025, 3, 1), 400.0);
    seed_order(&db, customer_id, date(2025, 5, 2), 600.0);

    let builder = FeatureBuilder::new(90).expect("builder");
    builder.run(&db, as_of).expect("Failed to build features");

    let snapshot = db
        .get_feature_snapshot(customer_id)
        .expect("Failed to get snapshot")
        .expect("Snapshot missing");
    assert_eq!(snapshot.total_orders, 2);
    assert!((snapshot.total_spent - 1000.0).abs() < f64::EPSILON);
    assert!((snapshot.avg_order_value - 500.0).abs() < f64::EPSILON);
    assert_eq!(snapshot.last_order_date, date(2025, 5, 2));
    assert_eq!(snapshot.days_since_last_order, 30);
    assert_eq!(snapshot.age, 30);
    assert_eq!(snapshot.city, "Mumbai");
}

#[test]
fn test_churn_label_flips_strictly_past_the_threshold() {
    let (_dir, db) = test_db();
    let as_of = date(2025, 6, 1);
    let at_threshold = seed_customer(&db, "Asha", "Mumbai", date(2024, 1, 1));
    let past_threshold = seed_customer(&db, "Ravi", "Delhi", date(2024, 1, 1));
    seed_order(&db, at_threshold, as_of - Duration::days(90), 100.0);
    seed_order(&db, past_threshold, as_of - Duration::days(91), 100.0);

    let builder = FeatureBuilder::new(90).expect("builder");
    builder.run(&db, as_of).expect("Failed to build features");

    let exactly = db
        .get_feature_snapshot(at_threshold)
        .expect("Failed to get snapshot")
        .expect("Snapshot missing");
    assert_eq!(exactly.days_since_last_order, 90);
    assert!(!exactly.churn_label);

    let beyond = db
        .get_feature_snapshot(past_threshold)
        .expect("Failed to get snapshot")
        .expect("Snapshot missing");
    assert_eq!(beyond.days_since_last_order, 91);
    assert!(beyond.churn_label);
}

#[test]
fn test_order_after_reference_date_clamps_to_zero_days() {
    let (_dir, db) = test_db();
    let customer_id = seed_customer(&db, "Asha", "Mumbai", date(2024, 1, 1));
    seed_order(&db, customer_id, date(2025, 7, 1), 100.0);

    let builder = FeatureBuilder::new(90).expect("builder");
    builder.run(&db, date(2025, 6, 1)).expect("Failed to build features");

    let snapshot = db
        .get_feature_snapshot(customer_id)
        .expect("Failed to get snapshot")
        .expect("Snapshot missing");
    assert_eq!(snapshot.days_since_last_order, 0);
    assert!(!snapshot.churn_label);
}

#[test]
fn test_rebuilding_an_unchanged_store_is_idempotent() {
    let (_dir, db) = test_db();
    let as_of = date(2025, 6, 1);
    let first = seed_customer(&db, "Asha", "Mumbai", date(2024, 1, 1));
    seed_customer(&db, "Ravi", "Delhi", date(2024, 6, 1));
    seed_order(&db, first, date(2025, 1, 10), 750.0);

    let builder = FeatureBuilder::new(90).expect("builder");
    builder.run(&db, as_of).expect("Failed to build features");
    let initial = db.list_feature_snapshots().expect("Failed to list snapshots");

    builder.run(&db, as_of).expect("Failed to rebuild features");
    let rebuilt = db.list_feature_snapshots().expect("Failed to list snapshots");

    assert_eq!(initial, rebuilt);
}

#[test]
fn test_rebuild_replaces_rather_than_appends() {
    let (_dir, db) = test_db();
    let as_of = date(2025, 6, 1);
    let kept = seed_customer(&db, "Asha", "Mumbai", date(2024, 1, 1));
    let removed = seed_customer(&db, "Ravi", "Delhi", date(2024, 1, 1));

    let builder = FeatureBuilder::new(90).expect("builder");
    builder.run(&db, as_of).expect("Failed to build features");
    assert_eq!(db.list_feature_snapshots().expect("Failed to list").len(), 2);

    db.delete_customer(removed).expect("Failed to delete customer");
    builder.run(&db, as_of).expect("Failed to rebuild features");

    let snapshots = db.list_feature_snapshots().expect("Failed to list snapshots");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].customer_id, kept);
}

#[test]
fn test_orphaned_order_aborts_the_build_without_publishing() {
    let (dir, db) = test_db();
    let as_of = date(2025, 6, 1);
    let customer_id = seed_customer(&db, "Asha", "Mumbai", date(2024, 1, 1));
    seed_order(&db, customer_id, date(2025, 5, 1), 100.0);

    let builder = FeatureBuilder::new(90).expect("builder");
    builder.run(&db, as_of).expect("Failed to build features");
    let before = db.list_feature_snapshots().expect("Failed to list snapshots");

    // Inject a row the pool's foreign keys would have rejected
    let raw = Connection::open(dir.path().join("test.db")).expect("Failed to open raw connection");
    raw.execute(
        "INSERT INTO orders (customer_id, order_date, payment_method, order_value) \
         VALUES (555, '2025-05-15', 'UPI', 40.0)",
        [],
    )
    .expect("Failed to inject orphan");

    let result = builder.run(&db, as_of);
    assert!(matches!(
        result,
        Err(ChurnError::ReferentialIntegrity { id: 555, .. })
    ));

    // The previously published set is untouched
    let after = db.list_feature_snapshots().expect("Failed to list snapshots");
    assert_eq!(before, after);
}

#[test]
fn test_negative_threshold_is_rejected() {
    assert!(FeatureBuilder::new(-5).is_err());
}
