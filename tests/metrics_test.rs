//! Comprehensive unit tests for metrics.rs module

use std::time::Duration;

use churn_analysis_rust::metrics::{MetricsCollector, MetricsTimer};

#[test]
fn test_metrics_collector_default() {
    let collector = MetricsCollector::default();
    assert_eq!(collector.db_operations_total, 0);
    assert_eq!(collector.feature_builds_total, 0);
    assert_eq!(collector.snapshots_published_total, 0);
    assert_eq!(collector.training_runs_total, 0);
    assert_eq!(collector.customers_scored_total, 0);
    assert_eq!(collector.analytics_queries_total, 0);
    assert_eq!(collector.reports_exported_total, 0);
    assert_eq!(collector.errors_total, 0);
}

#[test]
fn test_metrics_initialization() {
    let result = MetricsCollector::init();
    assert!(result.is_ok());
}

#[test]
fn test_metrics_initialization_is_idempotent() {
    assert!(MetricsCollector::init().is_ok());
    assert!(MetricsCollector::init().is_ok());
}

#[test]
fn test_record_db_operation_success() {
    let mut collector = MetricsCollector::default();
    collector.record_db_operation("select", Duration::from_millis(100), true);
    assert_eq!(collector.db_operations_total, 1);
    assert_eq!(collector.errors_total, 0);
}

#[test]
fn test_record_db_operation_failure() {
    let mut collector = MetricsCollector::default();
    collector.record_db_operation("select", Duration::from_millis(100), false);
    assert_eq!(collector.db_operations_total, 1);
    assert_eq!(collector.errors_total, 1);
}

#[test]
fn test_record_multiple_db_operations() {
    let mut collector = MetricsCollector::default();
    collector.record_db_operation("select", Duration::from_millis(50), true);
    collector.record_db_operation("insert", Duration::from_millis(100), true);
    collector.record_db_operation("update", Duration::from_millis(75), false);

    assert_eq!(collector.db_operations_total, 3);
    assert_eq!(collector.errors_total, 1);
}

#[test]
fn test_record_feature_build() {
    let mut collector = MetricsCollector::default();
    collector.record_feature_build(150, Duration::from_secs(1));
    assert_eq!(collector.feature_builds_total, 1);
    assert_eq!(collector.snapshots_published_total, 150);
}

#[test]
fn test_record_feature_build_accumulates_snapshots() {
    let mut collector = MetricsCollector::default();
    collector.record_feature_build(150, Duration::from_secs(1));
    collector.record_feature_build(200, Duration::from_secs(2));

    assert_eq!(collector.feature_builds_total, 2);
    assert_eq!(collector.snapshots_published_total, 350);
}

#[test]
fn test_record_training_run() {
    let mut collector = MetricsCollector::default();
    collector.record_training_run(80, 20, Duration::from_secs(3));
    assert_eq!(collector.training_runs_total, 1);
}

#[test]
fn test_record_scoring() {
    let mut collector = MetricsCollector::default();
    collector.record_scoring(100, Duration::from_millis(500));
    assert_eq!(collector.customers_scored_total, 100);
}

#[test]
fn test_record_scoring_accumulates() {
    let mut collector = MetricsCollector::default();
    collector.record_scoring(100, Duration::from_millis(500));
    collector.record_scoring(1, Duration::from_millis(5));
    collector.record_scoring(50, Duration::from_millis(250));

    assert_eq!(collector.customers_scored_total, 151);
}

#[test]
fn test_record_analytics_query() {
    let mut collector = MetricsCollector::default();
    collector.record_analytics_query("top-spenders", Duration::from_millis(20));
    collector.record_analytics_query("monthly-trend", Duration::from_millis(30));

    assert_eq!(collector.analytics_queries_total, 2);
}

#[test]
fn test_record_report_export() {
    let mut collector = MetricsCollector::default();
    collector.record_report_export("csv", 42);
    collector.record_report_export("json", 0);

    assert_eq!(collector.reports_exported_total, 2);
}

#[test]
fn test_record_error() {
    let mut collector = MetricsCollector::default();
    collector.record_error("database", "connection");
    assert_eq!(collector.errors_total, 1);
}

#[test]
fn test_record_multiple_errors() {
    let mut collector = MetricsCollector::default();
    collector.record_error("database", "connection");
    collector.record_error("training", "logistic_regression");
    collector.record_error("validation", "input");

    assert_eq!(collector.errors_total, 3);
}

#[test]
fn test_get_summary_default() {
    let collector = MetricsCollector::default();
    let summary = collector.get_summary();

    assert!(summary.contains("Database operations: 0"));
    assert!(summary.contains("Feature builds: 0"));
    assert!(summary.contains("Errors: 0"));
}

#[test]
fn test_get_summary_with_metrics() {
    let mut collector = MetricsCollector::default();
    collector.record_db_operation("select", Duration::from_millis(100), true);
    collector.record_feature_build(150, Duration::from_secs(1));
    collector.record_training_run(80, 20, Duration::from_secs(3));
    collector.record_scoring(100, Duration::from_millis(500));
    collector.record_analytics_query("top-spenders", Duration::from_millis(20));
    collector.record_report_export("csv", 42);
    collector.record_error("test", "error");

    let summary = collector.get_summary();

    assert!(summary.contains("Database operations: 1"));
    assert!(summary.contains("Feature builds: 1"));
    assert!(summary.contains("Snapshots published: 150"));
    assert!(summary.contains("Training runs: 1"));
    assert!(summary.contains("Customers scored: 100"));
    assert!(summary.contains("Analytics queries: 1"));
    assert!(summary.contains("Reports exported: 1"));
    assert!(summary.contains("Errors: 1"));
}

#[test]
fn test_metrics_timer_creation() {
    let timer = MetricsTimer::new("test_operation");
    assert_eq!(timer.operation, "test_operation");
}

#[test]
fn test_metrics_timer_finish_success() {
    let mut collector = MetricsCollector::default();
    let timer = MetricsTimer::new("test_op");

    std::thread::sleep(Duration::from_millis(10));
    timer.finish(&mut collector, true);

    assert_eq!(collector.db_operations_total, 1);
    assert_eq!(collector.errors_total, 0);
}

#[test]
fn test_metrics_timer_finish_failure() {
    let mut collector = MetricsCollector::default();
    let timer = MetricsTimer::new("test_op");

    timer.finish(&mut collector, false);

    assert_eq!(collector.db_operations_total, 1);
    assert_eq!(collector.errors_total, 1);
}

#[test]
fn test_metrics_large_counts() {
    let mut collector = MetricsCollector::default();

    for _ in 0..1000 {
        collector.record_scoring(1, Duration::from_millis(1));
    }

    assert_eq!(collector.customers_scored_total, 1000);
}

#[test]
fn test_metrics_summary_format() {
    let collector = MetricsCollector::default();
    let summary = collector.get_summary();

    assert!(summary.starts_with("Metrics Summary:"));
    assert!(summary.contains('\n'));
    assert!(summary.contains("- "));
}
