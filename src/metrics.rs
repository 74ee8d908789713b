//! Pipeline metrics collection

use std::time::Duration;

use metrics::{counter, histogram};

use crate::error::Result;

const DB_OPERATIONS_TOTAL: &str = "churn_db_operations_total";
const DB_OPERATION_DURATION: &str = "churn_db_operation_duration_seconds";
const FEATURE_BUILDS_TOTAL: &str = "churn_feature_builds_total";
const FEATURE_BUILD_DURATION: &str = "churn_feature_build_duration_seconds";
const SNAPSHOTS_PUBLISHED_TOTAL: &str = "churn_snapshots_published_total";
const TRAINING_RUNS_TOTAL: &str = "churn_training_runs_total";
const TRAINING_DURATION: &str = "churn_training_duration_seconds";
const CUSTOMERS_SCORED_TOTAL: &str = "churn_customers_scored_total";
const SCORING_DURATION: &str = "churn_scoring_duration_seconds";
const ANALYTICS_QUERIES_TOTAL: &str = "churn_analytics_queries_total";
const ANALYTICS_QUERY_DURATION: &str = "churn_analytics_query_duration_seconds";
const REPORTS_EXPORTED_TOTAL: &str = "churn_reports_exported_total";
const ERRORS_TOTAL: &str = "churn_errors_total";

/// Metrics collection and management
///
/// Counts are mirrored on the struct so callers can read a run summary
/// without a metrics exporter; every update is also emitted through the
/// `metrics` macros for whatever recorder the embedder installs.
#[derive(Debug, Default, Clone)]
pub struct MetricsCollector {
    /// Database statements executed
    pub db_operations_total: u64,
    /// Feature build runs completed
    pub feature_builds_total: u64,
    /// Feature snapshots published across all builds
    pub snapshots_published_total: u64,
    /// Classifier training runs completed
    pub training_runs_total: u64,
    /// Customers scored across all runs
    pub customers_scored_total: u64,
    /// Analytics queries served
    pub analytics_queries_total: u64,
    /// Report files written
    pub reports_exported_total: u64,
    /// Errors observed
    pub errors_total: u64,
}

impl MetricsCollector {
    /// Initialize metrics collection
    ///
    /// Installs a no-op recorder so macro calls are well-defined before an
    /// exporter takes over; an already-installed recorder is left in place.
    pub fn init() -> Result<()> {
        if metrics::set_global_recorder(metrics::NoopRecorder).is_err() {
            tracing::debug!("metrics recorder already installed");
        }
        Ok(())
    }

    /// Record database operation metrics
    pub fn record_db_operation(&mut self, operation: &str, duration: Duration, success: bool) {
        self.db_operations_total += 1;
        let status = if success { "success" } else { "error" };
        counter!(
            DB_OPERATIONS_TOTAL,
            "operation" => operation.to_string(),
            "status" => status
        )
        .increment(1);
        histogram!(DB_OPERATION_DURATION, "operation" => operation.to_string())
            .record(duration.as_secs_f64());

        if !success {
            self.errors_total += 1;
            counter!(ERRORS_TOTAL, "type" => "database").increment(1);
        }
    }

    /// Record feature build metrics
    pub fn record_feature_build(&mut self, snapshot_count: usize, duration: Duration) {
        self.feature_builds_total += 1;
        self.snapshots_published_total += snapshot_count as u64;
        counter!(FEATURE_BUILDS_TOTAL).increment(1);
        counter!(SNAPSHOTS_PUBLISHED_TOTAL).increment(snapshot_count as u64);
        histogram!(FEATURE_BUILD_DURATION).record(duration.as_secs_f64());
    }

    /// Record training run metrics
    pub fn record_training_run(
        &mut self,
        training_samples: usize,
        test_samples: usize,
        duration: Duration,
    ) {
        self.training_runs_total += 1;
        counter!(
            TRAINING_RUNS_TOTAL,
            "training_samples" => training_samples.to_string(),
            "test_samples" => test_samples.to_string()
        )
        .increment(1);
        histogram!(TRAINING_DURATION).record(duration.as_secs_f64());
    }

    /// Record batch scoring metrics
    pub fn record_scoring(&mut self, customer_count: usize, duration: Duration) {
        self.customers_scored_total += customer_count as u64;
        counter!(CUSTOMERS_SCORED_TOTAL).increment(customer_count as u64);
        histogram!(SCORING_DURATION).record(duration.as_secs_f64());
    }

    /// Record analytics query metrics
    pub fn record_analytics_query(&mut self, query: &str, duration: Duration) {
        self.analytics_queries_total += 1;
        counter!(ANALYTICS_QUERIES_TOTAL, "query" => query.to_string()).increment(1);
        histogram!(ANALYTICS_QUERY_DURATION, "query" => query.to_string())
            .record(duration.as_secs_f64());
    }

    /// Record report export metrics
    pub fn record_report_export(&mut self, format: &str, row_count: usize) {
        self.reports_exported_total += 1;
        counter!(
            REPORTS_EXPORTED_TOTAL,
            "format" => format.to_string(),
            "rows" => row_count.to_string()
        )
        .increment(1);
    }

    /// Record error metrics
    pub fn record_error(&mut self, error_type: &str, operation: &str) {
        self.errors_total += 1;
        counter!(
            ERRORS_TOTAL,
            "type" => error_type.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    /// Human-readable run summary for CLI output and logs
    #[must_use]
    pub fn get_summary(&self) -> String {
        format!(
            "Metrics Summary:\n\
             - Database operations: {}\n\
             - Feature builds: {}\n\
             - Snapshots published: {}\n\
             - Training runs: {}\n\
             - Customers scored: {}\n\
             - Analytics queries: {}\n\
             - Reports exported: {}\n\
             - Errors: {}",
            self.db_operations_total,
            self.feature_builds_total,
            self.snapshots_published_total,
            self.training_runs_total,
            self.customers_scored_total,
            self.analytics_queries_total,
            self.reports_exported_total,
            self.errors_total,
        )
    }
}

/// Performance timing wrapper for metrics
pub struct MetricsTimer {
    /// Operation label recorded at finish
    pub operation: String,
    start: std::time::Instant,
}

impl MetricsTimer {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    pub fn finish(self, collector: &mut MetricsCollector, success: bool) {
        let duration = self.start.elapsed();
        collector.record_db_operation(&self.operation, duration, success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.db_operations_total, 0);
        assert_eq!(collector.errors_total, 0);
    }

    #[test]
    fn test_metrics_initialization_is_idempotent() {
        assert!(MetricsCollector::init().is_ok());
        assert!(MetricsCollector::init().is_ok());
    }
}
