use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use churn_analysis_rust::classifier::{ChurnClassifier, LogisticRegressionClassifier};
use churn_analysis_rust::config::AppConfig;
use churn_analysis_rust::db::Database;
use churn_analysis_rust::export;
use churn_analysis_rust::logging::{init_logging, OperationTimer};
use churn_analysis_rust::metrics::MetricsCollector;
use churn_analysis_rust::models::OutputFormat;
use churn_analysis_rust::service::ChurnPipeline;

const AVAILABLE_REPORTS: &str = "top-spenders, revenue-by-city, revenue-by-category, \
    revenue-by-payment-method, revenue-by-gender, inactive-customers, order-segments, \
    monthly-trend, spend-ranking, cohort-retention, validation, revenue-at-risk, priority-list";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema
    Init,
    /// Build feature snapshots from the order history
    BuildFeatures {
        /// Reference date for recency features (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        as_of: Option<String>,
    },
    /// Train the churn classifier and score every customer
    Train,
    /// Score a single customer against a freshly trained model
    Score {
        /// Customer to score
        #[arg(short, long)]
        customer_id: i64,
    },
    /// Run an analytics report and export it to a file
    Report {
        /// Report name (see --help for the available reports)
        #[arg(short, long)]
        query: String,

        /// Output format (csv or json)
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output directory for the report file
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Percentile-rank cutoff for the top-spenders report
        #[arg(long)]
        fraction: Option<f64>,

        /// Inactivity threshold in days for the inactive-customers report
        #[arg(long)]
        threshold_days: Option<i64>,

        /// Reference date for inactivity (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Show store counts and the latest training run
    Stats,
}

fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard flushes buffered log lines on drop
    let _guard = init_logging(&config.logging)?;

    // Initialize metrics collection
    MetricsCollector::init()?;

    info!("Starting churn analysis pipeline");

    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize database with configuration; migrations run on open
    let db = Database::from_config(&config.database)?;

    // Process command
    match &cli.command {
        Commands::Init => init_store(&config, &db)?,
        Commands::BuildFeatures { as_of } => build_features(&config, &db, as_of)?,
        Commands::Train => train_model(&config, &db)?,
        Commands::Score { customer_id } => score_customer(&config, &db, *customer_id)?,
        Commands::Report {
            query,
            format,
            output_dir,
            fraction,
            threshold_days,
            as_of,
        } => run_report(
            &config,
            &db,
            query,
            format,
            output_dir,
            *fraction,
            *threshold_days,
            as_of,
        )?,
        Commands::Stats => show_stats(&db)?,
    }

    Ok(())
}

/// Report the freshly initialized store
fn init_store(config: &AppConfig, db: &Database) -> Result<()> {
    let stats = db.store_stats()?;
    info!("Database ready at {}", config.database.path);
    info!(
        "Tables: {} customers, {} products, {} orders, {} order items",
        stats.customers, stats.products, stats.orders, stats.order_items
    );
    Ok(())
}

/// Build and publish feature snapshots
fn build_features(config: &AppConfig, db: &Database, as_of: &Option<String>) -> Result<()> {
    let as_of = parse_as_of(as_of)?;
    let timer = OperationTimer::new("build_features");

    let mut pipeline = ChurnPipeline::new(db.clone(), config.clone());
    let count = pipeline.run_feature_build(as_of)?;
    timer.finish();

    info!("Published {} feature snapshots as of {}", count, as_of);
    Ok(())
}

/// Train the classifier, score every customer, and report holdout quality
fn train_model(config: &AppConfig, db: &Database) -> Result<()> {
    let classifier = LogisticRegressionClassifier::from_config(&config.model)?;
    let timer = OperationTimer::new("train_model");

    let mut pipeline = ChurnPipeline::new(db.clone(), config.clone());
    let report = pipeline.run_training(&classifier, Utc::now().naive_utc())?;
    timer.finish();

    info!("Model: {}", report.model_name);
    info!(
        "Samples: {} training, {} holdout",
        report.training_samples, report.holdout_samples
    );
    info!("Customers scored: {}", report.scored_customers);
    log_metric("Accuracy", report.confusion.accuracy());
    log_metric("Precision", report.confusion.precision());
    log_metric("Recall", report.confusion.recall());
    log_metric("F1", report.confusion.f1_score());
    info!("{}", pipeline.metrics().get_summary());
    Ok(())
}

/// Score one customer against a model trained on the current snapshots
fn score_customer(config: &AppConfig, db: &Database, customer_id: i64) -> Result<()> {
    let classifier = LogisticRegressionClassifier::from_config(&config.model)?;
    let snapshots = db.list_feature_snapshots()?;
    let model = classifier.train(&snapshots)?;

    let mut pipeline = ChurnPipeline::new(db.clone(), config.clone());
    let score = pipeline.score_customer(model.as_ref(), customer_id)?;

    info!(
        "Customer {}: churn probability {:.3}, predicted {}",
        customer_id,
        score.probability,
        if score.label { "churned" } else { "active" }
    );
    Ok(())
}

/// Run one analytics report and export it
fn run_report(
    config: &AppConfig,
    db: &Database,
    query: &str,
    format: &str,
    output_dir: &Option<String>,
    fraction: Option<f64>,
    threshold_days: Option<i64>,
    as_of: &Option<String>,
) -> Result<()> {
    // Resolve output format
    let format = match format.parse::<OutputFormat>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(
                "Invalid format: {}. Using {} as default.",
                format, config.export.default_format
            );
            config.export.default_format.parse::<OutputFormat>()?
        },
    };

    let as_of = parse_as_of(as_of)?;
    let fraction = fraction.unwrap_or(config.analytics.top_spender_fraction);
    let threshold_days = threshold_days.unwrap_or(config.churn.inactivity_days);

    // Reports land under <output_dir>/<timestamp>/<query>.<ext>
    let output_dir = output_dir
        .as_deref()
        .unwrap_or(&config.export.output_directory);
    let timestamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let path = export::report_path(Path::new(output_dir), &timestamp, query, format);

    let mut pipeline = ChurnPipeline::new(db.clone(), config.clone());
    let engine = pipeline.analytics();

    let started = Instant::now();
    let rows = match query {
        "top-spenders" => write_rows(&engine.top_spenders(fraction)?, format, &path)?,
        "revenue-by-city" => write_rows(&engine.revenue_by_city()?, format, &path)?,
        "revenue-by-category" => write_rows(&engine.revenue_by_category()?, format, &path)?,
        "revenue-by-payment-method" => {
            write_rows(&engine.revenue_by_payment_method()?, format, &path)?
        },
        "revenue-by-gender" => write_rows(&engine.revenue_by_gender()?, format, &path)?,
        "inactive-customers" => {
            write_rows(&engine.inactive_customers(threshold_days, as_of)?, format, &path)?
        },
        "order-segments" => write_rows(&engine.order_count_segments()?, format, &path)?,
        "monthly-trend" => write_rows(&engine.monthly_revenue_trend()?, format, &path)?,
        "spend-ranking" => write_rows(&engine.spend_ranking()?, format, &path)?,
        "cohort-retention" => write_rows(&engine.cohort_retention()?, format, &path)?,
        "validation" => write_rows(
            std::slice::from_ref(&engine.prediction_validation()?),
            format,
            &path,
        )?,
        "revenue-at-risk" => write_rows(
            std::slice::from_ref(&engine.revenue_at_risk()?),
            format,
            &path,
        )?,
        "priority-list" => write_rows(
            &engine.priority_listing(&config.analytics.tiers)?,
            format,
            &path,
        )?,
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown report: {query}. Available reports: {AVAILABLE_REPORTS}"
            ));
        },
    };

    pipeline
        .metrics_mut()
        .record_analytics_query(query, started.elapsed());
    pipeline
        .metrics_mut()
        .record_report_export(format.extension(), rows);

    info!("Wrote {} rows to {}", rows, path.display());
    Ok(())
}

/// Show store counts and the latest recorded training run
fn show_stats(db: &Database) -> Result<()> {
    let stats = db.store_stats()?;
    info!(
        "Store: {} customers, {} products, {} orders, {} order items",
        stats.customers, stats.products, stats.orders, stats.order_items
    );
    info!(
        "Pipeline: {} feature snapshots, {} predictions",
        stats.feature_snapshots, stats.predictions
    );
    if let Some(latest) = stats.latest_prediction {
        info!("Latest prediction: {}", latest);
    }

    if let Some(metadata) = db.latest_model_metadata()? {
        info!(
            "Latest model: {} trained at {} ({} training / {} holdout samples)",
            metadata.model_name, metadata.trained_at, metadata.training_samples, metadata.test_samples
        );
        log_metric("Accuracy", metadata.accuracy);
        log_metric("Precision", metadata.precision_score);
        log_metric("Recall", metadata.recall);
        log_metric("F1", metadata.f1_score);
    }
    Ok(())
}

/// Export rows and return how many were written
fn write_rows<T: Serialize>(rows: &[T], format: OutputFormat, path: &Path) -> Result<usize> {
    export::write_report(rows, format, path)?;
    Ok(rows.len())
}

/// Log an evaluation rate, or its absence when the denominator was zero
fn log_metric(name: &str, value: Option<f64>) {
    match value {
        Some(value) => info!("{}: {:.3}", name, value),
        None => info!("{}: n/a", name),
    }
}

/// Parse an optional YYYY-MM-DD date, defaulting to today
fn parse_as_of(as_of: &Option<String>) -> Result<NaiveDate> {
    match as_of {
        Some(date_str) => NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .context("Invalid date format, use YYYY-MM-DD"),
        None => Ok(Utc::now().date_naive()),
    }
}
