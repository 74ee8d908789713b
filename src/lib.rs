//! Churn Analysis - Customer Churn Prediction and Analytics
//!
//! A Rust pipeline for predicting and analysing customer churn in an
//! e-commerce transaction store.
//!
//! # Features
//!
//! - SQLite-backed transaction store (customers, products, orders, activity)
//! - Per-customer feature snapshots built from order history
//! - Logistic regression churn scoring with a pluggable classifier seam
//! - Revenue, retention, and risk analytics over features and predictions
//! - Report export to CSV and JSON
//!
//! Data flows one way: transactions feed the feature builder, features feed
//! the classifier, predictions feed analytics. Analytics never writes back.

/// Revenue, retention, and churn-risk analytics
pub mod analytics;
/// Churn classifier traits and the logistic regression implementation
pub mod classifier;
/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Report export to CSV and JSON files
pub mod export;
/// Feature snapshot construction from order history
pub mod features;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Database schema definitions
pub mod schema;
/// Pipeline orchestration across the build, train, and score stages
pub mod service;
/// Input validation
pub mod validation;
/// Ranking and windowing helpers for analytics
pub mod window;

// Re-export key components for easier access
pub use analytics::AnalyticsEngine;
pub use classifier::{ChurnClassifier, ChurnModel, LogisticRegressionClassifier};
pub use db::Database;
pub use error::{ChurnError, Result};
pub use features::FeatureBuilder;
pub use models::{ChurnScore, ConfusionMatrix, FeatureSnapshot, OutputFormat, PredictionRecord};
pub use service::ChurnPipeline;
