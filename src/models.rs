//! Data models for the churn analysis pipeline
//!
//! This module contains all data structures used throughout the application,
//! including transactional records, feature snapshots, and prediction rows.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::ChurnError;

/// Customer gender as recorded at signup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Other or undisclosed
    Other,
}

impl Gender {
    /// All genders in their canonical encoding order
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    /// Get the stored string form of this gender
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Self::Male),
            "Female" => Ok(Self::Female),
            "Other" => Ok(Self::Other),
            other => Err(ChurnError::InvalidParameter(format!(
                "unknown gender: {other}"
            ))),
        }
    }
}

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Gender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| s.parse::<Self>().map_err(|e| FromSqlError::Other(Box::new(e))))
    }
}

/// Payment method recorded on an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Unified payments interface
    #[serde(rename = "UPI")]
    Upi,
    /// Credit or debit card
    Card,
    /// Net banking transfer
    NetBanking,
    /// Cash on delivery
    #[serde(rename = "COD")]
    Cod,
}

impl PaymentMethod {
    /// All payment methods in their stored order
    pub const ALL: [Self; 4] = [Self::Upi, Self::Card, Self::NetBanking, Self::Cod];

    /// Get the stored string form of this payment method
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Card => "Card",
            Self::NetBanking => "NetBanking",
            Self::Cod => "COD",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPI" => Ok(Self::Upi),
            "Card" => Ok(Self::Card),
            "NetBanking" => Ok(Self::NetBanking),
            "COD" => Ok(Self::Cod),
            other => Err(ChurnError::InvalidParameter(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| s.parse::<Self>().map_err(|e| FromSqlError::Other(Box::new(e))))
    }
}

/// Database representation of a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Database primary key
    pub id: i64,
    /// Customer's display name
    pub name: String,
    /// Gender recorded at signup
    pub gender: Gender,
    /// Age in years
    pub age: i32,
    /// City of residence
    pub city: String,
    /// Date the customer signed up
    pub signup_date: NaiveDate,
}

/// Data for creating a new customer
#[derive(Debug, Clone)]
pub struct NewCustomer {
    /// Customer's display name
    pub name: String,
    /// Gender recorded at signup
    pub gender: Gender,
    /// Age in years
    pub age: i32,
    /// City of residence
    pub city: String,
    /// Date the customer signed up
    pub signup_date: NaiveDate,
}

/// Database representation of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Database primary key
    pub id: i64,
    /// Product name
    pub name: String,
    /// Product category
    pub category: String,
    /// Unit price
    pub price: f64,
}

/// Data for creating a new product
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Product name
    pub name: String,
    /// Product category
    pub category: String,
    /// Unit price
    pub price: f64,
}

/// Database representation of an order
///
/// `order_value` is recorded at checkout and is authoritative for revenue;
/// it need not equal the sum of item quantities times product prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Database primary key
    pub id: i64,
    /// Foreign key to customers table
    pub customer_id: i64,
    /// Date the order was placed
    pub order_date: NaiveDate,
    /// Payment method used
    pub payment_method: PaymentMethod,
    /// Recorded order value
    pub order_value: f64,
}

/// Data for creating a new order
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Foreign key to customers table
    pub customer_id: i64,
    /// Date the order was placed
    pub order_date: NaiveDate,
    /// Payment method used
    pub payment_method: PaymentMethod,
    /// Recorded order value
    pub order_value: f64,
}

/// Database representation of an order line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Database primary key
    pub id: i64,
    /// Foreign key to orders table
    pub order_id: i64,
    /// Foreign key to products table
    pub product_id: i64,
    /// Units purchased
    pub quantity: i64,
}

/// Data for creating a new order line item
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    /// Foreign key to orders table
    pub order_id: i64,
    /// Foreign key to products table
    pub product_id: i64,
    /// Units purchased
    pub quantity: i64,
}

/// Site activity for a customer (one row per customer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Foreign key to customers table
    pub customer_id: i64,
    /// Date of the most recent login
    pub last_login: NaiveDate,
    /// Lifetime count of support tickets
    pub support_tickets: i64,
}

/// Derived behavioral features for one customer
///
/// Exactly one snapshot exists per customer after a feature build, including
/// customers with no orders: their `last_order_date` falls back to the signup
/// date so inactivity is measured from account creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    /// Foreign key to customers table
    pub customer_id: i64,
    /// Age copied from the customer row
    pub age: i32,
    /// Gender copied from the customer row
    pub gender: Gender,
    /// City copied from the customer row
    pub city: String,
    /// Lifetime order count
    pub total_orders: i64,
    /// Lifetime spend (0 with no orders)
    pub total_spent: f64,
    /// Average order value (0 with no orders)
    pub avg_order_value: f64,
    /// Most recent order date, or signup date when no orders exist
    pub last_order_date: NaiveDate,
    /// Days between the effective last order and the build date, never negative
    pub days_since_last_order: i64,
    /// Inactivity-derived training label
    pub churn_label: bool,
}

/// Classifier output for one customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChurnScore {
    /// Predicted churn label under the configured decision threshold
    pub label: bool,
    /// Churn probability in [0, 1]
    pub probability: f64,
}

/// Database representation of a stored prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Foreign key to customers table
    pub customer_id: i64,
    /// Predicted churn label
    pub churn_prediction: bool,
    /// Churn probability in [0, 1]
    pub churn_probability: f64,
    /// Timestamp of the scoring run that produced this row
    pub prediction_date: NaiveDateTime,
}

/// Database representation of a training run record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetadata {
    /// Database primary key
    pub id: i64,
    /// Name of the classifier strategy
    pub model_name: String,
    /// Holdout accuracy, absent when the holdout was empty
    pub accuracy: Option<f64>,
    /// Holdout precision, absent when no positives were predicted
    pub precision_score: Option<f64>,
    /// Holdout recall, absent when no positives were present
    pub recall: Option<f64>,
    /// Holdout F1, absent when precision or recall is absent
    pub f1_score: Option<f64>,
    /// Number of training samples
    pub training_samples: i64,
    /// Number of holdout samples
    pub test_samples: i64,
    /// Timestamp of the training run
    pub trained_at: NaiveDateTime,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Data for recording a training run
#[derive(Debug, Clone)]
pub struct NewModelMetadata {
    /// Name of the classifier strategy
    pub model_name: String,
    /// Holdout accuracy
    pub accuracy: Option<f64>,
    /// Holdout precision
    pub precision_score: Option<f64>,
    /// Holdout recall
    pub recall: Option<f64>,
    /// Holdout F1
    pub f1_score: Option<f64>,
    /// Number of training samples
    pub training_samples: i64,
    /// Number of holdout samples
    pub test_samples: i64,
    /// Timestamp of the training run
    pub trained_at: NaiveDateTime,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Cross-tabulation of actual labels against predicted labels
///
/// Derived rates return `None` instead of dividing by zero, so an empty or
/// one-sided holdout never panics and never fabricates a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Actual churn, predicted churn
    pub true_positive: u64,
    /// Actual active, predicted churn
    pub false_positive: u64,
    /// Actual active, predicted active
    pub true_negative: u64,
    /// Actual churn, predicted active
    pub false_negative: u64,
}

impl ConfusionMatrix {
    /// Create an empty matrix
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one (actual, predicted) observation
    pub fn observe(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (true, true) => self.true_positive += 1,
            (false, true) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
            (true, false) => self.false_negative += 1,
        }
    }

    /// Total number of observations
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    /// Fraction of observations classified correctly
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some((self.true_positive + self.true_negative) as f64 / total as f64)
    }

    /// Fraction of predicted positives that were actual positives
    #[must_use]
    pub fn precision(&self) -> Option<f64> {
        let denominator = self.true_positive + self.false_positive;
        if denominator == 0 {
            return None;
        }
        Some(self.true_positive as f64 / denominator as f64)
    }

    /// Fraction of actual positives that were predicted positive
    #[must_use]
    pub fn recall(&self) -> Option<f64> {
        let denominator = self.true_positive + self.false_negative;
        if denominator == 0 {
            return None;
        }
        Some(self.true_positive as f64 / denominator as f64)
    }

    /// Harmonic mean of precision and recall
    #[must_use]
    pub fn f1_score(&self) -> Option<f64> {
        let precision = self.precision()?;
        let recall = self.recall()?;
        if precision + recall == 0.0 {
            return None;
        }
        Some(2.0 * precision * recall / (precision + recall))
    }
}

/// Output format for exported reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ChurnError::InvalidParameter(format!(
                "unknown output format: {other}"
            ))),
        }
    }
}
