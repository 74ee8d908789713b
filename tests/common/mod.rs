//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use tempfile::TempDir;

use churn_analysis_rust::db::Database;
use churn_analysis_rust::models::{FeatureSnapshot, Gender, NewCustomer, NewOrder, PaymentMethod};

/// Open a fresh database in its own temporary directory
///
/// The directory handle must stay alive for as long as the database is used.
pub fn test_db() -> (TempDir, Database) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path.display().to_string()).expect("Failed to create database");
    (temp_dir, db)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Insert a customer with fixed demographics
pub fn seed_customer(db: &Database, name: &str, city: &str, signup_date: NaiveDate) -> i64 {
    db.insert_customer(NewCustomer {
        name: name.to_string(),
        gender: Gender::Female,
        age: 30,
        city: city.to_string(),
        signup_date,
    })
    .expect("Failed to insert customer")
    .id
}

/// Insert an order paid by card
pub fn seed_order(db: &Database, customer_id: i64, order_date: NaiveDate, order_value: f64) -> i64 {
    db.insert_order(NewOrder {
        customer_id,
        order_date,
        payment_method: PaymentMethod::Card,
        order_value,
    })
    .expect("Failed to insert order")
    .id
}

/// A hand-built feature snapshot for tests that bypass the feature builder
pub fn snapshot(customer_id: i64, total_spent: f64, churn_label: bool) -> FeatureSnapshot {
    let days_since_last_order = if churn_label { 120 } else { 10 };
    FeatureSnapshot {
        customer_id,
        age: 30,
        gender: Gender::Female,
        city: "Mumbai".to_string(),
        total_orders: 2,
        total_spent,
        avg_order_value: total_spent / 2.0,
        last_order_date: date(2025, 1, 1),
        days_since_last_order,
        churn_label,
    }
}
