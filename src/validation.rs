use chrono::NaiveDate;

use crate::error::{ChurnError, Result};

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate customer name
    pub fn validate_customer_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ChurnError::InvalidParameter(
                "Customer name cannot be empty".to_string(),
            ));
        }

        if name.len() > 100 {
            return Err(ChurnError::InvalidParameter(
                "Customer name too long (max 100 characters)".to_string(),
            ));
        }

        // Check for potentially dangerous characters
        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(ChurnError::InvalidParameter(
                "Customer name contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate customer age
    pub fn validate_age(age: i32) -> Result<()> {
        if !(18..=65).contains(&age) {
            return Err(ChurnError::InvalidParameter(format!(
                "Age must be between 18 and 65, got {age}"
            )));
        }

        Ok(())
    }

    /// Validate city name
    pub fn validate_city(city: &str) -> Result<()> {
        if city.trim().is_empty() {
            return Err(ChurnError::InvalidParameter(
                "City cannot be empty".to_string(),
            ));
        }

        if city.len() > 100 {
            return Err(ChurnError::InvalidParameter(
                "City too long (max 100 characters)".to_string(),
            ));
        }

        if city.contains('\0') || city.contains('\r') || city.contains('\n') {
            return Err(ChurnError::InvalidParameter(
                "City contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate a monetary amount (order value or product price)
    pub fn validate_amount(label: &str, amount: f64) -> Result<()> {
        if !amount.is_finite() {
            return Err(ChurnError::InvalidParameter(format!(
                "{label} must be a finite number"
            )));
        }

        if amount <= 0.0 {
            return Err(ChurnError::InvalidParameter(format!(
                "{label} must be positive, got {amount}"
            )));
        }

        Ok(())
    }

    /// Validate an order item quantity
    pub fn validate_quantity(quantity: i64) -> Result<()> {
        if quantity <= 0 {
            return Err(ChurnError::InvalidParameter(format!(
                "Quantity must be positive, got {quantity}"
            )));
        }

        if quantity > 10_000 {
            return Err(ChurnError::InvalidParameter(
                "Quantity too large (max 10,000)".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate a support ticket count
    pub fn validate_support_tickets(count: i64) -> Result<()> {
        if count < 0 {
            return Err(ChurnError::InvalidParameter(format!(
                "Support ticket count cannot be negative, got {count}"
            )));
        }

        Ok(())
    }

    /// Validate an inactivity threshold in days
    pub fn validate_inactivity_threshold(days: i64) -> Result<()> {
        if days < 0 {
            return Err(ChurnError::InvalidParameter(format!(
                "Inactivity threshold cannot be negative, got {days}"
            )));
        }

        Ok(())
    }

    /// Validate a percentile fraction, e.g. the top-spender cutoff
    pub fn validate_fraction(fraction: f64) -> Result<()> {
        if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
            return Err(ChurnError::InvalidParameter(format!(
                "Fraction must be within (0, 1], got {fraction}"
            )));
        }

        Ok(())
    }

    /// Validate a probability
    pub fn validate_probability(probability: f64) -> Result<()> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ChurnError::InvalidParameter(format!(
                "Probability must be within [0, 1], got {probability}"
            )));
        }

        Ok(())
    }

    /// Validate that an order date is not before the customer signed up
    pub fn validate_order_date(order_date: NaiveDate, signup_date: NaiveDate) -> Result<()> {
        if order_date < signup_date {
            return Err(ChurnError::InvalidParameter(format!(
                "Order date {order_date} precedes signup date {signup_date}"
            )));
        }

        Ok(())
    }

    /// Sanitize free-text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate database path
    pub fn validate_database_path(path: &str) -> Result<()> {
        if path.trim().is_empty() {
            return Err(ChurnError::InvalidParameter(
                "Database path cannot be empty".to_string(),
            ));
        }

        if path.len() > 1000 {
            return Err(ChurnError::InvalidParameter(
                "Database path too long".to_string(),
            ));
        }

        Ok(())
    }
}
