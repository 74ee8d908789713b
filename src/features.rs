//! Feature derivation
//!
//! Turns raw transactional history into one `FeatureSnapshot` per customer.
//! The build is a pure function of the store contents and the reference date,
//! so re-running it against an unchanged store publishes an identical table.

use chrono::NaiveDate;
use tracing::info;

use crate::db::{CustomerOrderAggregate, Database};
use crate::error::{ChurnError, Result};
use crate::models::FeatureSnapshot;
use crate::validation::InputValidator;

/// Derives behavioral feature snapshots from the transactional tables
pub struct FeatureBuilder {
    inactivity_days: i64,
}

impl FeatureBuilder {
    /// Create a builder labeling customers churned after `inactivity_days`
    /// without an order
    pub fn new(inactivity_days: i64) -> Result<Self> {
        InputValidator::validate_inactivity_threshold(inactivity_days)?;
        Ok(Self { inactivity_days })
    }

    /// The configured inactivity threshold in days
    #[must_use]
    pub const fn inactivity_days(&self) -> i64 {
        self.inactivity_days
    }

    /// Derive one snapshot per customer as of a reference date
    ///
    /// Aborts without touching the store when any order references a missing
    /// customer; a partial feature set is never produced.
    pub fn build(&self, db: &Database, as_of: NaiveDate) -> Result<Vec<FeatureSnapshot>> {
        if let Some((order_id, customer_id)) = db.find_orphaned_order()? {
            return Err(ChurnError::ReferentialIntegrity {
                entity: format!("order {order_id}"),
                id: customer_id,
            });
        }

        let aggregates = db.customer_order_aggregates()?;
        let snapshots = aggregates
            .iter()
            .map(|aggregate| self.snapshot_from_aggregate(aggregate, as_of))
            .collect();

        Ok(snapshots)
    }

    /// Build and publish snapshots, replacing the previous set atomically
    pub fn run(&self, db: &Database, as_of: NaiveDate) -> Result<usize> {
        let snapshots = self.build(db, as_of)?;
        let published = db.replace_feature_snapshots(&snapshots)?;

        info!(
            customers = published,
            as_of = %as_of,
            inactivity_days = self.inactivity_days,
            "Published feature snapshots"
        );

        Ok(published)
    }

    fn snapshot_from_aggregate(
        &self,
        aggregate: &CustomerOrderAggregate,
        as_of: NaiveDate,
    ) -> FeatureSnapshot {
        let customer = &aggregate.customer;
        // Customers with no orders are measured from account creation
        let last_order_date = aggregate
            .last_order_date
            .unwrap_or(customer.signup_date);
        // An order dated after the reference date must not produce a
        // negative inactivity
        let days_since_last_order = (as_of - last_order_date).num_days().max(0);
        let churn_label = days_since_last_order > self.inactivity_days;

        FeatureSnapshot {
            customer_id: customer.id,
            age: customer.age,
            gender: customer.gender,
            city: customer.city.clone(),
            total_orders: aggregate.order_count,
            total_spent: aggregate.total_spent,
            avg_order_value: aggregate.avg_order_value,
            last_order_date,
            days_since_last_order,
            churn_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{Customer, Gender};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn aggregate(signup: NaiveDate, last_order: Option<NaiveDate>) -> CustomerOrderAggregate {
        CustomerOrderAggregate {
            customer: Customer {
                id: 1,
                name: "Asha".to_string(),
                gender: Gender::Female,
                age: 30,
                city: "Pune".to_string(),
                signup_date: signup,
            },
            order_count: if last_order.is_some() { 1 } else { 0 },
            total_spent: if last_order.is_some() { 500.0 } else { 0.0 },
            avg_order_value: if last_order.is_some() { 500.0 } else { 0.0 },
            last_order_date: last_order,
        }
    }

    #[test]
    fn zero_order_customer_measures_from_signup() {
        let builder = FeatureBuilder::new(90).expect("builder");
        let snapshot = builder
            .snapshot_from_aggregate(&aggregate(date(2025, 1, 1), None), date(2025, 1, 11));

        assert_eq!(snapshot.last_order_date, date(2025, 1, 1));
        assert_eq!(snapshot.days_since_last_order, 10);
        assert_eq!(snapshot.total_orders, 0);
        assert!(!snapshot.churn_label);
    }

    #[test]
    fn future_dated_order_clamps_to_zero_days() {
        let builder = FeatureBuilder::new(90).expect("builder");
        let snapshot = builder.snapshot_from_aggregate(
            &aggregate(date(2025, 1, 1), Some(date(2025, 3, 1))),
            date(2025, 2, 1),
        );

        assert_eq!(snapshot.days_since_last_order, 0);
        assert!(!snapshot.churn_label);
    }

    #[test]
    fn label_flips_strictly_after_threshold() {
        let builder = FeatureBuilder::new(90).expect("builder");
        let signup = date(2024, 1, 1);

        let at_threshold = builder.snapshot_from_aggregate(
            &aggregate(signup, Some(date(2024, 6, 1))),
            date(2024, 6, 1) + chrono::Duration::days(90),
        );
        assert_eq!(at_threshold.days_since_last_order, 90);
        assert!(!at_threshold.churn_label);

        let past_threshold = builder.snapshot_from_aggregate(
            &aggregate(signup, Some(date(2024, 6, 1))),
            date(2024, 6, 1) + chrono::Duration::days(91),
        );
        assert_eq!(past_threshold.days_since_last_order, 91);
        assert!(past_threshold.churn_label);
    }

    #[test]
    fn negative_threshold_is_rejected() {
        assert!(FeatureBuilder::new(-1).is_err());
    }
}
