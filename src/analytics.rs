//! Read-only analytics over transactions, features and predictions
//!
//! Every operation returns a complete typed row set or an error for malformed
//! parameters, never a partial result. Operations that join the feature table
//! with the prediction table run on a single pooled connection inside one
//! transaction, so a concurrent re-scoring run can never leak a mix of old
//! and new predictions into one aggregate.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::config::PriorityTiers;
use crate::db::Database;
use crate::error::Result;
use crate::models::ConfusionMatrix;
use crate::schema::{churn_features, churn_predictions, customers, order_items, orders, products};
use crate::validation::InputValidator;
use crate::window;

/// Order-count bucket labels, lowest to highest
const SEGMENT_LABELS: [&str; 4] = ["1", "2-5", "6-10", "11+"];

/// One row of the top-spender report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSpender {
    /// Customer id
    pub customer_id: i64,
    /// Customer name
    pub name: String,
    /// Customer city
    pub city: String,
    /// Lifetime spend
    pub total_spent: f64,
    /// 1-based spend rank, ties share a rank
    pub rank: u64,
    /// Percentile rank in [0, 1], 0 is the top spender
    pub percent_rank: f64,
}

/// One row of a grouped revenue rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRevenue {
    /// Grouping key (city, category, payment method or gender)
    pub group: String,
    /// Revenue attributed to the group
    pub revenue: f64,
    /// Orders counted for the group
    pub order_count: i64,
    /// Distinct customers in the group
    pub customer_count: i64,
    /// Revenue per order, absent when the group has no orders
    pub avg_order_value: Option<f64>,
    /// Revenue per customer, absent when the group has no customers
    pub avg_revenue_per_customer: Option<f64>,
}

/// One row of the inactivity listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InactiveCustomer {
    /// Customer id
    pub customer_id: i64,
    /// Customer name
    pub name: String,
    /// Customer city
    pub city: String,
    /// Effective last order date (signup date when no orders exist)
    pub last_order_date: NaiveDate,
    /// Days since the effective last order
    pub days_inactive: i64,
    /// Lifetime spend
    pub lifetime_value: f64,
}

/// One order-count segment with its share of ordering customers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCountSegment {
    /// Bucket label
    pub segment: String,
    /// Customers whose order count falls in the bucket
    pub customer_count: i64,
    /// Share of all ordering customers, in percent
    pub percentage: f64,
}

/// Revenue for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    /// Calendar month, formatted YYYY-MM
    pub month: String,
    /// Revenue for the month
    pub revenue: f64,
    /// Orders placed in the month
    pub order_count: i64,
    /// Percent growth against the preceding month, absent for the first month
    pub growth_pct: Option<f64>,
}

/// Spend ranking row with rank, dense rank and decile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendRank {
    /// Customer id
    pub customer_id: i64,
    /// Customer name
    pub name: String,
    /// Lifetime spend
    pub total_spent: f64,
    /// 1-based rank with gaps after ties
    pub rank: u64,
    /// 1-based rank without gaps
    pub dense_rank: u64,
    /// 1-based decile, 1 holds the highest spenders
    pub decile: u64,
}

/// One signup-month cohort with its activation rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRetention {
    /// Signup month, formatted YYYY-MM
    pub cohort_month: String,
    /// Customers who signed up in the month
    pub cohort_size: i64,
    /// Cohort members with at least one order ever
    pub activated_customers: i64,
    /// Activated share of the cohort, in percent
    pub activation_rate_pct: f64,
}

/// Lifetime revenue split into total and predicted-churn portions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueAtRisk {
    /// Lifetime spend summed over every feature snapshot
    pub total_revenue: f64,
    /// Lifetime spend summed over predicted-churn customers
    pub at_risk_revenue: f64,
    /// At-risk share of total revenue in percent, absent when total is 0
    pub at_risk_pct: Option<f64>,
}

/// One row of the retention priority listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityCustomer {
    /// Customer id
    pub customer_id: i64,
    /// Customer name
    pub name: String,
    /// Lifetime spend
    pub total_spent: f64,
    /// Stored churn probability
    pub churn_probability: f64,
    /// Ordinal priority, 1 is most urgent
    pub priority: u8,
}

/// Read-only aggregation operations over the combined store
#[derive(Clone)]
pub struct AnalyticsEngine {
    db: Database,
}

impl AnalyticsEngine {
    /// Create an engine over an opened database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Customers whose percentile rank by lifetime spend is within `fraction`
    ///
    /// Percent rank is (rank - 1) / (N - 1) with ties sharing a rank, so a
    /// tie straddling the cutoff is included or excluded as a whole instead
    /// of being split the way a LIMIT would split it. With 100 strictly
    /// distinct spenders and fraction 0.1 this selects exactly the top 10.
    pub fn top_spenders(&self, fraction: f64) -> Result<Vec<TopSpender>> {
        InputValidator::validate_fraction(fraction)?;

        let spend = self.customer_spend()?;
        let pairs: Vec<(i64, f64)> = spend.iter().map(|row| (row.0, row.3)).collect();
        let mut details: HashMap<i64, (String, String)> = spend
            .into_iter()
            .map(|(id, name, city, _)| (id, (name, city)))
            .collect();

        let mut top = Vec::new();
        for row in window::rank_desc(&pairs) {
            if row.percent_rank > fraction {
                continue;
            }
            let Some((name, city)) = details.remove(&row.id) else {
                continue;
            };
            top.push(TopSpender {
                customer_id: row.id,
                name,
                city,
                total_spent: row.value,
                rank: row.rank,
                percent_rank: row.percent_rank,
            });
        }

        debug!(selected = top.len(), fraction, "Computed top spender listing");
        Ok(top)
    }

    /// Revenue rollup by customer city
    ///
    /// Built from the customer side of the join, so cities whose customers
    /// never ordered still appear with zero revenue and absent averages.
    pub fn revenue_by_city(&self) -> Result<Vec<GroupRevenue>> {
        let query = format!(
            "SELECT c.{city}, COALESCE(SUM(o.{value}), 0) AS revenue, \
             COUNT(o.{order_id}), COUNT(DISTINCT c.{id}) \
             FROM {customers} c \
             LEFT JOIN {orders} o ON o.{customer_fk} = c.{id} \
             GROUP BY c.{city} \
             ORDER BY revenue DESC, c.{city} ASC",
            city = customers::CITY,
            value = orders::ORDER_VALUE,
            order_id = orders::ID,
            id = customers::ID,
            customers = customers::TABLE,
            orders = orders::TABLE,
            customer_fk = orders::CUSTOMER_ID,
        );

        self.grouped_revenue(&query)
    }

    /// Revenue rollup by product category
    ///
    /// Category revenue is item-level (quantity times unit price) because the
    /// recorded order value is independent of the order's line items.
    /// Categories with no sales still appear.
    pub fn revenue_by_category(&self) -> Result<Vec<GroupRevenue>> {
        let query = format!(
            "SELECT p.{category}, COALESCE(SUM(oi.{quantity} * p.{price}), 0) AS revenue, \
             COUNT(DISTINCT oi.{order_fk}), COUNT(DISTINCT o.{customer_fk}) \
             FROM {products} p \
             LEFT JOIN {order_items} oi ON oi.{product_fk} = p.{id} \
             LEFT JOIN {orders} o ON o.{order_id} = oi.{order_fk} \
             GROUP BY p.{category} \
             ORDER BY revenue DESC, p.{category} ASC",
            category = products::CATEGORY,
            quantity = order_items::QUANTITY,
            price = products::PRICE,
            order_fk = order_items::ORDER_ID,
            customer_fk = orders::CUSTOMER_ID,
            products = products::TABLE,
            order_items = order_items::TABLE,
            product_fk = order_items::PRODUCT_ID,
            id = products::ID,
            orders = orders::TABLE,
            order_id = orders::ID,
        );

        self.grouped_revenue(&query)
    }

    /// Revenue rollup by payment method
    pub fn revenue_by_payment_method(&self) -> Result<Vec<GroupRevenue>> {
        let query = format!(
            "SELECT o.{method}, SUM(o.{value}) AS revenue, COUNT(o.{order_id}), \
             COUNT(DISTINCT o.{customer_fk}) \
             FROM {orders} o \
             GROUP BY o.{method} \
             ORDER BY revenue DESC, o.{method} ASC",
            method = orders::PAYMENT_METHOD,
            value = orders::ORDER_VALUE,
            order_id = orders::ID,
            customer_fk = orders::CUSTOMER_ID,
            orders = orders::TABLE,
        );

        self.grouped_revenue(&query)
    }

    /// Revenue rollup by customer gender
    ///
    /// Genders present among customers appear even when none of those
    /// customers ordered.
    pub fn revenue_by_gender(&self) -> Result<Vec<GroupRevenue>> {
        let query = format!(
            "SELECT c.{gender}, COALESCE(SUM(o.{value}), 0) AS revenue, \
             COUNT(o.{order_id}), COUNT(DISTINCT c.{id}) \
             FROM {customers} c \
             LEFT JOIN {orders} o ON o.{customer_fk} = c.{id} \
             GROUP BY c.{gender} \
             ORDER BY revenue DESC, c.{gender} ASC",
            gender = customers::GENDER,
            value = orders::ORDER_VALUE,
            order_id = orders::ID,
            id = customers::ID,
            customers = customers::TABLE,
            orders = orders::TABLE,
            customer_fk = orders::CUSTOMER_ID,
        );

        self.grouped_revenue(&query)
    }

    /// Customers inactive strictly longer than `threshold_days` as of `as_of`
    ///
    /// Customers without orders are anchored at their signup date, so a
    /// recent signup with no purchases is not reported as inactive. Sorted by
    /// days inactive descending, then customer id.
    pub fn inactive_customers(
        &self,
        threshold_days: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<InactiveCustomer>> {
        InputValidator::validate_inactivity_threshold(threshold_days)?;

        let mut inactive = Vec::new();
        for aggregate in self.db.customer_order_aggregates()? {
            let last_order_date = aggregate
                .last_order_date
                .unwrap_or(aggregate.customer.signup_date);
            let days_inactive = (as_of - last_order_date).num_days().max(0);
            if days_inactive <= threshold_days {
                continue;
            }

            inactive.push(InactiveCustomer {
                customer_id: aggregate.customer.id,
                name: aggregate.customer.name,
                city: aggregate.customer.city,
                last_order_date,
                days_inactive,
                lifetime_value: aggregate.total_spent,
            });
        }

        inactive.sort_by(|a, b| {
            b.days_inactive
                .cmp(&a.days_inactive)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });

        debug!(
            customers = inactive.len(),
            threshold_days, "Computed inactivity listing"
        );
        Ok(inactive)
    }

    /// Distribution of ordering customers over fixed order-count buckets
    ///
    /// Buckets are 1, 2-5, 6-10 and 11+ orders. Customers with no orders are
    /// outside every bucket. All four buckets are reported whenever any
    /// ordering customer exists, so the percentages sum to 100 up to
    /// rounding; with no ordering customers the result is empty.
    pub fn order_count_segments(&self) -> Result<Vec<OrderCountSegment>> {
        let conn = self.db.get_connection()?;
        let query = format!(
            "SELECT COUNT(*) FROM {orders} GROUP BY {customer_fk}",
            orders = orders::TABLE,
            customer_fk = orders::CUSTOMER_ID,
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut counts = [0i64; SEGMENT_LABELS.len()];
        let mut total = 0i64;
        for row in rows {
            counts[segment_index(row?)] += 1;
            total += 1;
        }

        if total == 0 {
            return Ok(Vec::new());
        }

        let segments = SEGMENT_LABELS
            .iter()
            .zip(counts.iter())
            .map(|(label, count)| OrderCountSegment {
                segment: (*label).to_string(),
                customer_count: *count,
                percentage: *count as f64 * 100.0 / total as f64,
            })
            .collect();

        Ok(segments)
    }

    /// Revenue per calendar month in chronological order
    ///
    /// Growth is relative to the immediately preceding month in the series;
    /// the first month has no baseline and reports no growth.
    pub fn monthly_revenue_trend(&self) -> Result<Vec<MonthlyRevenue>> {
        let conn = self.db.get_connection()?;
        let query = format!(
            "SELECT strftime('%Y-%m', {order_date}) AS month, \
             SUM({value}) AS revenue, COUNT({id}) \
             FROM {orders} \
             GROUP BY month \
             ORDER BY month ASC",
            order_date = orders::ORDER_DATE,
            value = orders::ORDER_VALUE,
            id = orders::ID,
            orders = orders::TABLE,
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut months = Vec::new();
        for row in rows {
            months.push(row?);
        }

        let revenues: Vec<f64> = months.iter().map(|m| m.1).collect();
        let trend = months
            .into_iter()
            .zip(window::lag(&revenues))
            .map(|((month, revenue, order_count), prior)| MonthlyRevenue {
                month,
                revenue,
                order_count,
                growth_pct: prior.and_then(|p| {
                    if p > 0.0 {
                        Some((revenue - p) / p * 100.0)
                    } else {
                        None
                    }
                }),
            })
            .collect();

        Ok(trend)
    }

    /// Rank, dense rank and decile for every customer by lifetime spend
    ///
    /// Spend descending, ties broken by ascending customer id. Deciles
    /// follow NTILE semantics: sizes differ by at most one and earlier
    /// deciles take the remainder.
    pub fn spend_ranking(&self) -> Result<Vec<SpendRank>> {
        let spend = self.customer_spend()?;
        let pairs: Vec<(i64, f64)> = spend.iter().map(|row| (row.0, row.3)).collect();
        let mut names: HashMap<i64, String> = spend
            .into_iter()
            .map(|(id, name, _, _)| (id, name))
            .collect();

        let ranked = window::rank_desc(&pairs);
        let deciles = window::ntile(ranked.len(), 10);

        let mut ranking = Vec::with_capacity(ranked.len());
        for (row, decile) in ranked.into_iter().zip(deciles) {
            ranking.push(SpendRank {
                customer_id: row.id,
                name: names.remove(&row.id).unwrap_or_default(),
                total_spent: row.value,
                rank: row.rank,
                dense_rank: row.dense_rank,
                decile,
            });
        }

        Ok(ranking)
    }

    /// Signup-month cohorts with their activation rate
    ///
    /// A cohort member counts as activated once they have any order ever,
    /// regardless of which month the order falls in.
    pub fn cohort_retention(&self) -> Result<Vec<CohortRetention>> {
        let conn = self.db.get_connection()?;
        let query = format!(
            "SELECT strftime('%Y-%m', c.{signup}) AS cohort_month, \
             COUNT(DISTINCT c.{id}), COUNT(DISTINCT o.{customer_fk}) \
             FROM {customers} c \
             LEFT JOIN {orders} o ON o.{customer_fk} = c.{id} \
             GROUP BY cohort_month \
             ORDER BY cohort_month ASC",
            signup = customers::SIGNUP_DATE,
            id = customers::ID,
            customer_fk = orders::CUSTOMER_ID,
            customers = customers::TABLE,
            orders = orders::TABLE,
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut cohorts = Vec::new();
        for row in rows {
            let (cohort_month, cohort_size, activated_customers) = row?;
            let activation_rate_pct = if cohort_size > 0 {
                activated_customers as f64 * 100.0 / cohort_size as f64
            } else {
                0.0
            };
            cohorts.push(CohortRetention {
                cohort_month,
                cohort_size,
                activated_customers,
                activation_rate_pct,
            });
        }

        Ok(cohorts)
    }

    /// Confusion matrix of stored ground-truth labels against predictions
    ///
    /// Covers customers present in both the feature and prediction tables.
    /// Accuracy, precision, recall and F1 are derived on the returned matrix
    /// rather than recomputed here.
    pub fn prediction_validation(&self) -> Result<ConfusionMatrix> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction()?;

        let query = format!(
            "SELECT f.{label}, p.{prediction} \
             FROM {features} f \
             JOIN {predictions} p ON p.{pred_fk} = f.{feat_fk} \
             ORDER BY f.{feat_fk} ASC",
            label = churn_features::CHURN_LABEL,
            prediction = churn_predictions::CHURN_PREDICTION,
            features = churn_features::TABLE,
            predictions = churn_predictions::TABLE,
            pred_fk = churn_predictions::CUSTOMER_ID,
            feat_fk = churn_features::CUSTOMER_ID,
        );

        let mut matrix = ConfusionMatrix::new();
        {
            let mut stmt = tx.prepare(&query)?;
            let rows =
                stmt.query_map([], |row| Ok((row.get::<_, bool>(0)?, row.get::<_, bool>(1)?)))?;
            for row in rows {
                let (actual, predicted) = row?;
                matrix.observe(actual, predicted);
            }
        }
        tx.commit()?;

        debug!(observations = matrix.total(), "Validated stored predictions");
        Ok(matrix)
    }

    /// Lifetime revenue split into total and predicted-churn portions
    ///
    /// Three passes over one transaction: the total sum, the at-risk sum and
    /// the derived percentage, so a concurrent re-scoring run cannot skew the
    /// ratio. The percentage is absent when total revenue is 0.
    pub fn revenue_at_risk(&self) -> Result<RevenueAtRisk> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction()?;

        let total_query = format!(
            "SELECT COALESCE(SUM({spent}), 0) FROM {features}",
            spent = churn_features::TOTAL_SPENT,
            features = churn_features::TABLE,
        );
        let total_revenue: f64 = tx.query_row(&total_query, [], |row| row.get(0))?;

        let at_risk_query = format!(
            "SELECT COALESCE(SUM(f.{spent}), 0) \
             FROM {features} f \
             JOIN {predictions} p ON p.{pred_fk} = f.{feat_fk} \
             WHERE p.{prediction} = 1",
            spent = churn_features::TOTAL_SPENT,
            features = churn_features::TABLE,
            predictions = churn_predictions::TABLE,
            pred_fk = churn_predictions::CUSTOMER_ID,
            feat_fk = churn_features::CUSTOMER_ID,
            prediction = churn_predictions::CHURN_PREDICTION,
        );
        let at_risk_revenue: f64 = tx.query_row(&at_risk_query, [], |row| row.get(0))?;

        tx.commit()?;

        let at_risk_pct = if total_revenue > 0.0 {
            Some(at_risk_revenue * 100.0 / total_revenue)
        } else {
            None
        };

        Ok(RevenueAtRisk {
            total_revenue,
            at_risk_revenue,
            at_risk_pct,
        })
    }

    /// Retention priority per scored customer from configured tier boundaries
    ///
    /// Priority 1 pairs high lifetime spend with high churn risk, priority 3
    /// flags high risk regardless of spend, priority 4 is the default bucket.
    /// Sorted by priority, then spend descending, then customer id.
    pub fn priority_listing(&self, tiers: &PriorityTiers) -> Result<Vec<PriorityCustomer>> {
        tiers.validate()?;

        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction()?;

        let query = format!(
            "SELECT f.{feat_fk}, c.{name}, f.{spent}, p.{probability} \
             FROM {features} f \
             JOIN {customers} c ON c.{id} = f.{feat_fk} \
             JOIN {predictions} p ON p.{pred_fk} = f.{feat_fk} \
             ORDER BY f.{feat_fk} ASC",
            feat_fk = churn_features::CUSTOMER_ID,
            name = customers::NAME,
            spent = churn_features::TOTAL_SPENT,
            probability = churn_predictions::CHURN_PROBABILITY,
            features = churn_features::TABLE,
            customers = customers::TABLE,
            id = customers::ID,
            predictions = churn_predictions::TABLE,
            pred_fk = churn_predictions::CUSTOMER_ID,
        );

        let mut listing = Vec::new();
        {
            let mut stmt = tx.prepare(&query)?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?;
            for row in rows {
                let (customer_id, name, total_spent, churn_probability) = row?;
                listing.push(PriorityCustomer {
                    customer_id,
                    name,
                    total_spent,
                    churn_probability,
                    priority: priority_for(tiers, total_spent, churn_probability),
                });
            }
        }
        tx.commit()?;

        listing.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| b.total_spent.total_cmp(&a.total_spent))
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });

        debug!(customers = listing.len(), "Computed priority listing");
        Ok(listing)
    }

    /// Lifetime spend per customer including customers with no orders
    fn customer_spend(&self) -> Result<Vec<(i64, String, String, f64)>> {
        let conn = self.db.get_connection()?;
        let query = format!(
            "SELECT c.{id}, c.{name}, c.{city}, COALESCE(SUM(o.{value}), 0) AS total_spent \
             FROM {customers} c \
             LEFT JOIN {orders} o ON o.{customer_fk} = c.{id} \
             GROUP BY c.{id} \
             ORDER BY c.{id} ASC",
            id = customers::ID,
            name = customers::NAME,
            city = customers::CITY,
            value = orders::ORDER_VALUE,
            customers = customers::TABLE,
            orders = orders::TABLE,
            customer_fk = orders::CUSTOMER_ID,
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;

        let mut spend = Vec::new();
        for row in rows {
            spend.push(row?);
        }
        Ok(spend)
    }

    /// Run a grouped revenue query and attach guarded averages
    fn grouped_revenue(&self, query: &str) -> Result<Vec<GroupRevenue>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn.prepare(query)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut groups = Vec::new();
        for row in rows {
            let (group, revenue, order_count, customer_count) = row?;
            groups.push(GroupRevenue {
                group,
                revenue,
                order_count,
                customer_count,
                avg_order_value: ratio(revenue, order_count),
                avg_revenue_per_customer: ratio(revenue, customer_count),
            });
        }
        Ok(groups)
    }
}

/// Bucket index for an order count, lowest bucket first
fn segment_index(order_count: i64) -> usize {
    if order_count <= 1 {
        0
    } else if order_count <= 5 {
        1
    } else if order_count <= 10 {
        2
    } else {
        3
    }
}

/// Guarded division: `None` instead of a division by zero
fn ratio(numerator: f64, denominator: i64) -> Option<f64> {
    if denominator > 0 {
        Some(numerator / denominator as f64)
    } else {
        None
    }
}

/// Ordinal priority from configured spend and risk boundaries
fn priority_for(tiers: &PriorityTiers, total_spent: f64, probability: f64) -> u8 {
    if total_spent >= tiers.high_value_spend && probability >= tiers.high_risk_probability {
        1
    } else if total_spent >= tiers.mid_value_spend && probability >= tiers.medium_risk_probability {
        2
    } else if probability >= tiers.high_risk_probability {
        3
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> PriorityTiers {
        PriorityTiers {
            high_value_spend: 10_000.0,
            mid_value_spend: 5_000.0,
            high_risk_probability: 0.7,
            medium_risk_probability: 0.4,
        }
    }

    #[test]
    fn test_segment_index_boundaries() {
        assert_eq!(segment_index(1), 0);
        assert_eq!(segment_index(2), 1);
        assert_eq!(segment_index(5), 1);
        assert_eq!(segment_index(6), 2);
        assert_eq!(segment_index(10), 2);
        assert_eq!(segment_index(11), 3);
        assert_eq!(segment_index(40), 3);
    }

    #[test]
    fn test_ratio_guards_zero_denominator() {
        assert_eq!(ratio(10.0, 0), None);
        assert_eq!(ratio(10.0, 4), Some(2.5));
        assert_eq!(ratio(0.0, 3), Some(0.0));
    }

    #[test]
    fn test_priority_tiers() {
        let tiers = tiers();

        assert_eq!(priority_for(&tiers, 12_000.0, 0.9), 1);
        assert_eq!(priority_for(&tiers, 12_000.0, 0.5), 2);
        assert_eq!(priority_for(&tiers, 6_000.0, 0.45), 2);
        assert_eq!(priority_for(&tiers, 1_000.0, 0.9), 3);
        assert_eq!(priority_for(&tiers, 12_000.0, 0.2), 4);
        assert_eq!(priority_for(&tiers, 1_000.0, 0.1), 4);
    }

    #[test]
    fn test_priority_boundaries_are_inclusive() {
        let tiers = tiers();

        assert_eq!(priority_for(&tiers, 10_000.0, 0.7), 1);
        assert_eq!(priority_for(&tiers, 5_000.0, 0.4), 2);
        assert_eq!(priority_for(&tiers, 0.0, 0.7), 3);
    }
}
