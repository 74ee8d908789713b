use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::config::{AppConfig, DatabaseConfig};
use crate::error::{ChurnError, Result};
use crate::models::{
    ActivityRecord, Customer, FeatureSnapshot, ModelMetadata, NewCustomer, NewModelMetadata,
    NewOrder, NewOrderItem, NewProduct, Order, OrderItem, PredictionRecord, Product,
};
use crate::schema::{
    activity, churn_features, churn_predictions, customers, model_metadata, order_items, orders,
    products,
};
use crate::validation::InputValidator;

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager for handling connections and operations
///
/// Wraps an r2d2 pool over SQLite. Foreign keys are enabled on every pooled
/// connection, so cascading deletes of orders, items, activity, snapshots and
/// predictions are enforced by the store itself.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new(database_path: &str) -> Result<Self> {
        InputValidator::validate_database_path(database_path)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Foreign keys are off by default in SQLite and must be set per connection
        let manager = SqliteConnectionManager::file(database_path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().build(manager)?;

        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self { pool })
    }

    /// Create a database connection pool sized from configuration
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        InputValidator::validate_database_path(&config.path)?;

        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(&config.path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        // Create tables if they don't exist
        conn.execute_batch(include_str!(
            "../migrations/2025-05-12-000000_create_core_tables/up.sql"
        ))?;

        conn.execute_batch(include_str!(
            "../migrations/2025-05-12-000001_add_churn_features/up.sql"
        ))?;

        conn.execute_batch(include_str!(
            "../migrations/2025-05-20-000000_add_predictions/up.sql"
        ))?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Insert a new customer
    pub fn insert_customer(&self, new_customer: NewCustomer) -> Result<Customer> {
        InputValidator::validate_customer_name(&new_customer.name)?;
        InputValidator::validate_age(new_customer.age)?;
        InputValidator::validate_city(&new_customer.city)?;

        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?)",
                customers::TABLE,
                customers::NAME,
                customers::GENDER,
                customers::AGE,
                customers::CITY,
                customers::SIGNUP_DATE
            ),
            params![
                new_customer.name,
                new_customer.gender,
                new_customer.age,
                new_customer.city,
                new_customer.signup_date
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(Customer {
            id,
            name: new_customer.name,
            gender: new_customer.gender,
            age: new_customer.age,
            city: new_customer.city,
            signup_date: new_customer.signup_date,
        })
    }

    /// Get a customer by id
    pub fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>> {
        let conn = self.get_connection()?;

        let customer = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    customers::TABLE,
                    customers::ID
                ),
                params![customer_id],
                |row| self.map_customer(row),
            )
            .optional()?;

        Ok(customer)
    }

    /// Get all customers ordered by id
    pub fn list_customers(&self) -> Result<Vec<Customer>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} ASC",
            customers::TABLE,
            customers::ID
        ))?;
        let customer_iter = stmt.query_map(params![], |row| self.map_customer(row))?;

        let mut results = Vec::new();
        for customer in customer_iter {
            results.push(customer?);
        }

        Ok(results)
    }

    /// Delete a customer and, through foreign key cascades, their orders,
    /// order items, activity, feature snapshot and prediction
    pub fn delete_customer(&self, customer_id: i64) -> Result<bool> {
        let conn = self.get_connection()?;

        let affected = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?",
                customers::TABLE,
                customers::ID
            ),
            params![customer_id],
        )?;

        Ok(affected > 0)
    }

    /// Insert a new product
    pub fn insert_product(&self, new_product: NewProduct) -> Result<Product> {
        InputValidator::validate_amount("Product price", new_product.price)?;

        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}) VALUES (?, ?, ?)",
                products::TABLE,
                products::NAME,
                products::CATEGORY,
                products::PRICE
            ),
            params![new_product.name, new_product.category, new_product.price],
        )?;

        let id = conn.last_insert_rowid();
        Ok(Product {
            id,
            name: new_product.name,
            category: new_product.category,
            price: new_product.price,
        })
    }

    /// Get a product by id
    pub fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        let conn = self.get_connection()?;

        let product = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    products::TABLE,
                    products::ID
                ),
                params![product_id],
                |row| self.map_product(row),
            )
            .optional()?;

        Ok(product)
    }

    /// Get all products ordered by id
    pub fn list_products(&self) -> Result<Vec<Product>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} ASC",
            products::TABLE,
            products::ID
        ))?;
        let product_iter = stmt.query_map(params![], |row| self.map_product(row))?;

        let mut results = Vec::new();
        for product in product_iter {
            results.push(product?);
        }

        Ok(results)
    }

    /// Insert a new order for an existing customer
    pub fn insert_order(&self, new_order: NewOrder) -> Result<Order> {
        InputValidator::validate_amount("Order value", new_order.order_value)?;

        let customer = self
            .get_customer(new_order.customer_id)?
            .ok_or(ChurnError::CustomerNotFound(new_order.customer_id))?;
        InputValidator::validate_order_date(new_order.order_date, customer.signup_date)?;

        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
                orders::TABLE,
                orders::CUSTOMER_ID,
                orders::ORDER_DATE,
                orders::PAYMENT_METHOD,
                orders::ORDER_VALUE
            ),
            params![
                new_order.customer_id,
                new_order.order_date,
                new_order.payment_method,
                new_order.order_value
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(Order {
            id,
            customer_id: new_order.customer_id,
            order_date: new_order.order_date,
            payment_method: new_order.payment_method,
            order_value: new_order.order_value,
        })
    }

    /// Get all orders for one customer, oldest first
    pub fn get_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {} ASC, {} ASC",
            orders::TABLE,
            orders::CUSTOMER_ID,
            orders::ORDER_DATE,
            orders::ID
        ))?;
        let order_iter = stmt.query_map(params![customer_id], |row| self.map_order(row))?;

        let mut results = Vec::new();
        for order in order_iter {
            results.push(order?);
        }

        Ok(results)
    }

    /// Get all orders ordered by id
    pub fn list_orders(&self) -> Result<Vec<Order>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} ASC",
            orders::TABLE,
            orders::ID
        ))?;
        let order_iter = stmt.query_map(params![], |row| self.map_order(row))?;

        let mut results = Vec::new();
        for order in order_iter {
            results.push(order?);
        }

        Ok(results)
    }

    /// Insert a new order line item
    pub fn insert_order_item(&self, new_item: NewOrderItem) -> Result<OrderItem> {
        InputValidator::validate_quantity(new_item.quantity)?;

        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}) VALUES (?, ?, ?)",
                order_items::TABLE,
                order_items::ORDER_ID,
                order_items::PRODUCT_ID,
                order_items::QUANTITY
            ),
            params![new_item.order_id, new_item.product_id, new_item.quantity],
        )?;

        let id = conn.last_insert_rowid();
        Ok(OrderItem {
            id,
            order_id: new_item.order_id,
            product_id: new_item.product_id,
            quantity: new_item.quantity,
        })
    }

    /// Insert or update the activity row for a customer
    pub fn upsert_activity(&self, record: &ActivityRecord) -> Result<()> {
        InputValidator::validate_support_tickets(record.support_tickets)?;

        if self.get_customer(record.customer_id)?.is_none() {
            return Err(ChurnError::CustomerNotFound(record.customer_id));
        }

        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {table} ({customer_id}, {last_login}, {tickets}) \
                 VALUES (?, ?, ?) \
                 ON CONFLICT({customer_id}) DO UPDATE SET \
                 {last_login} = excluded.{last_login}, \
                 {tickets} = excluded.{tickets}",
                table = activity::TABLE,
                customer_id = activity::CUSTOMER_ID,
                last_login = activity::LAST_LOGIN,
                tickets = activity::SUPPORT_TICKETS
            ),
            params![record.customer_id, record.last_login, record.support_tickets],
        )?;

        Ok(())
    }

    /// Get the activity row for a customer
    pub fn get_activity(&self, customer_id: i64) -> Result<Option<ActivityRecord>> {
        let conn = self.get_connection()?;

        let record = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    activity::TABLE,
                    activity::CUSTOMER_ID
                ),
                params![customer_id],
                |row| self.map_activity(row),
            )
            .optional()?;

        Ok(record)
    }

    /// Find one order whose customer no longer exists, if any
    ///
    /// Foreign keys make this unreachable for stores created by this crate,
    /// but imported databases are not trusted: the feature builder aborts on
    /// anything this returns.
    pub fn find_orphaned_order(&self) -> Result<Option<(i64, i64)>> {
        let conn = self.get_connection()?;

        let orphan = conn
            .query_row(
                &format!(
                    "SELECT o.{order_id}, o.{customer_fk} FROM {orders} o \
                     LEFT JOIN {customers} c ON o.{customer_fk} = c.{customer_id} \
                     WHERE c.{customer_id} IS NULL ORDER BY o.{order_id} ASC LIMIT 1",
                    order_id = orders::ID,
                    customer_fk = orders::CUSTOMER_ID,
                    orders = orders::TABLE,
                    customers = customers::TABLE,
                    customer_id = customers::ID
                ),
                params![],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        Ok(orphan)
    }

    /// Aggregate order history per customer with outer-join semantics
    ///
    /// Every customer appears exactly once; customers with no orders carry
    /// zero counts and a NULL last order date.
    pub fn customer_order_aggregates(&self) -> Result<Vec<CustomerOrderAggregate>> {
        let conn = self.get_connection()?;

        let query = format!(
            "SELECT c.{id}, c.{name}, c.{gender}, c.{age}, c.{city}, c.{signup}, \
             COUNT(o.{order_id}) AS order_count, \
             COALESCE(SUM(o.{value}), 0) AS total_spent, \
             COALESCE(AVG(o.{value}), 0) AS avg_order_value, \
             MAX(o.{order_date}) AS last_order_date \
             FROM {customers} c \
             LEFT JOIN {orders} o ON o.{customer_fk} = c.{id} \
             GROUP BY c.{id} \
             ORDER BY c.{id} ASC",
            id = customers::ID,
            name = customers::NAME,
            gender = customers::GENDER,
            age = customers::AGE,
            city = customers::CITY,
            signup = customers::SIGNUP_DATE,
            order_id = orders::ID,
            value = orders::ORDER_VALUE,
            order_date = orders::ORDER_DATE,
            customers = customers::TABLE,
            orders = orders::TABLE,
            customer_fk = orders::CUSTOMER_ID
        );

        let mut stmt = conn.prepare(&query)?;
        let aggregate_iter = stmt.query_map(params![], |row| {
            Ok(CustomerOrderAggregate {
                customer: Customer {
                    id: row.get(customers::ID)?,
                    name: row.get(customers::NAME)?,
                    gender: row.get(customers::GENDER)?,
                    age: row.get(customers::AGE)?,
                    city: row.get(customers::CITY)?,
                    signup_date: row.get(customers::SIGNUP_DATE)?,
                },
                order_count: row.get("order_count")?,
                total_spent: row.get("total_spent")?,
                avg_order_value: row.get("avg_order_value")?,
                last_order_date: row.get("last_order_date")?,
            })
        })?;

        let mut results = Vec::new();
        for aggregate in aggregate_iter {
            results.push(aggregate?);
        }

        Ok(results)
    }

    /// Replace the entire feature snapshot table in one transaction
    ///
    /// Readers see either the previous complete set or the new complete set,
    /// never a mix.
    pub fn replace_feature_snapshots(&self, snapshots: &[FeatureSnapshot]) -> Result<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        tx.execute(&format!("DELETE FROM {}", churn_features::TABLE), params![])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                churn_features::TABLE,
                churn_features::CUSTOMER_ID,
                churn_features::AGE,
                churn_features::GENDER,
                churn_features::CITY,
                churn_features::TOTAL_ORDERS,
                churn_features::TOTAL_SPENT,
                churn_features::AVG_ORDER_VALUE,
                churn_features::LAST_ORDER_DATE,
                churn_features::DAYS_SINCE_LAST_ORDER,
                churn_features::CHURN_LABEL
            ))?;

            for snapshot in snapshots {
                stmt.execute(params![
                    snapshot.customer_id,
                    snapshot.age,
                    snapshot.gender,
                    snapshot.city,
                    snapshot.total_orders,
                    snapshot.total_spent,
                    snapshot.avg_order_value,
                    snapshot.last_order_date,
                    snapshot.days_since_last_order,
                    snapshot.churn_label
                ])?;
            }
        }
        tx.commit()?;

        Ok(snapshots.len())
    }

    /// Get the feature snapshot for one customer
    pub fn get_feature_snapshot(&self, customer_id: i64) -> Result<Option<FeatureSnapshot>> {
        let conn = self.get_connection()?;

        let snapshot = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    churn_features::TABLE,
                    churn_features::CUSTOMER_ID
                ),
                params![customer_id],
                |row| self.map_feature_snapshot(row),
            )
            .optional()?;

        Ok(snapshot)
    }

    /// Get all feature snapshots ordered by customer id
    pub fn list_feature_snapshots(&self) -> Result<Vec<FeatureSnapshot>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} ASC",
            churn_features::TABLE,
            churn_features::CUSTOMER_ID
        ))?;
        let snapshot_iter = stmt.query_map(params![], |row| self.map_feature_snapshot(row))?;

        let mut results = Vec::new();
        for snapshot in snapshot_iter {
            results.push(snapshot?);
        }

        Ok(results)
    }

    /// Insert or replace the prediction for one customer
    ///
    /// Label, probability and date are written in a single statement so a
    /// reader can never observe a half-updated row.
    pub fn upsert_prediction(&self, record: &PredictionRecord) -> Result<()> {
        InputValidator::validate_probability(record.churn_probability)?;

        let conn = self.get_connection()?;
        conn.execute(
            &Self::upsert_prediction_sql(),
            params![
                record.customer_id,
                record.churn_prediction,
                record.churn_probability,
                record.prediction_date
            ],
        )?;

        Ok(())
    }

    /// Upsert a batch of predictions in one transaction
    pub fn upsert_predictions(&self, records: &[PredictionRecord]) -> Result<usize> {
        for record in records {
            InputValidator::validate_probability(record.churn_probability)?;
        }

        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&Self::upsert_prediction_sql())?;
            for record in records {
                stmt.execute(params![
                    record.customer_id,
                    record.churn_prediction,
                    record.churn_probability,
                    record.prediction_date
                ])?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    fn upsert_prediction_sql() -> String {
        format!(
            "INSERT INTO {table} ({customer_id}, {prediction}, {probability}, {date}) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT({customer_id}) DO UPDATE SET \
             {prediction} = excluded.{prediction}, \
             {probability} = excluded.{probability}, \
             {date} = excluded.{date}",
            table = churn_predictions::TABLE,
            customer_id = churn_predictions::CUSTOMER_ID,
            prediction = churn_predictions::CHURN_PREDICTION,
            probability = churn_predictions::CHURN_PROBABILITY,
            date = churn_predictions::PREDICTION_DATE
        )
    }

    /// Get the stored prediction for one customer
    pub fn get_prediction(&self, customer_id: i64) -> Result<Option<PredictionRecord>> {
        let conn = self.get_connection()?;

        let prediction = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    churn_predictions::TABLE,
                    churn_predictions::CUSTOMER_ID
                ),
                params![customer_id],
                |row| self.map_prediction(row),
            )
            .optional()?;

        Ok(prediction)
    }

    /// Get all stored predictions ordered by customer id
    pub fn list_predictions(&self) -> Result<Vec<PredictionRecord>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} ASC",
            churn_predictions::TABLE,
            churn_predictions::CUSTOMER_ID
        ))?;
        let prediction_iter = stmt.query_map(params![], |row| self.map_prediction(row))?;

        let mut results = Vec::new();
        for prediction in prediction_iter {
            results.push(prediction?);
        }

        Ok(results)
    }

    /// Record one training run
    pub fn insert_model_metadata(&self, new_metadata: NewModelMetadata) -> Result<ModelMetadata> {
        let conn = self.get_connection()?;

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                model_metadata::TABLE,
                model_metadata::MODEL_NAME,
                model_metadata::ACCURACY,
                model_metadata::PRECISION_SCORE,
                model_metadata::RECALL,
                model_metadata::F1_SCORE,
                model_metadata::TRAINING_SAMPLES,
                model_metadata::TEST_SAMPLES,
                model_metadata::TRAINED_AT,
                model_metadata::NOTES
            ),
            params![
                new_metadata.model_name,
                new_metadata.accuracy,
                new_metadata.precision_score,
                new_metadata.recall,
                new_metadata.f1_score,
                new_metadata.training_samples,
                new_metadata.test_samples,
                new_metadata.trained_at,
                new_metadata.notes
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(ModelMetadata {
            id,
            model_name: new_metadata.model_name,
            accuracy: new_metadata.accuracy,
            precision_score: new_metadata.precision_score,
            recall: new_metadata.recall,
            f1_score: new_metadata.f1_score,
            training_samples: new_metadata.training_samples,
            test_samples: new_metadata.test_samples,
            trained_at: new_metadata.trained_at,
            notes: new_metadata.notes,
        })
    }

    /// Get the most recent training run record
    pub fn latest_model_metadata(&self) -> Result<Option<ModelMetadata>> {
        let conn = self.get_connection()?;

        let metadata = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} ORDER BY {} DESC LIMIT 1",
                    model_metadata::TABLE,
                    model_metadata::ID
                ),
                params![],
                |row| self.map_model_metadata(row),
            )
            .optional()?;

        Ok(metadata)
    }

    /// Get row counts and the latest scoring date across the store
    pub fn store_stats(&self) -> Result<StoreStats> {
        let conn = self.get_connection()?;

        let count = |table: &str| -> Result<usize> {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {table}"),
                params![],
                |row| row.get(0),
            )?;
            Ok(total as usize)
        };

        let latest_prediction: Option<NaiveDateTime> = conn.query_row(
            &format!(
                "SELECT MAX({}) FROM {}",
                churn_predictions::PREDICTION_DATE,
                churn_predictions::TABLE
            ),
            params![],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            customers: count(customers::TABLE)?,
            products: count(products::TABLE)?,
            orders: count(orders::TABLE)?,
            order_items: count(order_items::TABLE)?,
            feature_snapshots: count(churn_features::TABLE)?,
            predictions: count(churn_predictions::TABLE)?,
            latest_prediction,
        })
    }

    /// Map a database row to a Customer
    fn map_customer(&self, row: &Row) -> rusqlite::Result<Customer> {
        Ok(Customer {
            id: row.get(customers::ID)?,
            name: row.get(customers::NAME)?,
            gender: row.get(customers::GENDER)?,
            age: row.get(customers::AGE)?,
            city: row.get(customers::CITY)?,
            signup_date: row.get(customers::SIGNUP_DATE)?,
        })
    }

    /// Map a database row to a Product
    fn map_product(&self, row: &Row) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get(products::ID)?,
            name: row.get(products::NAME)?,
            category: row.get(products::CATEGORY)?,
            price: row.get(products::PRICE)?,
        })
    }

    /// Map a database row to an Order
    fn map_order(&self, row: &Row) -> rusqlite::Result<Order> {
        Ok(Order {
            id: row.get(orders::ID)?,
            customer_id: row.get(orders::CUSTOMER_ID)?,
            order_date: row.get(orders::ORDER_DATE)?,
            payment_method: row.get(orders::PAYMENT_METHOD)?,
            order_value: row.get(orders::ORDER_VALUE)?,
        })
    }

    /// Map a database row to an ActivityRecord
    fn map_activity(&self, row: &Row) -> rusqlite::Result<ActivityRecord> {
        Ok(ActivityRecord {
            customer_id: row.get(activity::CUSTOMER_ID)?,
            last_login: row.get(activity::LAST_LOGIN)?,
            support_tickets: row.get(activity::SUPPORT_TICKETS)?,
        })
    }

    /// Map a database row to a FeatureSnapshot
    fn map_feature_snapshot(&self, row: &Row) -> rusqlite::Result<FeatureSnapshot> {
        Ok(FeatureSnapshot {
            customer_id: row.get(churn_features::CUSTOMER_ID)?,
            age: row.get(churn_features::AGE)?,
            gender: row.get(churn_features::GENDER)?,
            city: row.get(churn_features::CITY)?,
            total_orders: row.get(churn_features::TOTAL_ORDERS)?,
            total_spent: row.get(churn_features::TOTAL_SPENT)?,
            avg_order_value: row.get(churn_features::AVG_ORDER_VALUE)?,
            last_order_date: row.get(churn_features::LAST_ORDER_DATE)?,
            days_since_last_order: row.get(churn_features::DAYS_SINCE_LAST_ORDER)?,
            churn_label: row.get(churn_features::CHURN_LABEL)?,
        })
    }

    /// Map a database row to a PredictionRecord
    fn map_prediction(&self, row: &Row) -> rusqlite::Result<PredictionRecord> {
        Ok(PredictionRecord {
            customer_id: row.get(churn_predictions::CUSTOMER_ID)?,
            churn_prediction: row.get(churn_predictions::CHURN_PREDICTION)?,
            churn_probability: row.get(churn_predictions::CHURN_PROBABILITY)?,
            prediction_date: row.get(churn_predictions::PREDICTION_DATE)?,
        })
    }

    /// Map a database row to a ModelMetadata
    fn map_model_metadata(&self, row: &Row) -> rusqlite::Result<ModelMetadata> {
        Ok(ModelMetadata {
            id: row.get(model_metadata::ID)?,
            model_name: row.get(model_metadata::MODEL_NAME)?,
            accuracy: row.get(model_metadata::ACCURACY)?,
            precision_score: row.get(model_metadata::PRECISION_SCORE)?,
            recall: row.get(model_metadata::RECALL)?,
            f1_score: row.get(model_metadata::F1_SCORE)?,
            training_samples: row.get(model_metadata::TRAINING_SAMPLES)?,
            test_samples: row.get(model_metadata::TEST_SAMPLES)?,
            trained_at: row.get(model_metadata::TRAINED_AT)?,
            notes: row.get(model_metadata::NOTES)?,
        })
    }
}

/// One customer joined with their lifetime order aggregates
#[derive(Debug, Clone)]
pub struct CustomerOrderAggregate {
    /// The customer row
    pub customer: Customer,
    /// Lifetime order count, 0 when no orders exist
    pub order_count: i64,
    /// Lifetime spend, 0 when no orders exist
    pub total_spent: f64,
    /// Average order value, 0 when no orders exist
    pub avg_order_value: f64,
    /// Most recent order date, None when no orders exist
    pub last_order_date: Option<NaiveDate>,
}

/// Row counts and the latest scoring date across the store
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub customers: usize,
    pub products: usize,
    pub orders: usize,
    pub order_items: usize,
    pub feature_snapshots: usize,
    pub predictions: usize,
    pub latest_prediction: Option<NaiveDateTime>,
}

/// Open the store at the environment-selected path
///
/// `DATABASE_PATH` wins over the configured default. Binary entry points
/// size the pool from configuration instead of going through here.
pub fn establish_connection() -> Result<Database> {
    let database_path = AppConfig::default().get_database_path();
    Database::new(&database_path)
}
