//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.
//! The schema itself lives in the embedded migrations; these constants keep SQL
//! strings in the rest of the crate free of typos.

/// Customers table schema
pub mod customers {
    /// Table name
    pub const TABLE: &str = "customers";
    /// Primary key column
    pub const ID: &str = "id";
    /// Customer name column
    pub const NAME: &str = "name";
    /// Gender column
    pub const GENDER: &str = "gender";
    /// Age column
    pub const AGE: &str = "age";
    /// City column
    pub const CITY: &str = "city";
    /// Signup date column
    pub const SIGNUP_DATE: &str = "signup_date";
}

/// Products table schema
pub mod products {
    /// Table name
    pub const TABLE: &str = "products";
    /// Primary key column
    pub const ID: &str = "id";
    /// Product name column
    pub const NAME: &str = "name";
    /// Category column
    pub const CATEGORY: &str = "category";
    /// Unit price column
    pub const PRICE: &str = "price";
}

/// Orders table schema
pub mod orders {
    /// Table name
    pub const TABLE: &str = "orders";
    /// Primary key column
    pub const ID: &str = "id";
    /// Foreign key to customers table
    pub const CUSTOMER_ID: &str = "customer_id";
    /// Order date column
    pub const ORDER_DATE: &str = "order_date";
    /// Payment method column
    pub const PAYMENT_METHOD: &str = "payment_method";
    /// Recorded order value column
    pub const ORDER_VALUE: &str = "order_value";
}

/// Order items table schema
pub mod order_items {
    /// Table name
    pub const TABLE: &str = "order_items";
    /// Primary key column
    pub const ID: &str = "id";
    /// Foreign key to orders table
    pub const ORDER_ID: &str = "order_id";
    /// Foreign key to products table
    pub const PRODUCT_ID: &str = "product_id";
    /// Quantity column
    pub const QUANTITY: &str = "quantity";
}

/// Activity table schema (one row per customer)
pub mod activity {
    /// Table name
    pub const TABLE: &str = "activity";
    /// Primary key and foreign key to customers table
    pub const CUSTOMER_ID: &str = "customer_id";
    /// Last login date column
    pub const LAST_LOGIN: &str = "last_login";
    /// Support ticket count column
    pub const SUPPORT_TICKETS: &str = "support_tickets";
}

/// Feature snapshot table schema (one row per customer, rebuilt wholesale)
pub mod churn_features {
    /// Table name
    pub const TABLE: &str = "churn_features";
    /// Primary key and foreign key to customers table
    pub const CUSTOMER_ID: &str = "customer_id";
    /// Age copied from the customer row
    pub const AGE: &str = "age";
    /// Gender copied from the customer row
    pub const GENDER: &str = "gender";
    /// City copied from the customer row
    pub const CITY: &str = "city";
    /// Lifetime order count column
    pub const TOTAL_ORDERS: &str = "total_orders";
    /// Lifetime spend column
    pub const TOTAL_SPENT: &str = "total_spent";
    /// Average order value column
    pub const AVG_ORDER_VALUE: &str = "avg_order_value";
    /// Effective last order date column (signup date when no orders)
    pub const LAST_ORDER_DATE: &str = "last_order_date";
    /// Days since the effective last order column
    pub const DAYS_SINCE_LAST_ORDER: &str = "days_since_last_order";
    /// Churn training label column
    pub const CHURN_LABEL: &str = "churn_label";
}

/// Prediction table schema (upsert keyed by customer)
pub mod churn_predictions {
    /// Table name
    pub const TABLE: &str = "churn_predictions";
    /// Primary key and foreign key to customers table
    pub const CUSTOMER_ID: &str = "customer_id";
    /// Predicted churn label column
    pub const CHURN_PREDICTION: &str = "churn_prediction";
    /// Churn probability column
    pub const CHURN_PROBABILITY: &str = "churn_probability";
    /// Scoring timestamp column
    pub const PREDICTION_DATE: &str = "prediction_date";
}

/// Model metadata table schema (one row per training run)
pub mod model_metadata {
    /// Table name
    pub const TABLE: &str = "model_metadata";
    /// Primary key column
    pub const ID: &str = "id";
    /// Model name column
    pub const MODEL_NAME: &str = "model_name";
    /// Holdout accuracy column
    pub const ACCURACY: &str = "accuracy";
    /// Holdout precision column
    pub const PRECISION_SCORE: &str = "precision_score";
    /// Holdout recall column
    pub const RECALL: &str = "recall";
    /// Holdout F1 column
    pub const F1_SCORE: &str = "f1_score";
    /// Training sample count column
    pub const TRAINING_SAMPLES: &str = "training_samples";
    /// Holdout sample count column
    pub const TEST_SAMPLES: &str = "test_samples";
    /// Training timestamp column
    pub const TRAINED_AT: &str = "trained_at";
    /// Free-form notes column
    pub const NOTES: &str = "notes";
}
