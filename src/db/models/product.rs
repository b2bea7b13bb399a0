//! Product model (catalog collaborator)
//!
//! The order core only reads price/stock and mutates stock/status through
//! the stock ledger; product lifecycle belongs to the catalog.

use serde::{Deserialize, Serialize};

/// Product availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[sqlx(rename = "ACTIVE")]
    Active,
    #[sqlx(rename = "OUT_OF_STOCK")]
    OutOfStock,
    #[sqlx(rename = "INACTIVE")]
    Inactive,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub store_id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub status: ProductStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload (used when seeding the catalog)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub store_id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub stock: i64,
}
