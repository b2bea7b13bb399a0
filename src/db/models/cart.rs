//! Cart models (collaborator-owned)
//!
//! The checkout orchestrator reads the cart joined with live product rows
//! and clears it on success. Client-submitted prices are never trusted.

use serde::{Deserialize, Serialize};

/// Cart line joined with the live product row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    pub product_id: i64,
    pub product_name: String,
    pub product_price: f64,
    pub product_stock: i64,
    pub quantity: i64,
}
