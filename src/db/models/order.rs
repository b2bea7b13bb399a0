//! Order model
//!
//! An order is created once at checkout and mutated only by lifecycle
//! transitions; cancellation is a status, never a delete. Monetary fields
//! satisfy `total = subtotal + shipping - discount`, enforced at creation.

use serde::{Deserialize, Serialize};

use crate::money;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting payment confirmation
    #[sqlx(rename = "PENDING")]
    Pending,
    #[sqlx(rename = "PAYMENT_CONFIRMED")]
    PaymentConfirmed,
    #[sqlx(rename = "PROCESSING")]
    Processing,
    #[sqlx(rename = "SHIPPED")]
    Shipped,
    #[sqlx(rename = "DELIVERED")]
    Delivered,
    #[sqlx(rename = "CANCELED")]
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PaymentConfirmed => "PAYMENT_CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
        }
    }
}

/// Payment method selected at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    Pix,
    BankSlip,
}

impl PaymentMethod {
    /// Human-readable label snapshotted onto the order
    pub fn display_label(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Cartão de Crédito",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::BankSlip => "Boleto Bancário",
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    /// Human-facing sequential number, e.g. "PED-2025-000123"
    pub order_number: String,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address_id: i64,
    pub status: OrderStatus,
    pub subtotal_amount: f64,
    pub shipping_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub payment_method: String,
    pub created_at: i64,
    pub paid_at: Option<i64>,
    pub shipped_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub canceled_at: Option<i64>,
}

/// Order line item — immutable after creation
///
/// `unit_price` is the price snapshot captured at order time; it is never
/// re-read from the live product.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub discount_amount: f64,
}

impl OrderItem {
    /// `quantity × unit_price − discount`, rounded to 2 decimal places
    pub fn subtotal(&self) -> f64 {
        money::line_subtotal(self.unit_price, self.quantity, self.discount_amount)
    }
}

/// Create order payload (assembled by the checkout orchestrator)
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address_id: i64,
    pub subtotal_amount: f64,
    pub shipping_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub payment_method: String,
}

/// Create order item payload — `unit_price` is the live product price at
/// this instant (price snapshot)
#[derive(Debug, Clone)]
pub struct OrderItemCreate {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub discount_amount: f64,
}

/// Full order detail (order plus its items and shipping address), as
/// rendered on the confirmation page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping_address: super::Address,
}
