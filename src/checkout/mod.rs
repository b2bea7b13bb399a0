//! Checkout orchestrator
//!
//! Turns a customer's cart into a persisted `PENDING` order with its
//! items, a fresh confirmation token and a best-effort confirmation
//! email. Stock is validated point-in-time but **not** decremented here:
//! an unconfirmed order must not lock inventory, so abandoned checkouts
//! never leave phantom reservations behind. Inventory only moves when the
//! payment confirmation commits.

use std::sync::Arc;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use validator::Validate;

use crate::db::models::{
    AddressInput, CartLine, Order, OrderCreate, OrderItemCreate, PaymentConfirmationToken,
    PaymentMethod,
};
use crate::db::repository::{self, RepoError};
use crate::money;
use crate::payment::token;
use crate::services::email::{self, EmailSender};
use crate::utils::now_millis;

/// Checkout form payload.
///
/// Customer identity and contact come from the caller (the auth layer sits
/// upstream); prices and quantities are re-read from storage, never from
/// the client.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub customer_id: i64,
    #[validate(length(min = 1, message = "Nome é obrigatório"))]
    pub full_name: String,
    #[validate(email(message = "Email inválido"))]
    pub email: String,

    #[validate(nested)]
    pub address: AddressInput,
    /// Associate the address with the customer for future reuse
    #[serde(default)]
    pub save_address: bool,

    pub payment_method: PaymentMethod,
    pub card_number: Option<String>,
    pub card_holder_name: Option<String>,
    pub card_expiry: Option<String>,
    pub card_cvv: Option<String>,

    #[serde(default)]
    pub shipping_cost: f64,
    #[serde(default)]
    pub discount: f64,
}

/// Outcome of a successful checkout
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub order_id: i64,
    pub order_number: String,
    pub total_amount: f64,
    /// False when the confirmation email could not be sent; the order is
    /// valid regardless and the customer can be contacted by other means
    pub email_sent: bool,
}

/// Checkout rejection reasons
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock: {}", .0.join("; "))]
    InsufficientStock(Vec<String>),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Places orders from carts
#[derive(Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    mailer: Arc<dyn EmailSender>,
    base_url: String,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool, mailer: Arc<dyn EmailSender>, base_url: String) -> Self {
        Self {
            pool,
            mailer,
            base_url,
        }
    }

    /// Place an order from the customer's cart.
    ///
    /// Sequence: re-fetch cart with live products → validate (empty cart,
    /// card fields, amounts, point-in-time stock) → one transaction
    /// (address resolve, order number, order + items with price snapshot,
    /// token, cart clear) → best-effort email after commit.
    pub async fn place_order(
        &self,
        req: &CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        // Never trust client-submitted prices or quantities.
        let lines = repository::cart::find_lines(&self.pool, req.customer_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        validate_payment_fields(req)?;
        money::require_amount(req.shipping_cost, "shipping_cost")
            .map_err(CheckoutError::Validation)?;
        money::require_amount(req.discount, "discount").map_err(CheckoutError::Validation)?;

        if let Some(line) = lines.iter().find(|l| l.quantity > money::MAX_QUANTITY) {
            return Err(CheckoutError::Validation(format!(
                "Quantidade máxima por item é {} (produto '{}': {})",
                money::MAX_QUANTITY,
                line.product_name,
                line.quantity
            )));
        }

        // Point-in-time stock check only; nothing is reserved here.
        let out_of_stock: Vec<String> = lines
            .iter()
            .filter(|line| line.quantity > line.product_stock)
            .map(|line| {
                format!(
                    "Produto '{}' sem estoque suficiente (disponível: {}, pedido: {})",
                    line.product_name, line.product_stock, line.quantity
                )
            })
            .collect();
        if !out_of_stock.is_empty() {
            return Err(CheckoutError::InsufficientStock(out_of_stock));
        }

        let subtotal = money::order_subtotal(
            lines
                .iter()
                .map(|line| (line.product_price, line.quantity)),
        );
        let total = money::order_total(subtotal, req.shipping_cost, req.discount);

        let now = now_millis();
        let year = chrono::Utc::now().year();

        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;

        // Take the write lock up front so concurrent checkouts queue on the
        // busy timeout instead of failing mid-transaction on a stale
        // snapshot (the sequence-counter bump is a write).
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(RepoError::from)?;

        let created = self
            .create_order_locked(&mut conn, req, &lines, subtotal, total, now, year)
            .await;

        let (order, confirmation) = match created {
            Ok(pair) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(RepoError::from)?;
                pair
            }
            Err(err) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                return Err(err);
            }
        };
        drop(conn);

        tracing::info!(
            order_number = %order.order_number,
            total = order.total_amount,
            items = lines.len(),
            "Order created, awaiting payment confirmation"
        );

        let email_sent = self.send_confirmation_email(&order, &confirmation.token).await;

        Ok(CheckoutReceipt {
            order_id: order.id,
            order_number: order.order_number,
            total_amount: order.total_amount,
            email_sent,
        })
    }

    /// Order creation under the already-open write transaction. The caller
    /// commits on `Ok` and rolls back on `Err`.
    #[allow(clippy::too_many_arguments)]
    async fn create_order_locked(
        &self,
        tx: &mut sqlx::SqliteConnection,
        req: &CheckoutRequest,
        lines: &[CartLine],
        subtotal: f64,
        total: f64,
        now: i64,
        year: i32,
    ) -> Result<(Order, PaymentConfirmationToken), CheckoutError> {
        let address_id = repository::address::find_or_create(&mut *tx, &req.address).await?;
        if req.save_address {
            repository::address::link_customer(&mut *tx, req.customer_id, address_id).await?;
        }

        let order_number = repository::order::next_order_number(&mut *tx, year).await?;
        let order = repository::order::create(
            &mut *tx,
            &order_number,
            OrderCreate {
                customer_id: req.customer_id,
                customer_name: req.full_name.clone(),
                customer_email: req.email.clone(),
                shipping_address_id: address_id,
                subtotal_amount: subtotal,
                shipping_amount: req.shipping_cost,
                discount_amount: req.discount,
                total_amount: total,
                payment_method: req.payment_method.display_label().to_string(),
            },
            &order_items(lines),
        )
        .await?;

        let confirmation = token::issue(&mut *tx, order.id, now).await?;
        repository::cart::clear(&mut *tx, req.customer_id).await?;

        Ok((order, confirmation))
    }

    /// Best-effort: a failed send is logged and reported, never rolled
    /// back — the order is already valid.
    async fn send_confirmation_email(&self, order: &Order, token_value: &str) -> bool {
        let link = format!("{}/confirm?token={}", self.base_url, token_value);
        let (subject, body) = email::order_confirmation_message(
            &order.order_number,
            &order.customer_name,
            order.total_amount,
            &link,
        );
        match self.mailer.send(&order.customer_email, &subject, &body).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    order_number = %order.order_number,
                    error = %err,
                    "Failed to send confirmation email; order remains valid"
                );
                false
            }
        }
    }
}

/// Card sub-fields are required when paying by credit card; report every
/// missing field, not just the first.
fn validate_payment_fields(req: &CheckoutRequest) -> Result<(), CheckoutError> {
    if req.payment_method != PaymentMethod::CreditCard {
        return Ok(());
    }
    let mut missing = Vec::new();
    let required = [
        (&req.card_number, "card_number"),
        (&req.card_holder_name, "card_holder_name"),
        (&req.card_expiry, "card_expiry"),
        (&req.card_cvv, "card_cvv"),
    ];
    for (value, name) in required {
        if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
            missing.push(name.to_string());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CheckoutError::MissingFields(missing))
    }
}

fn order_items(lines: &[CartLine]) -> Vec<OrderItemCreate> {
    lines
        .iter()
        .map(|line| OrderItemCreate {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: line.product_price,
            discount_amount: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: PaymentMethod) -> CheckoutRequest {
        CheckoutRequest {
            customer_id: 1,
            full_name: "Maria Silva".into(),
            email: "maria@example.com".into(),
            address: AddressInput {
                zip_code: "01310-100".into(),
                street: "Avenida Paulista".into(),
                number: "1000".into(),
                complement: None,
                neighborhood: "Bela Vista".into(),
                city: "São Paulo".into(),
                state: "SP".into(),
            },
            save_address: false,
            payment_method: method,
            card_number: None,
            card_holder_name: None,
            card_expiry: None,
            card_cvv: None,
            shipping_cost: 0.0,
            discount: 0.0,
        }
    }

    #[test]
    fn pix_requires_no_card_fields() {
        assert!(validate_payment_fields(&request(PaymentMethod::Pix)).is_ok());
        assert!(validate_payment_fields(&request(PaymentMethod::BankSlip)).is_ok());
    }

    #[test]
    fn credit_card_lists_every_missing_field() {
        let mut req = request(PaymentMethod::CreditCard);
        req.card_number = Some("4111111111111111".into());
        let err = validate_payment_fields(&req).unwrap_err();
        match err {
            CheckoutError::MissingFields(fields) => {
                assert_eq!(fields, vec!["card_holder_name", "card_expiry", "card_cvv"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_card_fields_count_as_missing() {
        let mut req = request(PaymentMethod::CreditCard);
        req.card_number = Some("  ".into());
        req.card_holder_name = Some("MARIA SILVA".into());
        req.card_expiry = Some("12/27".into());
        req.card_cvv = Some("123".into());
        let err = validate_payment_fields(&req).unwrap_err();
        match err {
            CheckoutError::MissingFields(fields) => assert_eq!(fields, vec!["card_number"]),
            other => panic!("unexpected error: {other}"),
        }
    }
}
