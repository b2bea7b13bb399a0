//! Payment confirmation state machine
//!
//! The only success transition reachable here is `PENDING →
//! PAYMENT_CONFIRMED`. Every rejection is detected before any mutation and
//! maps to a distinct user-facing reason; the mutation itself (order
//! status, stock decrements, token consumption) commits as one atomic
//! unit or not at all.

pub mod token;

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::models::OrderStatus;
use crate::db::repository::{self, RepoError};
use crate::utils::now_millis;

/// A product that can no longer cover its ordered quantity
#[derive(Debug, Clone, Serialize)]
pub struct StockProblem {
    pub product_name: String,
    pub available: i64,
    pub ordered: i64,
}

impl std::fmt::Display for StockProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: estoque disponível ({}) menor que quantidade pedida ({})",
            self.product_name, self.available, self.ordered
        )
    }
}

/// Confirmation rejection reasons — each resolves to its own user-facing
/// message, never a silent fallthrough
#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("confirmation token missing")]
    TokenMissing,

    #[error("confirmation token not found")]
    TokenNotFound,

    #[error("token already used at {used_at}")]
    AlreadyUsed { order_number: String, used_at: i64 },

    #[error("token expired at {expires_at}")]
    Expired { order_number: String, expires_at: i64 },

    #[error("order {order_number} already processed (status {status:?})")]
    OrderAlreadyProcessed {
        order_number: String,
        status: OrderStatus,
    },

    #[error("insufficient stock for order {order_number}")]
    InsufficientStock {
        order_number: String,
        problems: Vec<StockProblem>,
    },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Successful confirmation summary
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationReceipt {
    pub order_id: i64,
    pub order_number: String,
    pub total_amount: f64,
    pub customer_name: String,
    pub paid_at: i64,
}

/// Confirms payments against the store
#[derive(Clone)]
pub struct ConfirmationService {
    pool: SqlitePool,
}

impl ConfirmationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Validate the token and, if valid, atomically confirm payment.
    ///
    /// Validation sequence (short-circuiting, no mutation before step 7):
    /// 1. token present; 2. token exists; 3. not used; 4. not expired;
    /// 5. order still PENDING; 6. every item's product still has stock.
    /// Step 7 then commits order transition + stock decrements + token
    /// consumption in one transaction. Calling twice with the same valid
    /// token succeeds exactly once; the second call lands on step 3.
    pub async fn confirm(&self, token_str: &str) -> Result<ConfirmationReceipt, ConfirmError> {
        if token_str.trim().is_empty() {
            return Err(ConfirmError::TokenMissing);
        }

        let now = now_millis();
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;

        // The write lock must be taken before the validation reads. A
        // deferred transaction would let two racing confirmations validate
        // the same snapshot; the loser's first write would then fail with a
        // stale-snapshot error instead of a clean AlreadyUsed. With an
        // immediate transaction the loser queues on the busy timeout and
        // re-reads the consumed token.
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(RepoError::from)?;

        match self.confirm_locked(&mut conn, token_str, now).await {
            Ok(receipt) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(RepoError::from)?;
                tracing::info!(
                    order_number = %receipt.order_number,
                    token_prefix = token::prefix(token_str),
                    "Payment confirmed"
                );
                Ok(receipt)
            }
            Err(err) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(err)
            }
        }
    }

    /// Validation and mutation under the already-open write transaction.
    /// The caller commits on `Ok` and rolls back on `Err`.
    async fn confirm_locked(
        &self,
        tx: &mut sqlx::SqliteConnection,
        token_str: &str,
        now: i64,
    ) -> Result<ConfirmationReceipt, ConfirmError> {
        let Some(tok) = repository::token::find_by_token(&mut *tx, token_str).await? else {
            tracing::warn!(token_prefix = token::prefix(token_str), "Unknown confirmation token");
            return Err(ConfirmError::TokenNotFound);
        };

        let order = repository::order::find_by_id(&mut *tx, tok.order_id)
            .await?
            .ok_or_else(|| {
                RepoError::Database(format!("Token {} references missing order", tok.id))
            })?;

        if tok.used {
            tracing::warn!(
                token_prefix = token::prefix(token_str),
                order_number = %order.order_number,
                "Confirmation attempted with an already-used token"
            );
            return Err(ConfirmError::AlreadyUsed {
                order_number: order.order_number,
                used_at: tok.used_at.unwrap_or(tok.created_at),
            });
        }

        if tok.is_expired(now) {
            tracing::warn!(
                token_prefix = token::prefix(token_str),
                order_number = %order.order_number,
                expires_at = tok.expires_at,
                "Confirmation attempted with an expired token"
            );
            return Err(ConfirmError::Expired {
                order_number: order.order_number,
                expires_at: tok.expires_at,
            });
        }

        // Second line of defense: the token flag and the order status are
        // checked independently even though they should always agree.
        if order.status != OrderStatus::Pending {
            tracing::warn!(
                order_number = %order.order_number,
                status = order.status.as_str(),
                "Order is no longer pending"
            );
            return Err(ConfirmError::OrderAlreadyProcessed {
                order_number: order.order_number,
                status: order.status,
            });
        }

        // Stock may have been consumed by other confirmed orders since
        // checkout; re-validate every line and report all failures.
        let items = repository::order::items_with_stock(&mut *tx, order.id).await?;
        let problems: Vec<StockProblem> = items
            .iter()
            .filter(|item| item.stock < item.quantity)
            .map(|item| StockProblem {
                product_name: item.product_name.clone(),
                available: item.stock,
                ordered: item.quantity,
            })
            .collect();
        if !problems.is_empty() {
            tracing::warn!(
                order_number = %order.order_number,
                failing_products = problems.len(),
                "Stock no longer covers the order"
            );
            return Err(ConfirmError::InsufficientStock {
                order_number: order.order_number,
                problems,
            });
        }

        // All checks passed — mutate as one atomic unit.
        if !repository::order::mark_paid(&mut *tx, order.id, now).await? {
            // A racing confirmation moved the order first.
            return Err(ConfirmError::OrderAlreadyProcessed {
                order_number: order.order_number,
                status: OrderStatus::PaymentConfirmed,
            });
        }

        for item in &items {
            let new_stock = match repository::product::decrement_stock(
                &mut *tx,
                item.product_id,
                item.quantity,
            )
            .await
            {
                Ok(stock) => stock,
                // The pre-check above makes underflow unreachable under the
                // write lock; report it as the stock rejection rather than
                // leaking the repository message to the customer.
                Err(RepoError::Validation(_)) => {
                    let available =
                        repository::product::get_stock(&mut *tx, item.product_id).await?;
                    return Err(ConfirmError::InsufficientStock {
                        order_number: order.order_number,
                        problems: vec![StockProblem {
                            product_name: item.product_name.clone(),
                            available,
                            ordered: item.quantity,
                        }],
                    });
                }
                Err(err) => return Err(err.into()),
            };
            if new_stock <= 0 {
                repository::product::set_out_of_stock(&mut *tx, item.product_id).await?;
            }
        }

        if !repository::token::mark_used(&mut *tx, tok.id, now).await? {
            // The racing loser lands here; nothing committed.
            return Err(ConfirmError::AlreadyUsed {
                order_number: order.order_number,
                used_at: now,
            });
        }

        Ok(ConfirmationReceipt {
            order_id: order.id,
            order_number: order.order_number,
            total_amount: order.total_amount,
            customer_name: order.customer_name,
            paid_at: now,
        })
    }
}
