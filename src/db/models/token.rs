//! Payment confirmation token model
//!
//! A single-use, time-limited credential mailed to the customer. Several
//! tokens may exist per order over time (reissue), but normally one is
//! active. Rows are never deleted; a consumed token keeps `used_at` as the
//! audit trail.

use serde::{Deserialize, Serialize};

/// Payment confirmation token row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentConfirmationToken {
    pub id: i64,
    pub order_id: i64,
    /// Opaque random credential (32 lowercase hex chars, URL-safe)
    pub token: String,
    pub created_at: i64,
    /// `created_at` + 24h
    pub expires_at: i64,
    pub used: bool,
    pub used_at: Option<i64>,
}

impl PaymentConfirmationToken {
    /// Whether the token has passed its expiry instant (strict: a token
    /// expiring exactly now is still accepted)
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// Usable: never consumed and not expired
    pub fn is_valid(&self, now: i64) -> bool {
        !self.used && !self.is_expired(now)
    }
}
