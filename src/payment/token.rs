//! Token Issuer
//!
//! Produces the single-use confirmation credential mailed to the customer:
//! a UUIDv4 rendered without separators — 32 lowercase hex chars, URL-safe,
//! 122 bits of entropy, unpredictable from order id or creation time.
//! Uniqueness is entropy-based; the UNIQUE column on the token table is
//! defense in depth, not a retry loop.

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db::models::PaymentConfirmationToken;
use crate::db::repository::{RepoResult, token};

/// Token lifetime: 24 hours
pub const TOKEN_TTL_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Generate a fresh opaque token string
pub fn generate() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Loggable prefix — full tokens must never reach shared logs.
///
/// Truncates on a character boundary: the token arrives straight from the
/// query string and is not guaranteed to be ASCII.
pub fn prefix(token: &str) -> &str {
    match token.char_indices().nth(8) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}

/// Issue a token for `order_id` under the caller's transaction
pub async fn issue(
    conn: &mut SqliteConnection,
    order_id: i64,
    now: i64,
) -> RepoResult<PaymentConfirmationToken> {
    let value = generate();
    token::insert(conn, order_id, &value, now, now + TOKEN_TTL_MILLIS).await
}
