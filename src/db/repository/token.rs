//! Payment Confirmation Token Repository
//!
//! Tokens are inserted once per checkout attempt and mutated exactly once
//! (marked used). Rows are never deleted.

use super::{RepoError, RepoResult};
use crate::db::models::PaymentConfirmationToken;
use crate::utils::snowflake_id;
use sqlx::SqliteConnection;

const TOKEN_SELECT: &str = "SELECT id, order_id, token, created_at, expires_at, used, used_at \
    FROM payment_confirmation_token";

/// Insert a freshly issued token row
pub async fn insert(
    conn: &mut SqliteConnection,
    order_id: i64,
    token: &str,
    created_at: i64,
    expires_at: i64,
) -> RepoResult<PaymentConfirmationToken> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO payment_confirmation_token (id, order_id, token, created_at, expires_at, used) \
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
    )
    .bind(id)
    .bind(order_id)
    .bind(token)
    .bind(created_at)
    .bind(expires_at)
    .execute(&mut *conn)
    .await?;

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create confirmation token".into()))
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<PaymentConfirmationToken>> {
    let sql = format!("{TOKEN_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, PaymentConfirmationToken>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_by_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> RepoResult<Option<PaymentConfirmationToken>> {
    let sql = format!("{TOKEN_SELECT} WHERE token = ?");
    let row = sqlx::query_as::<_, PaymentConfirmationToken>(&sql)
        .bind(token)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Consume the token.
///
/// Conditional on `used = 0`: of two racing confirmations only one sees
/// a row affected; the loser must report the token as already used.
pub async fn mark_used(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE payment_confirmation_token SET used = 1, used_at = ?1 \
         WHERE id = ?2 AND used = 0",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}
