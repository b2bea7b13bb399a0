//! Address Repository
//!
//! Addresses are content-addressed by their full field tuple. Comparison
//! is exact (no normalization); `complement` uses a NULL-safe match.

use super::{RepoError, RepoResult};
use crate::db::models::{Address, AddressInput};
use crate::utils::{now_millis, snowflake_id};
use sqlx::SqliteConnection;

/// Find an address with an identical field tuple, or insert a new row.
/// Returns the address id.
pub async fn find_or_create(conn: &mut SqliteConnection, input: &AddressInput) -> RepoResult<i64> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM address \
         WHERE zip_code = ?1 AND street = ?2 AND number = ?3 AND complement IS ?4 \
           AND neighborhood = ?5 AND city = ?6 AND state = ?7",
    )
    .bind(&input.zip_code)
    .bind(&input.street)
    .bind(&input.number)
    .bind(&input.complement)
    .bind(&input.neighborhood)
    .bind(&input.city)
    .bind(&input.state)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO address (id, zip_code, street, number, complement, neighborhood, city, \
                              state, country, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'Brasil', ?9, ?9)",
    )
    .bind(id)
    .bind(&input.zip_code)
    .bind(&input.street)
    .bind(&input.number)
    .bind(&input.complement)
    .bind(&input.neighborhood)
    .bind(&input.city)
    .bind(&input.state)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(id)
}

/// Associate an address with a customer for future reuse.
///
/// Idempotent: the UNIQUE(customer_id, address_id) constraint turns a
/// repeat association into a no-op.
pub async fn link_customer(
    conn: &mut SqliteConnection,
    customer_id: i64,
    address_id: i64,
) -> RepoResult<()> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT OR IGNORE INTO customer_address (id, customer_id, address_id, is_default, created_at) \
         VALUES (?1, ?2, ?3, 0, ?4)",
    )
    .bind(id)
    .bind(customer_id)
    .bind(address_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Fetch a full address row
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Address> {
    let row = sqlx::query_as::<_, Address>(
        "SELECT id, zip_code, street, number, complement, neighborhood, city, state, country, \
                created_at, updated_at \
         FROM address WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.ok_or_else(|| RepoError::NotFound(format!("Address {id} not found")))
}
