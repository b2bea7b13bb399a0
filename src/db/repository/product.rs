//! Product Repository — the stock ledger
//!
//! The order core consumes exactly this contract from the catalog: read a
//! product's available quantity, decrement it (failing loudly rather than
//! clamping), and flip the status to OUT_OF_STOCK when it reaches zero.

use super::{RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate, ProductStatus};
use crate::utils::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const PRODUCT_SELECT: &str =
    "SELECT id, store_id, name, price, stock, status, created_at, updated_at FROM product";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO product (id, store_id, name, price, stock, status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
    )
    .bind(id)
    .bind(data.store_id)
    .bind(&data.name)
    .bind(data.price)
    .bind(data.stock)
    .bind(ProductStatus::Active)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Update the catalog price (catalog-owned; order snapshots are immune)
pub async fn update_price(pool: &SqlitePool, id: i64, price: f64) -> RepoResult<()> {
    let now = now_millis();
    let rows = sqlx::query("UPDATE product SET price = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(price)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    Ok(())
}

/// Current available quantity
pub async fn get_stock(conn: &mut SqliteConnection, id: i64) -> RepoResult<i64> {
    let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM product WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;
    Ok(stock)
}

/// Decrement stock by `quantity`, returning the new quantity.
///
/// The guard `stock >= quantity` makes an underflow fail loudly instead of
/// clamping; callers pre-validate, so hitting it means a racing writer won.
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
) -> RepoResult<i64> {
    let now = now_millis();
    let new_stock = sqlx::query_scalar::<_, i64>(
        "UPDATE product SET stock = stock - ?2, updated_at = ?3 \
         WHERE id = ?1 AND stock >= ?2 RETURNING stock",
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| {
        RepoError::Validation(format!(
            "Stock decrement of {quantity} would underflow for product {id}"
        ))
    })?;
    Ok(new_stock)
}

/// Mark a product as out of stock (called when its quantity reaches zero)
pub async fn set_out_of_stock(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query("UPDATE product SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(ProductStatus::OutOfStock)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
