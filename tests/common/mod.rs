//! Shared test fixtures: a throwaway on-disk SQLite store plus seeding
//! helpers.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlx::SqlitePool;
use tempfile::TempDir;

use mercado_server::checkout::{CheckoutRequest, CheckoutService};
use mercado_server::db::DbService;
use mercado_server::db::models::{AddressInput, PaymentMethod, ProductCreate};
use mercado_server::db::repository;
use mercado_server::payment::ConfirmationService;
use mercado_server::services::email::EmailSender;

pub struct TestStore {
    // Dropping the TempDir deletes the database file
    _dir: TempDir,
    pub pool: SqlitePool,
}

pub async fn store() -> TestStore {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("test.db");
    let db = DbService::new(&db_path.to_string_lossy())
        .await
        .expect("database");
    TestStore {
        _dir: dir,
        pool: db.pool,
    }
}

/// Counts sends and optionally fails them, so tests can assert the
/// email path without a network.
pub struct RecordingMailer {
    pub sent: AtomicUsize,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("smtp relay unavailable");
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn checkout_service(pool: &SqlitePool, mailer: Arc<RecordingMailer>) -> CheckoutService {
    CheckoutService::new(
        pool.clone(),
        mailer,
        "http://localhost:3000".to_string(),
    )
}

pub fn confirmation_service(pool: &SqlitePool) -> ConfirmationService {
    ConfirmationService::new(pool.clone())
}

pub async fn seed_product(pool: &SqlitePool, name: &str, price: f64, stock: i64) -> i64 {
    repository::product::create(
        pool,
        ProductCreate {
            store_id: None,
            name: name.to_string(),
            price,
            stock,
        },
    )
    .await
    .expect("seed product")
    .id
}

pub fn sample_address() -> AddressInput {
    AddressInput {
        zip_code: "01310-100".into(),
        street: "Avenida Paulista".into(),
        number: "1000".into(),
        complement: None,
        neighborhood: "Bela Vista".into(),
        city: "São Paulo".into(),
        state: "SP".into(),
    }
}

pub fn checkout_request(customer_id: i64) -> CheckoutRequest {
    CheckoutRequest {
        customer_id,
        full_name: "Maria Silva".into(),
        email: "maria@example.com".into(),
        address: sample_address(),
        save_address: false,
        payment_method: PaymentMethod::Pix,
        card_number: None,
        card_holder_name: None,
        card_expiry: None,
        card_cvv: None,
        shipping_cost: 0.0,
        discount: 0.0,
    }
}

/// The single-use token issued for an order (test-side shortcut)
pub async fn token_for_order(pool: &SqlitePool, order_id: i64) -> String {
    sqlx::query_scalar::<_, String>(
        "SELECT token FROM payment_confirmation_token WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_one(pool)
    .await
    .expect("token row")
}

pub async fn product_stock(pool: &SqlitePool, product_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT stock FROM product WHERE id = ?")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("stock")
}
