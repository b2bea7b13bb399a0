use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::checkout::CheckoutService;
use crate::core::Config;
use crate::db::DbService;
use crate::payment::ConfirmationService;
use crate::services::email::{EmailSender, HttpEmailService, NoopEmailService};

/// Shared application state; `Clone` is cheap (pool and mailer are
/// reference-counted).
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub mailer: Arc<dyn EmailSender>,
}

impl ServerState {
    pub fn new(config: Config, pool: SqlitePool, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            config,
            pool,
            mailer,
        }
    }

    /// Initialize state: working directory, database (with migrations),
    /// email sender.
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        let work_dir = PathBuf::from(&config.work_dir);
        std::fs::create_dir_all(&work_dir)?;

        let db_path = work_dir.join("mercado.db");
        let db = DbService::new(&db_path.to_string_lossy()).await?;

        let mailer: Arc<dyn EmailSender> = if config.email_api_url.is_empty() {
            if config.is_production() {
                anyhow::bail!("EMAIL_API_URL must be set in production");
            }
            tracing::warn!("EMAIL_API_URL not set; confirmation emails will only be logged");
            Arc::new(NoopEmailService)
        } else {
            Arc::new(HttpEmailService::new(
                config.email_api_url.clone(),
                config.email_api_key.clone(),
                config.email_sender_name.clone(),
                config.email_sender_address.clone(),
            ))
        };

        Ok(Self::new(config.clone(), db.pool, mailer))
    }

    pub fn checkout_service(&self) -> CheckoutService {
        CheckoutService::new(
            self.pool.clone(),
            self.mailer.clone(),
            self.config.base_url.clone(),
        )
    }

    pub fn confirmation_service(&self) -> ConfirmationService {
        ConfirmationService::new(self.pool.clone())
    }
}
