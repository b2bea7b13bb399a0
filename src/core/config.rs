/// Server configuration.
///
/// Every item can be overridden through environment variables:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP service port |
/// | BASE_URL | http://localhost:3000 | Public URL used in confirmation links |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | EMAIL_API_URL | (empty) | Transactional email provider endpoint |
/// | EMAIL_API_KEY | (empty) | Provider API key |
/// | EMAIL_SENDER_NAME | Mercado | From display name |
/// | EMAIL_SENDER_ADDRESS | pedidos@mercado.example.com | From address |
///
/// When `EMAIL_API_URL` is empty the server falls back to the noop sender,
/// which logs instead of delivering. Production refuses to start that way.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and log files
    pub work_dir: String,
    /// HTTP API service port
    pub http_port: u16,
    /// Public base URL embedded in confirmation links
    pub base_url: String,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Transactional email provider endpoint (empty = noop sender)
    pub email_api_url: String,
    /// Provider API key
    pub email_api_key: String,
    /// Sender display name
    pub email_sender_name: String,
    /// Sender address
    pub email_sender_address: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults when unset.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            email_api_url: std::env::var("EMAIL_API_URL").unwrap_or_default(),
            email_api_key: std::env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_sender_name: std::env::var("EMAIL_SENDER_NAME")
                .unwrap_or_else(|_| "Mercado".into()),
            email_sender_address: std::env::var("EMAIL_SENDER_ADDRESS")
                .unwrap_or_else(|_| "pedidos@mercado.example.com".into()),
        }
    }

    /// Override the filesystem and network bits; used by tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
