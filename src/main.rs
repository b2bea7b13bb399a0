use mercado_server::utils::logger;
use mercado_server::{Config, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    // Development logs to stderr; staging and production roll daily files.
    if config.is_development() {
        logger::init_logger();
    } else {
        let log_dir = format!("{}/logs", config.work_dir);
        std::fs::create_dir_all(&log_dir)?;
        logger::init_logger_with_file(Some("info"), Some(&log_dir));
    }

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "Starting mercado server"
    );

    Server::new(config).run().await?;
    Ok(())
}
