/// Agent Wallet Mock Server
///
/// A lightweight in-memory stand-in for the agent wallet HTTP API.
/// Designed for client development and integration testing.
use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use wallet_mock::{run_server, ServiceSettings, ServiceState};

#[derive(Debug)]
struct Config {
    settings: ServiceSettings,

    // Server
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let defaults = ServiceSettings::default();

        let master_seed = env::var("MASTER_SEED").ok().filter(|s| !s.is_empty());

        let rate_limit = match env::var("RATE_LIMIT") {
            Ok(raw) => Some(raw.parse().context("Invalid RATE_LIMIT")?),
            Err(_) => None,
        };

        let retry_after_secs = match env::var("RETRY_AFTER_SECS") {
            Ok(raw) => raw.parse().context("Invalid RETRY_AFTER_SECS")?,
            Err(_) => defaults.retry_after_secs,
        };

        let activation_polls = match env::var("ACTIVATION_POLLS") {
            Ok(raw) => raw.parse().context("Invalid ACTIVATION_POLLS")?,
            Err(_) => defaults.activation_polls,
        };

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        Ok(Self {
            settings: ServiceSettings {
                master_seed,
                rate_limit,
                retry_after_secs,
                activation_polls,
            },
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting agent wallet mock server...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    log::info!(
        "Server will listen on {}:{}",
        config.server_host,
        config.server_port
    );

    let state = Arc::new(ServiceState::new(config.settings));

    // Run server
    run_server(state, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
