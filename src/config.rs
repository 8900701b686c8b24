//! Client configuration from environment variables
//!
//! Controls the agent wallet API base URL and the per-request timeout.
//! Defaults target a local development server.

use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API base URL, including any path prefix (e.g. `/api/v1`)
    pub base_url: String,
    /// Bound applied uniformly to every request
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `AGENT_WALLET_API_URL`: API base URL (default `http://localhost:3000/api/v1`)
    /// - `AGENT_WALLET_API_TIMEOUT_SECS`: request timeout in seconds (default 30)
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let base_url =
            env::var("AGENT_WALLET_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        log::info!("Agent wallet API URL: {}", base_url);

        let timeout = match env::var("AGENT_WALLET_API_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw).unwrap_or_else(|| {
                log::warn!(
                    "Invalid AGENT_WALLET_API_TIMEOUT_SECS '{}', using {}s",
                    raw,
                    DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }),
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Self { base_url, timeout }
    }
}

fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
