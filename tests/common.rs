//! Common test utilities for agent wallet client integration tests
//!
//! This module provides shared test infrastructure including:
//! - An in-memory wallet service on an ephemeral port (stopped on drop)
//! - A client pointed at it
//! - Out-of-band wallet funding
//! - A one-shot raw HTTP responder for malformed-response cases
#![allow(dead_code)]

use agent_wallet_client::{AgentWalletClient, ClientConfig, U256};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;
use wallet_mock::{spawn_background, BackgroundServer, ServiceSettings};

/// Test environment with automatic shutdown
pub struct TestEnvironment {
    // Declared first so the client's pool is released before the server stops
    pub client: AgentWalletClient,
    pub server: BackgroundServer,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_settings(ServiceSettings::default())
    }

    pub fn with_settings(settings: ServiceSettings) -> anyhow::Result<Self> {
        init_logging();

        let server = spawn_background(settings)?;
        log::info!("Mock wallet service: {}", server.base_url());

        let client = AgentWalletClient::new(
            ClientConfig::new(server.base_url()).with_timeout(Duration::from_secs(5)),
        )?;

        Ok(Self { client, server })
    }

    /// Credit `amount` to the agent's wallet directly in the service ledger
    pub fn fund(&self, agent_id: &str, chain: &str, token: &str, amount: U256) -> anyhow::Result<U256> {
        Ok(self.server.state().credit(agent_id, chain, token, amount)?)
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn usdc(whole: u64) -> U256 {
    U256::from(whole) * U256::from(1_000_000u64)
}

/// Serve exactly one canned HTTP response on an ephemeral port.
///
/// Returns the base URL to point a client at.
pub fn serve_raw_once(status_line: &str, content_type: &str, body: &str) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        content_type,
        body.len(),
        body
    );

    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    Ok(format!("http://{}/api/v1", addr))
}
