//! Error Classification Integration Tests
//!
//! Checks that rate limits, server faults, timeouts, connection failures
//! and malformed bodies each surface as their own error variant, with the
//! server's diagnostic text preserved.
//!
//! Run with: cargo test --test error_handling_test -- --nocapture

mod common;

use agent_wallet_client::{AgentWalletClient, AgentWalletError, ClientConfig};
use common::{init_logging, serve_raw_once, TestEnvironment};
use std::net::TcpListener;
use std::time::{Duration, Instant};
use wallet_mock::ServiceSettings;

#[test]
fn test_rate_limit_carries_retry_after() -> anyhow::Result<()> {
    let env = TestEnvironment::with_settings(ServiceSettings {
        rate_limit: Some(1),
        retry_after_secs: 30,
        ..Default::default()
    })?;

    env.client.create_wallet("agent-001")?;
    let err = env.client.create_wallet("agent-002").unwrap_err();

    match &err {
        AgentWalletError::RateLimited {
            retry_after,
            message,
        } => {
            assert_eq!(*retry_after, Some(Duration::from_secs(30)));
            assert!(message.contains("Rate limit"), "message: {message}");
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));

    Ok(())
}

#[test]
fn test_missing_master_seed_is_server_fault() -> anyhow::Result<()> {
    let env = TestEnvironment::with_settings(ServiceSettings {
        master_seed: None,
        ..Default::default()
    })?;

    let err = env.client.create_wallet("agent-error-001").unwrap_err();

    assert!(
        matches!(err, AgentWalletError::ServerFault { status: 500, .. }),
        "expected server fault, got {err:?}"
    );
    assert!(err.is_missing_master_seed());
    assert_eq!(err.server_message(), Some("master-seed not found"));
    assert!(!err.is_retryable());

    // get_or_create only recovers from conflicts
    assert!(env
        .client
        .get_or_create_wallet("agent-error-001")
        .unwrap_err()
        .is_missing_master_seed());

    Ok(())
}

#[test]
fn test_batch_stops_on_non_conflict_failure() -> anyhow::Result<()> {
    let env = TestEnvironment::with_settings(ServiceSettings {
        rate_limit: Some(2),
        ..Default::default()
    })?;

    let err = env
        .client
        .create_wallets(&["b-1", "b-2", "b-3", "b-4"])
        .unwrap_err();
    assert!(matches!(err, AgentWalletError::RateLimited { .. }));
    assert!(env.server.state().get_wallet("b-4").is_err());

    Ok(())
}

#[test]
fn test_silent_server_times_out() -> anyhow::Result<()> {
    init_logging();

    // Accepts connections via the backlog but never answers
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;

    let timeout = Duration::from_millis(300);
    let client = AgentWalletClient::new(
        ClientConfig::new(format!("http://{}/api/v1", addr)).with_timeout(timeout),
    )?;

    let started = Instant::now();
    let err = client.get_wallet("agent-001").unwrap_err();

    match err {
        AgentWalletError::Timeout { timeout: reported } => assert_eq!(reported, timeout),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(5));

    drop(listener);
    Ok(())
}

#[test]
fn test_refused_connection_is_transport_error() -> anyhow::Result<()> {
    init_logging();

    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?
    };
    let client = AgentWalletClient::new(ClientConfig::new(format!("http://{}/api/v1", addr)))?;

    let err = client.get_all_balances("agent-001").unwrap_err();
    assert!(
        matches!(err, AgentWalletError::Transport(_)),
        "expected transport error, got {err:?}"
    );
    assert!(err.is_retryable());
    assert_eq!(err.status(), None);

    Ok(())
}

#[test]
fn test_unexpected_body_is_decode_error() -> anyhow::Result<()> {
    init_logging();

    let base_url = serve_raw_once("200 OK", "application/json", r#"{"unexpected":true}"#)?;
    let client = AgentWalletClient::new(ClientConfig::new(base_url))?;

    match client.get_wallet("agent-001") {
        Err(AgentWalletError::Decode { operation, .. }) => assert_eq!(operation, "get_wallet"),
        other => panic!("expected decode error, got {other:?}"),
    }

    Ok(())
}

#[test]
fn test_plain_text_fault_message_is_preserved() -> anyhow::Result<()> {
    init_logging();

    let base_url = serve_raw_once(
        "503 Service Unavailable",
        "text/plain",
        "upstream XRP node unreachable",
    )?;
    let client = AgentWalletClient::new(ClientConfig::new(base_url))?;

    match client.get_balance("agent-001", "xrp", "XRP") {
        Err(AgentWalletError::ServerFault { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream XRP node unreachable");
        }
        other => panic!("expected server fault, got {other:?}"),
    }

    Ok(())
}

#[test]
fn test_wide_integer_balance_keeps_precision() -> anyhow::Result<()> {
    init_logging();

    let base_url = serve_raw_once(
        "200 OK",
        "application/json",
        r#"{"balance":50000000000000000000000}"#,
    )?;
    let client = AgentWalletClient::new(ClientConfig::new(base_url))?;

    let balance = client.get_balance("agent-001", "evm", "ETH")?;
    assert_eq!(balance.to_string(), "50000000000000000000000");
    assert_eq!(
        agent_wallet_client::format_balance(balance, 18),
        "50000.000000000000000000"
    );

    Ok(())
}

#[test]
fn test_mock_and_client_agree_on_wire_contract() {
    assert_eq!(
        wallet_mock::handlers::INSUFFICIENT_FUNDS_CODE,
        agent_wallet_client::error::INSUFFICIENT_FUNDS_CODE
    );

    for raw in ["0", "42", " 7 ", "123456789012345678901234", "", "-5", "1.5", "+3", "0x10", "12a"] {
        let client = agent_wallet_client::parse_amount(raw).ok();
        let mock = wallet_mock::state::parse_amount(raw).ok();
        assert_eq!(client, mock, "amount '{}' parsed differently", raw);
    }
}
