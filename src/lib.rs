//! Agent Wallet Client: blocking HTTP client for agent-owned wallets
//!
//! Wallet derivation, balance tracking and payment channel settlement all
//! live in the remote agent wallet service. This crate maps each operation
//! to one REST call, decodes the JSON body into typed records and classifies
//! failures so callers can pick their own retry policy.
//!
//! # Architecture
//!
//! - **AgentWalletClient**: one reusable connection pool, one request per call
//! - **Types**: `Wallet`, `Balance`, `Channel` as read-only snapshots
//! - **Amounts**: `U256` in the token's smallest unit, decimal strings on the wire
//!
//! # Example
//!
//! ```ignore
//! use agent_wallet_client::{format_balance, AgentWalletClient, ClientConfig};
//!
//! let client = AgentWalletClient::new(ClientConfig::from_env())?;
//! for balance in client.get_all_balances("agent-001")? {
//!     println!("{} {}: {}", balance.chain, balance.token, balance.formatted());
//! }
//! ```

pub mod amount;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use amount::{format_balance, parse_amount};
pub use client::AgentWalletClient;
pub use config::ClientConfig;
pub use error::AgentWalletError;
pub use types::{BatchOutcome, Balance, Channel, ChannelStatus, Wallet, WalletStatus};

pub use alloy_primitives::U256;

// Common result type
pub type Result<T> = std::result::Result<T, AgentWalletError>;
