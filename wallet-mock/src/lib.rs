/// Agent Wallet Mock Server Library
///
/// This crate provides both a standalone binary and library components
/// for an in-memory stand-in of the agent wallet HTTP API.
/// Designed for integration tests and local development.
pub mod handlers;
pub mod server;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use server::{create_router, run_server, spawn_background, BackgroundServer, API_PREFIX};
pub use state::{LedgerError, ServiceSettings, ServiceState, DEFAULT_ASSETS};
pub use types::*;

pub use alloy_primitives::U256;
