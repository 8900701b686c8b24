//! Agent wallet API request/response types

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{self, format_balance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Pending,
    Active,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

/// Agent wallet as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub agent_id: String,
    pub evm_address: String,
    pub xrp_address: String,
    pub derivation_index: u32,
    pub created_at: DateTime<Utc>,
    pub status: WalletStatus,
}

impl Wallet {
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }
}

/// Balance of one token on one chain, in the token's smallest unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub agent_id: String,
    pub chain: String,
    pub token: String,
    #[serde(with = "amount::decimal")]
    pub balance: U256,
    pub decimals: u8,
    pub last_updated: DateTime<Utc>,
}

impl Balance {
    /// Human-readable amount, e.g. `"1000.000000"` for 1000 USDC
    pub fn formatted(&self) -> String {
        format_balance(self.balance, self.decimals)
    }
}

/// Payment channel owned by `agent_id` and paying `peer_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub agent_id: String,
    pub peer_id: String,
    pub chain: String,
    pub token: String,
    #[serde(with = "amount::decimal")]
    pub balance: U256,
    #[serde(with = "amount::decimal")]
    pub initial_amount: U256,
    pub payments_count: u64,
    pub status: ChannelStatus,
}

impl Channel {
    pub fn is_open(&self) -> bool {
        self.status == ChannelStatus::Open
    }

    /// Total paid out of the channel so far
    pub fn amount_spent(&self) -> U256 {
        self.initial_amount.saturating_sub(self.balance)
    }
}

// Request bodies

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateWalletRequest<'a> {
    pub agent_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OpenChannelRequest<'a> {
    pub agent_id: &'a str,
    pub peer_id: &'a str,
    pub chain: &'a str,
    pub token: &'a str,
    #[serde(with = "amount::decimal")]
    pub amount: U256,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendPaymentRequest<'a> {
    pub agent_id: &'a str,
    #[serde(with = "amount::decimal")]
    pub amount: U256,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CloseChannelRequest<'a> {
    pub agent_id: &'a str,
}

// Response bodies

#[derive(Debug, Deserialize)]
pub(crate) struct BalancesResponse {
    pub balances: Vec<Balance>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalanceResponse {
    #[serde(with = "amount::decimal")]
    pub balance: U256,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OpenChannelResponse {
    pub channel_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelsResponse {
    pub channels: Vec<Channel>,
}

/// Result of creating several wallets in sequence
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<Wallet>,
    /// Agent ids that already had a wallet
    pub skipped: Vec<String>,
}
