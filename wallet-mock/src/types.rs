/// Agent wallet API request and response types
///
/// These types match the service's camelCase JSON so any client of the real
/// API can run against the mock unchanged. Amounts are decimal strings.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub agent_id: String,
}

/// Wallet response from POST /wallets and GET /wallets/{agentId}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub agent_id: String,
    pub evm_address: String,
    pub xrp_address: String,
    pub derivation_index: u32,
    pub created_at: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub agent_id: String,
    pub chain: String,
    pub token: String,
    pub balance: String,
    pub decimals: u8,
    pub last_updated: String,
}

/// Response from GET /wallets/{agentId}/balances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesResponse {
    pub balances: Vec<BalanceEntry>,
}

/// Response from GET /wallets/{agentId}/balances/{chain}/{token}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenChannelRequest {
    pub agent_id: String,
    pub peer_id: String,
    pub chain: String,
    pub token: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenChannelResponse {
    pub channel_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPaymentRequest {
    pub agent_id: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseChannelRequest {
    pub agent_id: String,
}

/// Acknowledgement for payments and channel closes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    pub success: bool,
    pub channel_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub id: String,
    pub agent_id: String,
    pub peer_id: String,
    pub chain: String,
    pub token: String,
    pub balance: String,
    pub initial_amount: String,
    pub payments_count: u64,
    pub status: String,
}

/// Response from GET /wallets/{agentId}/channels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsResponse {
    pub channels: Vec<ChannelResponse>,
}

/// Error body for every non-success response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Body of the development-only funding endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CreditRequest {
    pub chain: String,
    pub token: String,
    pub amount: String,
}
