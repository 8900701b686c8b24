/// In-memory agent wallet ledger
///
/// Holds wallets, per-token balances and payment channels behind one mutex.
/// Handlers never hold the lock across an await.
use alloy_primitives::U256;
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::types::*;

/// Balances every new wallet starts with: (chain, token, decimals)
pub const DEFAULT_ASSETS: &[(&str, &str, u8)] =
    &[("evm", "ETH", 18), ("evm", "USDC", 6), ("xrp", "XRP", 6)];

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Seed for address derivation; `None` makes wallet creation fail
    pub master_seed: Option<String>,
    /// Total requests served before every call answers 429
    pub rate_limit: Option<u64>,
    pub retry_after_secs: u64,
    /// Wallet reads before a new wallet turns active (0 = active at once)
    pub activation_polls: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            master_seed: Some("wallet-mock-master-seed".to_string()),
            rate_limit: None,
            retry_after_secs: 60,
            activation_polls: 0,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Wallet already exists: {0}")]
    WalletExists(String),

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Balance not found: {chain}/{token}")]
    BalanceNotFound { chain: String, token: String },

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Channel already closed: {0}")]
    ChannelClosed(String),

    #[error("Agent {agent_id} does not own channel {channel_id}")]
    NotOwner { agent_id: String, channel_id: String },

    #[error("master-seed not found")]
    MissingMasterSeed,

    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },
}

struct BalanceRecord {
    chain: String,
    token: String,
    amount: U256,
    decimals: u8,
    last_updated: DateTime<Utc>,
}

struct WalletRecord {
    agent_id: String,
    evm_address: String,
    xrp_address: String,
    derivation_index: u32,
    created_at: DateTime<Utc>,
    pending_polls: u32,
    balances: Vec<BalanceRecord>,
}

impl WalletRecord {
    fn status(&self) -> &'static str {
        if self.pending_polls > 0 {
            "pending"
        } else {
            "active"
        }
    }

    fn to_response(&self) -> WalletResponse {
        WalletResponse {
            agent_id: self.agent_id.clone(),
            evm_address: self.evm_address.clone(),
            xrp_address: self.xrp_address.clone(),
            derivation_index: self.derivation_index,
            created_at: timestamp(&self.created_at),
            status: self.status().to_string(),
        }
    }

    fn balance_mut(&mut self, chain: &str, token: &str) -> Result<&mut BalanceRecord, LedgerError> {
        self.balances
            .iter_mut()
            .find(|b| b.chain == chain && b.token == token)
            .ok_or_else(|| LedgerError::BalanceNotFound {
                chain: chain.to_string(),
                token: token.to_string(),
            })
    }
}

struct ChannelRecord {
    id: String,
    agent_id: String,
    peer_id: String,
    chain: String,
    token: String,
    balance: U256,
    initial_amount: U256,
    payments_count: u64,
    closed: bool,
}

impl ChannelRecord {
    fn to_response(&self) -> ChannelResponse {
        ChannelResponse {
            id: self.id.clone(),
            agent_id: self.agent_id.clone(),
            peer_id: self.peer_id.clone(),
            chain: self.chain.clone(),
            token: self.token.clone(),
            balance: self.balance.to_string(),
            initial_amount: self.initial_amount.to_string(),
            payments_count: self.payments_count,
            status: if self.closed { "closed" } else { "open" }.to_string(),
        }
    }
}

#[derive(Default)]
struct Ledger {
    wallets: HashMap<String, WalletRecord>,
    // Kept in open order so listings are stable
    channels: Vec<ChannelRecord>,
    next_index: u32,
    requests_served: u64,
}

impl Ledger {
    fn wallet_mut(&mut self, agent_id: &str) -> Result<&mut WalletRecord, LedgerError> {
        self.wallets
            .get_mut(agent_id)
            .ok_or_else(|| LedgerError::WalletNotFound(agent_id.to_string()))
    }

    fn owned_channel_mut(
        &mut self,
        channel_id: &str,
        agent_id: &str,
    ) -> Result<&mut ChannelRecord, LedgerError> {
        let channel = self
            .channels
            .iter_mut()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| LedgerError::ChannelNotFound(channel_id.to_string()))?;

        if channel.agent_id != agent_id {
            return Err(LedgerError::NotOwner {
                agent_id: agent_id.to_string(),
                channel_id: channel_id.to_string(),
            });
        }
        if channel.closed {
            return Err(LedgerError::ChannelClosed(channel_id.to_string()));
        }
        Ok(channel)
    }
}

pub struct ServiceState {
    settings: ServiceSettings,
    ledger: Mutex<Ledger>,
}

impl ServiceState {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            settings,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // Mutations validate before writing, so a poisoned ledger is still consistent
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count one request against the configured budget
    pub fn admit(&self) -> Result<(), LedgerError> {
        let mut ledger = self.ledger();
        ledger.requests_served += 1;
        match self.settings.rate_limit {
            Some(limit) if ledger.requests_served > limit => Err(LedgerError::RateLimited {
                retry_after_secs: self.settings.retry_after_secs,
            }),
            _ => Ok(()),
        }
    }

    pub fn create_wallet(&self, agent_id: &str) -> Result<WalletResponse, LedgerError> {
        if agent_id.trim().is_empty() {
            return Err(LedgerError::Invalid("agentId must not be empty".to_string()));
        }
        let seed = self
            .settings
            .master_seed
            .as_deref()
            .ok_or(LedgerError::MissingMasterSeed)?;

        let mut ledger = self.ledger();
        if ledger.wallets.contains_key(agent_id) {
            return Err(LedgerError::WalletExists(agent_id.to_string()));
        }

        let index = ledger.next_index;
        let (evm_address, xrp_address) = derive_addresses(seed, index);
        let now = Utc::now();

        let record = WalletRecord {
            agent_id: agent_id.to_string(),
            evm_address,
            xrp_address,
            derivation_index: index,
            created_at: now,
            pending_polls: self.settings.activation_polls,
            balances: DEFAULT_ASSETS
                .iter()
                .map(|(chain, token, decimals)| BalanceRecord {
                    chain: chain.to_string(),
                    token: token.to_string(),
                    amount: U256::ZERO,
                    decimals: *decimals,
                    last_updated: now,
                })
                .collect(),
        };

        let response = record.to_response();
        ledger.wallets.insert(agent_id.to_string(), record);
        ledger.next_index += 1;

        log::info!("Created wallet {} at index {}", agent_id, index);
        Ok(response)
    }

    /// Read a wallet; each read of a pending wallet counts toward activation
    pub fn get_wallet(&self, agent_id: &str) -> Result<WalletResponse, LedgerError> {
        let mut ledger = self.ledger();
        let wallet = ledger.wallet_mut(agent_id)?;
        if wallet.pending_polls > 0 {
            wallet.pending_polls -= 1;
            if wallet.pending_polls == 0 {
                log::info!("Wallet {} is now active", agent_id);
            }
        }
        Ok(wallet.to_response())
    }

    pub fn balances(&self, agent_id: &str) -> Result<Vec<BalanceEntry>, LedgerError> {
        let mut ledger = self.ledger();
        let wallet = ledger.wallet_mut(agent_id)?;
        Ok(wallet
            .balances
            .iter()
            .map(|b| BalanceEntry {
                agent_id: wallet.agent_id.clone(),
                chain: b.chain.clone(),
                token: b.token.clone(),
                balance: b.amount.to_string(),
                decimals: b.decimals,
                last_updated: timestamp(&b.last_updated),
            })
            .collect())
    }

    pub fn balance(&self, agent_id: &str, chain: &str, token: &str) -> Result<U256, LedgerError> {
        let mut ledger = self.ledger();
        let wallet = ledger.wallet_mut(agent_id)?;
        Ok(wallet.balance_mut(chain, token)?.amount)
    }

    /// Fund a wallet out of band, returning the new balance
    pub fn credit(
        &self,
        agent_id: &str,
        chain: &str,
        token: &str,
        amount: U256,
    ) -> Result<U256, LedgerError> {
        let mut ledger = self.ledger();
        let record = ledger.wallet_mut(agent_id)?.balance_mut(chain, token)?;
        record.amount = record
            .amount
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Invalid("balance overflow".to_string()))?;
        record.last_updated = Utc::now();
        Ok(record.amount)
    }

    pub fn open_channel(&self, req: &OpenChannelRequest) -> Result<String, LedgerError> {
        if req.agent_id.trim().is_empty() || req.peer_id.trim().is_empty() {
            return Err(LedgerError::Invalid(
                "agentId and peerId must not be empty".to_string(),
            ));
        }
        if req.agent_id == req.peer_id {
            return Err(LedgerError::Invalid(
                "cannot open a channel to self".to_string(),
            ));
        }
        let amount = positive_amount(&req.amount)?;

        let mut ledger = self.ledger();
        let record = ledger
            .wallet_mut(&req.agent_id)?
            .balance_mut(&req.chain, &req.token)?;
        if amount > record.amount {
            return Err(LedgerError::InsufficientFunds(format!(
                "wallet holds {} {}, channel needs {}",
                record.amount, req.token, amount
            )));
        }
        record.amount -= amount;
        record.last_updated = Utc::now();

        let id = format!("ch_{}", uuid::Uuid::new_v4().simple());
        ledger.channels.push(ChannelRecord {
            id: id.clone(),
            agent_id: req.agent_id.clone(),
            peer_id: req.peer_id.clone(),
            chain: req.chain.clone(),
            token: req.token.clone(),
            balance: amount,
            initial_amount: amount,
            payments_count: 0,
            closed: false,
        });

        log::info!(
            "Opened channel {} {} -> {} with {} {}",
            id,
            req.agent_id,
            req.peer_id,
            amount,
            req.token
        );
        Ok(id)
    }

    pub fn send_payment(
        &self,
        channel_id: &str,
        agent_id: &str,
        raw_amount: &str,
    ) -> Result<ChannelResponse, LedgerError> {
        let mut ledger = self.ledger();
        let channel = ledger.owned_channel_mut(channel_id, agent_id)?;
        let amount = positive_amount(raw_amount)?;

        if amount > channel.balance {
            return Err(LedgerError::InsufficientFunds(format!(
                "channel {} has {} remaining, payment is {}",
                channel_id, channel.balance, amount
            )));
        }

        channel.balance -= amount;
        channel.payments_count += 1;
        log::debug!(
            "Payment #{} of {} on {}",
            channel.payments_count,
            amount,
            channel_id
        );
        Ok(channel.to_response())
    }

    /// Settle the channel: spent funds go to the peer, the rest back to the owner
    pub fn close_channel(
        &self,
        channel_id: &str,
        agent_id: &str,
    ) -> Result<ChannelResponse, LedgerError> {
        let mut ledger = self.ledger();
        let channel = ledger.owned_channel_mut(channel_id, agent_id)?;
        channel.closed = true;

        let spent = channel.initial_amount - channel.balance;
        let refund = channel.balance;
        let response = channel.to_response();
        let (peer_id, chain, token) = (
            channel.peer_id.clone(),
            channel.chain.clone(),
            channel.token.clone(),
        );

        let now = Utc::now();
        let mut decimals = None;
        if let Ok(owner) = ledger.wallet_mut(agent_id) {
            if let Ok(record) = owner.balance_mut(&chain, &token) {
                record.amount = record.amount.saturating_add(refund);
                record.last_updated = now;
                decimals = Some(record.decimals);
            }
        }

        match ledger.wallet_mut(&peer_id) {
            Ok(peer) => match peer.balance_mut(&chain, &token) {
                Ok(record) => {
                    record.amount = record.amount.saturating_add(spent);
                    record.last_updated = now;
                }
                Err(_) => peer.balances.push(BalanceRecord {
                    chain,
                    token,
                    amount: spent,
                    decimals: decimals.unwrap_or(0),
                    last_updated: now,
                }),
            },
            Err(_) => log::debug!("Peer {} has no wallet, settlement stays off-ledger", peer_id),
        }

        log::info!(
            "Closed channel {}: {} to {}, {} refunded",
            channel_id,
            spent,
            peer_id,
            refund
        );
        Ok(response)
    }

    pub fn channels_for(&self, agent_id: &str) -> Result<Vec<ChannelResponse>, LedgerError> {
        let mut ledger = self.ledger();
        ledger.wallet_mut(agent_id)?;
        Ok(ledger
            .channels
            .iter()
            .filter(|c| c.agent_id == agent_id)
            .map(ChannelRecord::to_response)
            .collect())
    }

    pub fn channel(&self, channel_id: &str) -> Option<ChannelResponse> {
        self.ledger()
            .channels
            .iter()
            .find(|c| c.id == channel_id)
            .map(ChannelRecord::to_response)
    }
}

/// Derive (evm, xrp) display addresses from the seed and derivation index
fn derive_addresses(seed: &str, index: u32) -> (String, String) {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(index.to_be_bytes());
    let digest = hasher.finalize();
    (
        format!("0x{}", hex::encode(&digest[..20])),
        format!("r{}", hex::encode(&digest[12..])),
    )
}

/// Parse a non-negative decimal integer string.
///
/// Accepts exactly what `agent_wallet_client::parse_amount` accepts.
pub fn parse_amount(raw: &str) -> Result<U256, LedgerError> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::Invalid(format!(
            "amount must be a non-negative integer string, got '{}'",
            raw
        )));
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| LedgerError::Invalid(format!("amount '{}': {}", raw, e)))
}

fn positive_amount(raw: &str) -> Result<U256, LedgerError> {
    let amount = parse_amount(raw)?;
    if amount.is_zero() {
        return Err(LedgerError::Invalid("amount must be greater than zero".to_string()));
    }
    Ok(amount)
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
