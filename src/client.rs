use alloy_primitives::U256;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::RETRY_AFTER;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::AgentWalletError;
use crate::types::*;
use crate::Result;

/// Blocking client for the agent wallet HTTP API.
///
/// Each method issues exactly one request (the convenience helpers compose
/// them) and blocks until a response arrives or the configured timeout
/// elapses. The underlying connection pool is created once per client and
/// released when the client is dropped.
///
/// # Example
///
/// ```ignore
/// use agent_wallet_client::{AgentWalletClient, ClientConfig, U256};
///
/// let client = AgentWalletClient::new(ClientConfig::from_env())?;
/// let wallet = client.get_or_create_wallet("agent-001")?;
/// let channel_id = client.open_channel(
///     &wallet.agent_id,
///     "agent-002",
///     "evm",
///     "USDC",
///     U256::from(1_000_000_000u64),
/// )?;
/// client.send_payment(&wallet.agent_id, &channel_id, U256::from(10_000_000u64))?;
/// client.close_channel(&wallet.agent_id, &channel_id)?;
/// ```
pub struct AgentWalletClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl AgentWalletClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AgentWalletError::config(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(AgentWalletError::config(format!(
                "base URL must be an http(s) URL, got '{}'",
                config.base_url
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentWalletError::config(format!("failed to build HTTP client: {}", e)))?;

        log::debug!(
            "Agent wallet client for {} (timeout {:?})",
            base_url,
            config.timeout
        );

        Ok(Self {
            http,
            base_url,
            timeout: config.timeout,
        })
    }

    /// Build a client from `AGENT_WALLET_API_URL` / `AGENT_WALLET_API_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    /// Create a wallet for `agent_id`.
    ///
    /// Fails with [`AgentWalletError::Conflict`] if the agent already has one.
    pub fn create_wallet(&self, agent_id: &str) -> Result<Wallet> {
        let url = self.endpoint(&["wallets"])?;
        let body = self.execute(
            "create_wallet",
            self.http
                .post(url)
                .json(&CreateWalletRequest { agent_id }),
        )?;
        let wallet: Wallet = decode("create_wallet", &body)?;
        log::info!(
            "Created wallet for {} (index {}, {:?})",
            wallet.agent_id,
            wallet.derivation_index,
            wallet.status
        );
        Ok(wallet)
    }

    /// Fetch the wallet for `agent_id`, or `None` if the service has none.
    pub fn get_wallet(&self, agent_id: &str) -> Result<Option<Wallet>> {
        let url = self.endpoint(&["wallets", agent_id])?;
        match self.execute("get_wallet", self.http.get(url)) {
            Ok(body) => decode("get_wallet", &body).map(Some),
            Err(e) if e.is_not_found() => {
                log::debug!("No wallet for {}", agent_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create the wallet, or fetch it if it already exists.
    pub fn get_or_create_wallet(&self, agent_id: &str) -> Result<Wallet> {
        match self.create_wallet(agent_id) {
            Ok(wallet) => Ok(wallet),
            Err(e) if e.is_conflict() => {
                log::info!("Wallet for {} already exists, fetching it", agent_id);
                self.get_wallet(agent_id)?
                    .ok_or_else(|| AgentWalletError::NotFound {
                        message: format!("wallet for {} reported as existing but not found", agent_id),
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Create wallets one after another, skipping agents that already have one.
    ///
    /// Any failure other than a conflict stops the batch.
    pub fn create_wallets<S: AsRef<str>>(&self, agent_ids: &[S]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for agent_id in agent_ids {
            let agent_id = agent_id.as_ref();
            match self.create_wallet(agent_id) {
                Ok(wallet) => outcome.created.push(wallet),
                Err(e) if e.is_conflict() => {
                    log::debug!("Skipping {}: {}", agent_id, e);
                    outcome.skipped.push(agent_id.to_string());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }

    /// Poll until the wallet leaves the pending state
    pub fn wait_for_active(
        &self,
        agent_id: &str,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Result<Wallet> {
        for attempt in 1..=max_attempts {
            let wallet = self
                .get_wallet(agent_id)?
                .ok_or_else(|| AgentWalletError::NotFound {
                    message: format!("wallet for {} not found", agent_id),
                })?;

            if wallet.is_active() {
                return Ok(wallet);
            }

            log::debug!(
                "Wallet {} is {:?} (attempt {}/{})",
                agent_id,
                wallet.status,
                attempt,
                max_attempts
            );
            if attempt < max_attempts {
                std::thread::sleep(poll_interval);
            }
        }

        Err(AgentWalletError::NotActivated {
            agent_id: agent_id.to_string(),
            attempts: max_attempts,
        })
    }

    // ------------------------------------------------------------------
    // Balances
    // ------------------------------------------------------------------

    /// All balances of the agent, in service order
    pub fn get_all_balances(&self, agent_id: &str) -> Result<Vec<Balance>> {
        let url = self.endpoint(&["wallets", agent_id, "balances"])?;
        let body = self.execute("get_all_balances", self.http.get(url))?;
        let response: BalancesResponse = decode("get_all_balances", &body)?;
        Ok(response.balances)
    }

    /// Unscaled balance of one token on one chain
    pub fn get_balance(&self, agent_id: &str, chain: &str, token: &str) -> Result<U256> {
        let url = self.endpoint(&["wallets", agent_id, "balances", chain, token])?;
        let body = self.execute("get_balance", self.http.get(url))?;
        let response: BalanceResponse = decode("get_balance", &body)?;
        Ok(response.balance)
    }

    // ------------------------------------------------------------------
    // Payment channels
    // ------------------------------------------------------------------

    /// Open a channel funded with `amount` and return its id
    pub fn open_channel(
        &self,
        agent_id: &str,
        peer_id: &str,
        chain: &str,
        token: &str,
        amount: U256,
    ) -> Result<String> {
        let url = self.endpoint(&["channels"])?;
        let request = OpenChannelRequest {
            agent_id,
            peer_id,
            chain,
            token,
            amount,
        };
        let body = self.execute("open_channel", self.http.post(url).json(&request))?;
        let response: OpenChannelResponse = decode("open_channel", &body)?;
        log::info!(
            "Opened channel {} from {} to {} ({} {} on {})",
            response.channel_id,
            agent_id,
            peer_id,
            amount,
            token,
            chain
        );
        Ok(response.channel_id)
    }

    /// Pay `amount` out of the channel.
    ///
    /// Fails with [`AgentWalletError::InsufficientFunds`] when the channel
    /// balance is too low; the channel is left unchanged in that case.
    pub fn send_payment(&self, agent_id: &str, channel_id: &str, amount: U256) -> Result<()> {
        let url = self.endpoint(&["channels", channel_id, "payments"])?;
        self.execute(
            "send_payment",
            self.http
                .post(url)
                .json(&SendPaymentRequest { agent_id, amount }),
        )?;
        log::debug!("Sent {} through channel {}", amount, channel_id);
        Ok(())
    }

    /// Close and settle the channel.
    ///
    /// Closing an already closed channel fails with a conflict.
    pub fn close_channel(&self, agent_id: &str, channel_id: &str) -> Result<()> {
        let url = self.endpoint(&["channels", channel_id])?;
        self.execute(
            "close_channel",
            self.http
                .delete(url)
                .json(&CloseChannelRequest { agent_id }),
        )?;
        log::info!("Closed channel {}", channel_id);
        Ok(())
    }

    /// Channels owned by the agent, in service order
    pub fn get_agent_channels(&self, agent_id: &str) -> Result<Vec<Channel>> {
        let url = self.endpoint(&["wallets", agent_id, "channels"])?;
        let body = self.execute("get_agent_channels", self.http.get(url))?;
        let response: ChannelsResponse = decode("get_agent_channels", &body)?;
        Ok(response.channels)
    }

    pub fn find_channel(&self, agent_id: &str, channel_id: &str) -> Result<Option<Channel>> {
        Ok(self
            .get_agent_channels(agent_id)?
            .into_iter()
            .find(|c| c.id == channel_id))
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Append percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AgentWalletError::config("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send the request and return the body of a successful response
    fn execute(&self, operation: &'static str, request: RequestBuilder) -> Result<String> {
        let response = request.send().map_err(|e| {
            let err = AgentWalletError::from_transport(e, self.timeout);
            log::warn!("{} failed: {}", operation, err);
            err
        })?;

        let status = response.status();
        log::debug!("{} {} -> {}", operation, response.url(), status);

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .map_err(|e| AgentWalletError::from_transport(e, self.timeout))?;

        if status.is_success() {
            return Ok(body);
        }

        let err = AgentWalletError::from_status(status, retry_after.as_deref(), &body);
        if err.is_not_found() {
            log::debug!("{}: {}", operation, err);
        } else {
            log::warn!("{} failed: {}", operation, err);
        }
        Err(err)
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| AgentWalletError::Decode { operation, source })
}
