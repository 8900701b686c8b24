//! Complete agent lifecycle against a running agent wallet API.
//!
//! Creates a wallet and waits for activation, prints balances, runs ten
//! micropayments through a channel, shows conflict / rate-limit / server
//! fault handling, then creates wallets in a batch.
//!
//! ```bash
//! # Start the mock service in another shell
//! MASTER_SEED=dev-seed cargo run --manifest-path wallet-mock/Cargo.toml
//!
//! # Create the agent and give it something to put into a channel
//! curl -X POST localhost:3000/api/v1/wallets \
//!   -H 'content-type: application/json' -d '{"agentId":"agent-example-001"}'
//! curl -X POST localhost:3000/dev/wallets/agent-example-001/credit \
//!   -H 'content-type: application/json' \
//!   -d '{"chain":"evm","token":"USDC","amount":"5000000000"}'
//!
//! # Run the demo (AGENT_WALLET_API_URL defaults to http://localhost:3000/api/v1)
//! RUST_LOG=info cargo run --example lifecycle
//! ```

use agent_wallet_client::{
    format_balance, AgentWalletClient, AgentWalletError, ClientConfig, Wallet, U256,
};
use anyhow::{bail, Context};
use std::time::Duration;

const AGENT_ID: &str = "agent-example-001";
const PEER_ID: &str = "agent-example-002";

fn create_wallet(client: &AgentWalletClient) -> anyhow::Result<Wallet> {
    println!("=== Example 1: Create Agent Wallet ===");

    let wallet = client.get_or_create_wallet(AGENT_ID)?;
    println!("Agent wallet ready:");
    println!("  Agent ID: {}", wallet.agent_id);
    println!("  EVM Address: {}", wallet.evm_address);
    println!("  XRP Address: {}", wallet.xrp_address);
    println!("  Status: {:?}", wallet.status);

    if wallet.is_active() {
        return Ok(wallet);
    }

    println!("Waiting for wallet activation...");
    let wallet = client.wait_for_active(AGENT_ID, Duration::from_secs(5), 24)?;
    println!("Wallet is now active!");
    Ok(wallet)
}

fn check_balances(client: &AgentWalletClient, agent_id: &str) -> anyhow::Result<()> {
    println!("\n=== Example 2: Check Balances for {} ===", agent_id);

    let balances = client.get_all_balances(agent_id)?;
    println!("Agent has {} balances:", balances.len());
    for balance in &balances {
        println!(
            "  {} {}: {}",
            balance.chain.to_uppercase(),
            balance.token,
            balance.formatted()
        );
        println!("    Raw: {} (decimals: {})", balance.balance, balance.decimals);
    }
    Ok(())
}

fn payment_channel(client: &AgentWalletClient, agent_id: &str, peer_id: &str) -> anyhow::Result<()> {
    println!("\n=== Example 3: Payment Channel ===");

    client.get_or_create_wallet(peer_id)?;

    println!("Opening payment channel from {} to {}", agent_id, peer_id);
    // 1000 USDC (6 decimals)
    let channel_id = client.open_channel(
        agent_id,
        peer_id,
        "evm",
        "USDC",
        U256::from(1_000_000_000u64),
    )?;
    println!("Payment channel opened: {}", channel_id);

    for i in 1..=10 {
        client.send_payment(agent_id, &channel_id, U256::from(10_000_000u64))?;
        println!("Payment {}/10 sent: 10 USDC", i);
    }

    if let Some(channel) = client.find_channel(agent_id, &channel_id)? {
        println!("\nChannel status:");
        println!("  Channel ID: {}", channel.id);
        println!(
            "  Remaining balance: {} USDC",
            format_balance(channel.balance, 6)
        );
        println!("  Payments sent: {}", channel.payments_count);
    }

    println!("\nClosing payment channel...");
    client.close_channel(agent_id, &channel_id)?;
    println!("Channel closed and settled");
    Ok(())
}

fn error_handling(client: &AgentWalletClient, agent_id: &str) -> anyhow::Result<Option<Wallet>> {
    println!("\n=== Example 4: Error Handling ===");

    match client.create_wallet(agent_id) {
        Ok(wallet) => {
            println!("Wallet created: {}", agent_id);
            Ok(Some(wallet))
        }
        Err(e) if e.is_conflict() => {
            println!("Wallet already exists, retrieving existing wallet");
            Ok(client.get_wallet(agent_id)?)
        }
        Err(AgentWalletError::RateLimited { retry_after, .. }) => {
            let wait = retry_after.unwrap_or(Duration::from_secs(60));
            println!("Rate limit exceeded, retry in {:?}", wait);
            bail!("rate limited")
        }
        Err(e) if e.is_missing_master_seed() => {
            println!("Master seed not initialized - contact administrator");
            bail!("System configuration error")
        }
        Err(e) => {
            println!("Unknown error: {}", e);
            Err(e.into())
        }
    }
}

fn batch_operations(client: &AgentWalletClient) -> anyhow::Result<()> {
    println!("\n=== Example 5: Batch Wallet Creation ===");

    let agent_ids = ["agent-batch-001", "agent-batch-002", "agent-batch-003"];
    println!("Creating {} wallets...", agent_ids.len());

    let outcome = client.create_wallets(&agent_ids)?;
    for wallet in &outcome.created {
        println!("  Created: {}", wallet.agent_id);
    }
    for agent_id in &outcome.skipped {
        println!("  Skipped (already exists): {}", agent_id);
    }

    println!(
        "\nBatch creation complete: {} wallets created",
        outcome.created.len()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let client = AgentWalletClient::new(ClientConfig::from_env())
        .context("Failed to build agent wallet client")?;

    println!("{}", "=".repeat(60));
    println!("=== COMPLETE AGENT LIFECYCLE EXAMPLE ===");
    println!("{}", "=".repeat(60));

    let wallet = create_wallet(&client)?;
    check_balances(&client, &wallet.agent_id)?;
    payment_channel(&client, &wallet.agent_id, PEER_ID)?;
    error_handling(&client, "agent-error-001")?;
    batch_operations(&client)?;

    println!("\n{}", "=".repeat(60));
    println!("=== COMPLETE LIFECYCLE EXAMPLE FINISHED SUCCESSFULLY ===");
    println!("{}", "=".repeat(60));
    Ok(())
}
