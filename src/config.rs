use alloy::primitives::{address, Address, U256};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::models::NetworkSelector;

pub const NODE_INTERFACE_ADDRESS: Address = address!("00000000000000000000000000000000000000C8");
pub const ARB_SYS_ADDRESS: Address = address!("0000000000000000000000000000000000000064");

const DEFAULT_LOOKBACK_SECS: u64 = 14 * 24 * 3600;
const L1_BLOCK_TIME_MS: u64 = 12_000;
const L2_BLOCK_TIME_MS: u64 = 250;
const DEFAULT_L1_CHUNK_BLOCKS: u64 = 500;
const DEFAULT_L2_CHUNK_BLOCKS: u64 = 10_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeDirection {
    L1ToL2,
    L2ToL1,
}

impl FromStr for BridgeDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l1-to-l2" | "l1_to_l2" => Ok(BridgeDirection::L1ToL2),
            "l2-to-l1" | "l2_to_l1" => Ok(BridgeDirection::L2ToL1),
            other => Err(anyhow!("unknown bridge direction {other:?}")),
        }
    }
}

/// Safety margins and precompile locations used when pricing a retryable ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeConfig {
    /// Applied to the L2 suggested gas price to absorb drift before redemption.
    pub max_fee_per_gas_multiplier: u64,
    /// Applied to the L1 submission fee to absorb base fee drift.
    pub submission_fee_multiplier: u64,
    pub node_interface: Address,
    pub arb_sys: Address,
    /// Deposit used while simulating the retryable; the estimate fails with zero.
    pub retryable_estimate_deposit: U256,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            max_fee_per_gas_multiplier: 3,
            submission_fee_multiplier: 4,
            node_interface: NODE_INTERFACE_ADDRESS,
            arb_sys: ARB_SYS_ADDRESS,
            retryable_estimate_deposit: U256::from(1_000_000_000_000_000_000u128),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub ethereum_rpc: String,
    pub arbitrum_rpc: String,
    pub direction: BridgeDirection,
    pub l1_selector: NetworkSelector,
    pub l2_selector: NetworkSelector,
    pub l1_liquidity_manager: Address,
    pub l2_liquidity_manager: Address,
    pub l1_bridge_adapter: Address,
    pub l1_gateway_router: Address,
    pub l2_gateway: Address,
    pub arbitrum_inbox: Address,
    pub arbitrum_rollup: Address,
    pub local_token: Address,
    pub remote_token: Address,
    pub log_lookback_secs: u64,
    /// Block windows scanned per chain; each covers `log_lookback_secs` at that chain's block time.
    pub l1_log_lookback_blocks: u64,
    pub l2_log_lookback_blocks: u64,
    pub l1_log_chunk_blocks: u64,
    pub l2_log_chunk_blocks: u64,
    pub request_timeout: Duration,
    pub fees: FeeConfig,
}

fn var(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

fn address_var(name: &str) -> Result<Address> {
    Address::from_str(&var(name)?).with_context(|| format!("{name} is not a valid address"))
}

fn u64_var(name: &str) -> Result<u64> {
    var(name)?.parse().with_context(|| format!("{name} is not a valid integer"))
}

fn u64_var_or(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(v) => v.parse().with_context(|| format!("{name} is not a valid integer")),
        Err(_) => Ok(default),
    }
}

/// Blocks produced in `lookback_secs` at one block per `block_time_ms`, rounded up.
pub fn lookback_blocks(lookback_secs: u64, block_time_ms: u64) -> u64 {
    lookback_secs
        .saturating_mul(1000)
        .div_ceil(block_time_ms.max(1))
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars()
    }

    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenv::from_path(path).with_context(|| format!("failed to load {}", path.display()))?;
        Self::from_vars()
    }

    fn from_vars() -> Result<Self> {
        let ethereum_rpc = var("ETHEREUM_RPC_URL")
            .or_else(|_| var("MAINNET_RPC_URL"))
            .context("ETHEREUM_RPC_URL or MAINNET_RPC_URL must be set")?;

        let log_lookback_secs = u64_var_or("LOG_LOOKBACK_SECS", DEFAULT_LOOKBACK_SECS)?;

        let fees = FeeConfig {
            max_fee_per_gas_multiplier: u64_var_or("MAX_FEE_PER_GAS_MULTIPLIER", 3)?,
            submission_fee_multiplier: u64_var_or("SUBMISSION_FEE_MULTIPLIER", 4)?,
            ..FeeConfig::default()
        };

        Ok(Self {
            ethereum_rpc,
            arbitrum_rpc: var("ARBITRUM_RPC_URL")?,
            direction: var("BRIDGE_DIRECTION")?.parse()?,
            l1_selector: NetworkSelector(u64_var("L1_CHAIN_SELECTOR")?),
            l2_selector: NetworkSelector(u64_var("L2_CHAIN_SELECTOR")?),
            l1_liquidity_manager: address_var("L1_LIQUIDITY_MANAGER")?,
            l2_liquidity_manager: address_var("L2_LIQUIDITY_MANAGER")?,
            l1_bridge_adapter: address_var("L1_BRIDGE_ADAPTER")?,
            l1_gateway_router: address_var("L1_GATEWAY_ROUTER")?,
            l2_gateway: address_var("L2_GATEWAY")?,
            arbitrum_inbox: address_var("ARBITRUM_INBOX")?,
            arbitrum_rollup: address_var("ARBITRUM_ROLLUP")?,
            local_token: address_var("LOCAL_TOKEN")?,
            remote_token: address_var("REMOTE_TOKEN")?,
            log_lookback_secs,
            l1_log_lookback_blocks: u64_var_or(
                "L1_LOG_LOOKBACK_BLOCKS",
                lookback_blocks(log_lookback_secs, L1_BLOCK_TIME_MS),
            )?,
            l2_log_lookback_blocks: u64_var_or(
                "L2_LOG_LOOKBACK_BLOCKS",
                lookback_blocks(log_lookback_secs, L2_BLOCK_TIME_MS),
            )?,
            l1_log_chunk_blocks: u64_var_or("L1_LOG_CHUNK_BLOCKS", DEFAULT_L1_CHUNK_BLOCKS)?,
            l2_log_chunk_blocks: u64_var_or("L2_LOG_CHUNK_BLOCKS", DEFAULT_L2_CHUNK_BLOCKS)?,
            request_timeout: Duration::from_secs(u64_var_or(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            fees,
        })
    }
}
