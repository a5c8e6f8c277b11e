use anyhow::{Context, Result};
use arb_liquidity_bridge::bridge::{new_bridge, BridgeDeps};
use arb_liquidity_bridge::config::BridgeConfig;
use arb_liquidity_bridge::ctx::Ctx;
use arb_liquidity_bridge::rpc::{connect_http, ArbitrumNode, EthereumNode, ProviderLogSource};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BridgeConfig::from_env()?;
    tracing::info!(direction = ?config.direction, "arbitrum liquidity bridge starting");

    let eth_provider = connect_http(&config.ethereum_rpc)?;
    let arb_provider = connect_http(&config.arbitrum_rpc)?;

    let deps = BridgeDeps {
        l1_logs: Arc::new(
            ProviderLogSource::new(eth_provider.clone(), config.l1_log_lookback_blocks)
                .with_chunk_size(config.l1_log_chunk_blocks),
        ),
        l2_logs: Arc::new(
            ProviderLogSource::new(arb_provider.clone(), config.l2_log_lookback_blocks)
                .with_chunk_size(config.l2_log_chunk_blocks),
        ),
        base: Arc::new(EthereumNode::new(
            eth_provider,
            config.l1_gateway_router,
            config.arbitrum_inbox,
        )),
        rollup: Arc::new(ArbitrumNode::new(arb_provider, config.fees.node_interface)),
    };

    let root = Ctx::new();
    let ctx = root.with_timeout(config.request_timeout);

    let bridge = new_bridge(&ctx, &config, deps).await?;
    let transfers = bridge
        .get_transfers(&ctx, config.local_token, config.remote_token)
        .await;
    let closed = bridge.close(&root.with_timeout(config.request_timeout)).await;

    let transfers = transfers.context("failed to collect pending transfers")?;
    tracing::info!(count = transfers.len(), "collected pending transfers");
    println!("{}", serde_json::to_string_pretty(&transfers)?);

    closed.context("failed to close bridge")?;
    Ok(())
}
