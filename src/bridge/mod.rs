//! Direction-specific reconcilers sharing one contract.

pub mod fees;
pub mod l1_to_l2;
pub mod l2_to_l1;
pub mod outbox_proof;
pub mod pending;
pub mod quorum;

use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{BridgeConfig, BridgeDirection};
use crate::ctx::Ctx;
use crate::error::{BridgeError, BridgeResult};
use crate::models::{LiquidityTransferred, PendingTransfer, Transfer};
use crate::queries::{BaseQueries, LogSource, RollupQueries};

pub use l1_to_l2::L1ToL2Bridge;
pub use l2_to_l1::L2ToL1Bridge;

#[async_trait]
pub trait Bridge: Send + Sync {
    /// Transfers sent from `local_token`'s chain that have not been finalized on the other side yet.
    async fn get_transfers(
        &self,
        ctx: &Ctx,
        local_token: Address,
        remote_token: Address,
    ) -> BridgeResult<Vec<PendingTransfer>>;

    /// Payload and native fee the source-side send call needs for `transfer`.
    async fn get_finalization_payload_and_fee(
        &self,
        ctx: &Ctx,
        transfer: &Transfer,
    ) -> BridgeResult<(Bytes, U256)>;

    /// Reduces reporters' payloads to one acceptable to more than `f` of them.
    fn quorumized_payload(&self, payloads: &[Bytes], f: usize) -> BridgeResult<Bytes>;

    async fn close(&self, ctx: &Ctx) -> BridgeResult<()>;
}

/// Chain access shared by both directions.
#[derive(Clone)]
pub struct BridgeDeps {
    pub l1_logs: Arc<dyn LogSource>,
    pub l2_logs: Arc<dyn LogSource>,
    pub base: Arc<dyn BaseQueries>,
    pub rollup: Arc<dyn RollupQueries>,
}

pub async fn new_bridge(ctx: &Ctx, config: &BridgeConfig, deps: BridgeDeps) -> BridgeResult<Box<dyn Bridge>> {
    match config.direction {
        BridgeDirection::L1ToL2 => Ok(Box::new(L1ToL2Bridge::new(ctx, config, deps).await?)),
        BridgeDirection::L2ToL1 => Ok(Box::new(L2ToL1Bridge::new(ctx, config, deps).await?)),
    }
}

/// Correlator output: transfers still waiting, and transfers finalizable with `ready_data[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub not_ready: Vec<LiquidityTransferred>,
    pub ready: Vec<LiquidityTransferred>,
    pub ready_data: Vec<Bytes>,
}

pub(crate) fn decode_logs<T>(logs: &[Log]) -> BridgeResult<Vec<T>>
where
    T: for<'a> TryFrom<&'a Log, Error = BridgeError>,
{
    logs.iter().map(|log| T::try_from(log)).collect()
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Unregisters both filters even when the first call fails.
pub(crate) async fn unregister_filters(
    ctx: &Ctx,
    l1_logs: &dyn LogSource,
    l1_filter: &str,
    l2_logs: &dyn LogSource,
    l2_filter: &str,
) -> BridgeResult<()> {
    let l1 = ctx.run("unregister l1 filter", l1_logs.unregister_filter(l1_filter)).await;
    let l2 = ctx.run("unregister l2 filter", l2_logs.unregister_filter(l2_filter)).await;
    let errors: Vec<String> = [l1, l2]
        .into_iter()
        .filter_map(|r| r.err().map(|e| e.to_string()))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BridgeError::Close(errors.join("; ")))
    }
}
