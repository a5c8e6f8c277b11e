use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::sync::Arc;

use crate::bridge::outbox_proof::OutboxProofBuilder;
use crate::bridge::pending::{to_pending_transfers, TransferEndpoints};
use crate::bridge::quorum::quorumized_empty_payload;
use crate::bridge::{decode_logs, unix_now, unregister_filters, Bridge, BridgeDeps, Partition};
use crate::codec::{decode_transfer_id, FinalizationPayload};
use crate::config::BridgeConfig;
use crate::contracts::{IArbRollupCore, ILiquidityManager};
use crate::ctx::Ctx;
use crate::error::{BridgeError, BridgeResult};
use crate::models::{LiquidityTransferred, NetworkSelector, PendingTransfer, Transfer};
use crate::queries::{Confirmations, LogFilter, LogSource};

/// Tracks L2 -> L1 withdrawals until they can be executed through the Arbitrum outbox.
pub struct L2ToL1Bridge {
    local_selector: NetworkSelector,
    remote_selector: NetworkSelector,
    l1_liquidity_manager: Address,
    l2_liquidity_manager: Address,
    log_lookback_secs: u64,
    l1_logs: Arc<dyn LogSource>,
    l2_logs: Arc<dyn LogSource>,
    proofs: OutboxProofBuilder,
    l1_filter_name: String,
    l2_filter_name: String,
}

impl L2ToL1Bridge {
    pub async fn new(ctx: &Ctx, config: &BridgeConfig, deps: BridgeDeps) -> BridgeResult<Self> {
        let l1_filter_name = format!(
            "ArbitrumL2ToL1:LiquidityTransferred,NodeConfirmed:{}:{}:{}",
            config.l1_selector, config.l1_liquidity_manager, config.arbitrum_rollup
        );
        let l2_filter_name = format!(
            "ArbitrumL2ToL1:LiquidityTransferred:{}:{}",
            config.l2_selector, config.l2_liquidity_manager
        );

        ctx.run(
            "register l1 filter",
            deps.l1_logs.register_filter(LogFilter {
                name: l1_filter_name.clone(),
                event_sigs: vec![
                    ILiquidityManager::LiquidityTransferred::SIGNATURE_HASH,
                    IArbRollupCore::NodeConfirmed::SIGNATURE_HASH,
                ],
                addresses: vec![config.l1_liquidity_manager, config.arbitrum_rollup],
            }),
        )
        .await?;
        ctx.run(
            "register l2 filter",
            deps.l2_logs.register_filter(LogFilter {
                name: l2_filter_name.clone(),
                event_sigs: vec![ILiquidityManager::LiquidityTransferred::SIGNATURE_HASH],
                addresses: vec![config.l2_liquidity_manager],
            }),
        )
        .await?;

        tracing::info!(
            l1_liquidity_manager = %config.l1_liquidity_manager,
            l2_liquidity_manager = %config.l2_liquidity_manager,
            rollup = %config.arbitrum_rollup,
            "created arbitrum L2 -> L1 bridge"
        );

        Ok(Self {
            local_selector: config.l2_selector,
            remote_selector: config.l1_selector,
            l1_liquidity_manager: config.l1_liquidity_manager,
            l2_liquidity_manager: config.l2_liquidity_manager,
            log_lookback_secs: config.log_lookback_secs,
            proofs: OutboxProofBuilder::new(
                config.arbitrum_rollup,
                config.fees.arb_sys,
                config.l2_gateway,
                deps.l1_logs.clone(),
                deps.rollup,
            ),
            l1_logs: deps.l1_logs,
            l2_logs: deps.l2_logs,
            l1_filter_name,
            l2_filter_name,
        })
    }

    fn endpoints(&self) -> TransferEndpoints {
        TransferEndpoints {
            local_selector: self.local_selector,
            remote_selector: self.remote_selector,
            sender: self.l2_liquidity_manager,
            receiver: self.l1_liquidity_manager,
        }
    }

    async fn get_logs(
        &self,
        ctx: &Ctx,
    ) -> BridgeResult<(Vec<LiquidityTransferred>, Vec<LiquidityTransferred>)> {
        let after = unix_now().saturating_sub(self.log_lookback_secs);

        let sent_logs = ctx
            .run(
                "l2 sent logs",
                self.l2_logs.logs_created_after(
                    ILiquidityManager::LiquidityTransferred::SIGNATURE_HASH,
                    self.l2_liquidity_manager,
                    after,
                    Confirmations::Unconfirmed,
                ),
            )
            .await?;
        let received_logs = ctx
            .run(
                "l1 received logs",
                self.l1_logs.logs_created_after(
                    ILiquidityManager::LiquidityTransferred::SIGNATURE_HASH,
                    self.l1_liquidity_manager,
                    after,
                    Confirmations::Unconfirmed,
                ),
            )
            .await?;

        let sent = decode_logs::<LiquidityTransferred>(&sent_logs)?
            .into_iter()
            .filter(|t| t.to_chain == self.remote_selector.0)
            .collect();
        let received = decode_logs::<LiquidityTransferred>(&received_logs)?
            .into_iter()
            .filter(|t| t.from_chain == self.local_selector.0)
            .collect();
        Ok((sent, received))
    }

    /// Runs the proof builder over every unfinalized withdrawal, one at a time.
    pub async fn partition_unfinalized(
        &self,
        ctx: &Ctx,
        unfinalized: Vec<LiquidityTransferred>,
    ) -> BridgeResult<Partition> {
        let mut partition = Partition::default();
        for transfer in unfinalized {
            match self.proofs.finalization_payload(ctx, &transfer).await? {
                Some(payload) => {
                    partition.ready.push(transfer);
                    partition.ready_data.push(payload);
                }
                None => partition.not_ready.push(transfer),
            }
        }
        Ok(partition)
    }
}

#[async_trait]
impl Bridge for L2ToL1Bridge {
    async fn get_transfers(
        &self,
        ctx: &Ctx,
        local_token: Address,
        remote_token: Address,
    ) -> BridgeResult<Vec<PendingTransfer>> {
        let (sent, received) = self.get_logs(ctx).await?;
        let (finalized, unfinalized) = partition_by_finalization(&sent, &received)?;
        let partition = self.partition_unfinalized(ctx, unfinalized).await?;

        tracing::info!(
            sent = sent.len(),
            received = received.len(),
            finalized = finalized.len(),
            not_ready = partition.not_ready.len(),
            ready = partition.ready.len(),
            "partitioned L2 -> L1 transfers"
        );

        to_pending_transfers(
            &self.endpoints(),
            local_token,
            remote_token,
            &partition.not_ready,
            &partition.ready,
            &partition.ready_data,
        )
    }

    /// Arbitrum withdrawals need neither a bridge payload nor a native fee.
    async fn get_finalization_payload_and_fee(
        &self,
        _ctx: &Ctx,
        _transfer: &Transfer,
    ) -> BridgeResult<(Bytes, U256)> {
        Ok((Bytes::new(), U256::ZERO))
    }

    fn quorumized_payload(&self, payloads: &[Bytes], f: usize) -> BridgeResult<Bytes> {
        quorumized_empty_payload(payloads, f)
    }

    async fn close(&self, ctx: &Ctx) -> BridgeResult<()> {
        unregister_filters(
            ctx,
            self.l1_logs.as_ref(),
            &self.l1_filter_name,
            self.l2_logs.as_ref(),
            &self.l2_filter_name,
        )
        .await
    }
}

/// Splits sent withdrawals into (already finalized on L1, still unfinalized).
///
/// The sent side returns the L2-to-L1 message id; the received side carries the finalization
/// payload whose `index` is that same id.
pub fn partition_by_finalization(
    sent: &[LiquidityTransferred],
    received: &[LiquidityTransferred],
) -> BridgeResult<(Vec<LiquidityTransferred>, Vec<LiquidityTransferred>)> {
    let received_ids = received
        .iter()
        .map(|r| Ok((FinalizationPayload::decode(&r.bridge_specific_data)?.index, r.amount)))
        .collect::<BridgeResult<Vec<(U256, U256)>>>()?;

    let mut finalized = Vec::new();
    let mut unfinalized = Vec::new();
    for transfer in sent {
        let id = decode_transfer_id(&transfer.bridge_return_data)?;
        match received_ids.iter().find(|(rid, _)| *rid == id) {
            Some((_, amount)) if *amount != transfer.amount => {
                return Err(BridgeError::AmountMismatch {
                    id,
                    sent: transfer.amount,
                    received: *amount,
                });
            }
            Some(_) => finalized.push(transfer.clone()),
            None => unfinalized.push(transfer.clone()),
        }
    }
    Ok((finalized, unfinalized))
}
