//! Builds `Outbox.executeTransaction` arguments for an L2 -> L1 withdrawal.
//!
//! The proof is constructed against the send count of the L2 block referenced by the latest
//! *finalized* `NodeConfirmed` on L1. Reading a shallower node risks proving against L2 state
//! that is later reorganized out, which leaves a proof that can never execute.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use std::sync::Arc;

use crate::codec::{decode_transfer_id, FinalizationPayload};
use crate::contracts::{IArbRollupCore, IArbSys, IL2ArbitrumGateway};
use crate::ctx::Ctx;
use crate::error::{BridgeError, BridgeResult};
use crate::models::LiquidityTransferred;
use crate::queries::{Confirmations, LogSource, RollupQueries};

pub struct OutboxProofBuilder {
    rollup_core: Address,
    arb_sys: Address,
    l2_gateway: Address,
    l1_logs: Arc<dyn LogSource>,
    rollup: Arc<dyn RollupQueries>,
}

impl OutboxProofBuilder {
    pub fn new(
        rollup_core: Address,
        arb_sys: Address,
        l2_gateway: Address,
        l1_logs: Arc<dyn LogSource>,
        rollup: Arc<dyn RollupQueries>,
    ) -> Self {
        Self { rollup_core, arb_sys, l2_gateway, l1_logs, rollup }
    }

    /// Send count covered by the latest finalized rollup node.
    pub async fn confirmed_send_count(&self, ctx: &Ctx) -> BridgeResult<u64> {
        let log = ctx
            .run(
                "latest node confirmed",
                self.l1_logs.latest_log_by_event_sig(
                    IArbRollupCore::NodeConfirmed::SIGNATURE_HASH,
                    self.rollup_core,
                    Confirmations::Finalized,
                ),
            )
            .await?
            .ok_or(BridgeError::NoConfirmedNode("NodeConfirmed"))?;
        let node = log
            .log_decode::<IArbRollupCore::NodeConfirmed>()
            .map_err(|e| BridgeError::decode("NodeConfirmed", e))?
            .inner
            .data;

        let send_count = ctx
            .run("l2 send count", self.rollup.send_count(node.blockHash))
            .await?;
        tracing::debug!(
            node_num = node.nodeNum,
            block_hash = %node.blockHash,
            send_count,
            "read confirmed rollup node"
        );
        Ok(send_count)
    }

    /// Encoded finalization payload for `sent`, or `None` while no confirmed node covers it.
    pub async fn finalization_payload(
        &self,
        ctx: &Ctx,
        sent: &LiquidityTransferred,
    ) -> BridgeResult<Option<Bytes>> {
        let message_id = decode_transfer_id(&sent.bridge_return_data)?;
        let leaf = u64::try_from(message_id)
            .map_err(|e| BridgeError::decode("l2 to l1 message id", e))?;

        let send_count = self.confirmed_send_count(ctx).await?;

        // Any failure here is read as "not covered yet", including transport errors.
        let proof = match ctx
            .run("construct outbox proof", self.rollup.construct_outbox_proof(send_count, leaf))
            .await
        {
            Ok(proof) => proof,
            Err(e @ (BridgeError::Cancelled(_) | BridgeError::DeadlineExceeded(_))) => return Err(e),
            Err(e) => {
                tracing::debug!(
                    tx_hash = %sent.meta.tx_hash,
                    message_id = leaf,
                    send_count,
                    error = %e,
                    "outbox proof not available yet"
                );
                return Ok(None);
            }
        };

        let payload = self.assemble(ctx, sent.meta.tx_hash, message_id, proof).await?;
        Ok(Some(payload.encode()))
    }

    async fn assemble(
        &self,
        ctx: &Ctx,
        tx_hash: B256,
        message_id: U256,
        proof: Vec<B256>,
    ) -> BridgeResult<FinalizationPayload> {
        let receipt = ctx
            .run("l2 transaction receipt", self.rollup.transaction_receipt(tx_hash))
            .await?;

        let l2_to_l1 = find_event::<IArbSys::L2ToL1Tx>(&receipt.logs, Some(self.arb_sys), |e| {
            e.position == message_id
        })?
        .ok_or(BridgeError::MissingLog { tx_hash, event: "L2ToL1Tx" })?;

        let gateway = Some(self.l2_gateway);
        let withdrawal = find_event::<IL2ArbitrumGateway::WithdrawalInitiated>(&receipt.logs, gateway, |e| {
            e._l2ToL1Id == message_id
        })?
        .ok_or(BridgeError::MissingLog { tx_hash, event: "WithdrawalInitiated" })?;

        let tx_to_l1 = find_event::<IL2ArbitrumGateway::TxToL1>(&receipt.logs, gateway, |e| e._id == message_id)?
            .ok_or(BridgeError::MissingLog { tx_hash, event: "TxToL1" })?;

        let l1_block = ctx
            .run("l1 block of l2 tx", self.rollup.l1_block_number(tx_hash))
            .await?;

        Ok(FinalizationPayload {
            proof,
            index: withdrawal._l2ToL1Id,
            l2_sender: tx_to_l1._from,
            to: tx_to_l1._to,
            l2_block: U256::from(receipt.block_number),
            l1_block: U256::from(l1_block),
            l2_timestamp: l2_to_l1.timestamp,
            value: withdrawal._amount,
            data: tx_to_l1._data,
        })
    }
}

/// First log of type `E` (optionally from `emitter`) whose decoded body satisfies `pred`.
fn find_event<E: SolEvent>(
    logs: &[Log],
    emitter: Option<Address>,
    pred: impl Fn(&E) -> bool,
) -> BridgeResult<Option<E>> {
    for log in logs {
        if log.topics().first() != Some(&E::SIGNATURE_HASH) {
            continue;
        }
        if emitter.is_some_and(|a| log.address() != a) {
            continue;
        }
        let event = log
            .log_decode::<E>()
            .map_err(|e| BridgeError::decode(E::SIGNATURE, e))?
            .inner
            .data;
        if pred(&event) {
            return Ok(Some(event));
        }
    }
    Ok(None)
}
