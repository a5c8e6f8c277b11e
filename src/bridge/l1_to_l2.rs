use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::sync::Arc;

use crate::bridge::fees::FeeEstimator;
use crate::bridge::pending::{to_pending_transfers, TransferEndpoints};
use crate::bridge::quorum::quorumized_retryable_params;
use crate::bridge::{decode_logs, unix_now, unregister_filters, Bridge, BridgeDeps, Partition};
use crate::codec::decode_transfer_id;
use crate::config::BridgeConfig;
use crate::contracts::{IL2ArbitrumGateway, ILiquidityManager};
use crate::ctx::Ctx;
use crate::error::{BridgeError, BridgeResult};
use crate::models::{DepositFinalized, LiquidityTransferred, NetworkSelector, PendingTransfer, Transfer};
use crate::queries::{BaseQueries, Confirmations, LogFilter, LogSource, RetryableData};

/// Tracks L1 -> L2 sends through the Arbitrum token gateway.
pub struct L1ToL2Bridge {
    local_selector: NetworkSelector,
    remote_selector: NetworkSelector,
    l1_liquidity_manager: Address,
    l2_liquidity_manager: Address,
    l1_bridge_adapter: Address,
    l2_gateway: Address,
    log_lookback_secs: u64,
    l1_logs: Arc<dyn LogSource>,
    l2_logs: Arc<dyn LogSource>,
    base: Arc<dyn BaseQueries>,
    fees: FeeEstimator,
    l1_filter_name: String,
    l2_filter_name: String,
}

impl L1ToL2Bridge {
    pub async fn new(ctx: &Ctx, config: &BridgeConfig, deps: BridgeDeps) -> BridgeResult<Self> {
        let l1_filter_name = format!(
            "ArbitrumL1ToL2:LiquidityTransferred:{}:{}",
            config.l1_selector, config.l1_liquidity_manager
        );
        let l2_filter_name = format!(
            "ArbitrumL1ToL2:DepositFinalized,LiquidityTransferred:{}:{}:{}",
            config.l2_selector, config.l2_gateway, config.l2_liquidity_manager
        );

        ctx.run(
            "register l1 filter",
            deps.l1_logs.register_filter(LogFilter {
                name: l1_filter_name.clone(),
                event_sigs: vec![ILiquidityManager::LiquidityTransferred::SIGNATURE_HASH],
                addresses: vec![config.l1_liquidity_manager],
            }),
        )
        .await?;
        ctx.run(
            "register l2 filter",
            deps.l2_logs.register_filter(LogFilter {
                name: l2_filter_name.clone(),
                event_sigs: vec![
                    IL2ArbitrumGateway::DepositFinalized::SIGNATURE_HASH,
                    ILiquidityManager::LiquidityTransferred::SIGNATURE_HASH,
                ],
                addresses: vec![config.l2_gateway, config.l2_liquidity_manager],
            }),
        )
        .await?;

        tracing::info!(
            l1_liquidity_manager = %config.l1_liquidity_manager,
            l2_liquidity_manager = %config.l2_liquidity_manager,
            "created arbitrum L1 -> L2 bridge"
        );

        Ok(Self {
            local_selector: config.l1_selector,
            remote_selector: config.l2_selector,
            l1_liquidity_manager: config.l1_liquidity_manager,
            l2_liquidity_manager: config.l2_liquidity_manager,
            l1_bridge_adapter: config.l1_bridge_adapter,
            l2_gateway: config.l2_gateway,
            log_lookback_secs: config.log_lookback_secs,
            l1_logs: deps.l1_logs,
            l2_logs: deps.l2_logs,
            base: deps.base.clone(),
            fees: FeeEstimator::new(deps.base, deps.rollup, config.fees.clone()),
            l1_filter_name,
            l2_filter_name,
        })
    }

    fn endpoints(&self) -> TransferEndpoints {
        TransferEndpoints {
            local_selector: self.local_selector,
            remote_selector: self.remote_selector,
            sender: self.l1_liquidity_manager,
            receiver: self.l2_liquidity_manager,
        }
    }

    async fn get_logs(
        &self,
        ctx: &Ctx,
    ) -> BridgeResult<(Vec<LiquidityTransferred>, Vec<DepositFinalized>, Vec<LiquidityTransferred>)> {
        let after = unix_now().saturating_sub(self.log_lookback_secs);

        let sent_logs = ctx
            .run(
                "l1 sent logs",
                self.l1_logs.logs_created_after(
                    ILiquidityManager::LiquidityTransferred::SIGNATURE_HASH,
                    self.l1_liquidity_manager,
                    after,
                    Confirmations::Unconfirmed,
                ),
            )
            .await?;
        let deposit_logs = ctx
            .run(
                "l2 deposit finalized logs",
                self.l2_logs.logs_created_after(
                    IL2ArbitrumGateway::DepositFinalized::SIGNATURE_HASH,
                    self.l2_gateway,
                    after,
                    // Readiness is gated on the deposit, so it must survive an L2 reorg.
                    Confirmations::Finalized,
                ),
            )
            .await?;
        let received_logs = ctx
            .run(
                "l2 received logs",
                self.l2_logs.logs_created_after(
                    ILiquidityManager::LiquidityTransferred::SIGNATURE_HASH,
                    self.l2_liquidity_manager,
                    after,
                    Confirmations::Unconfirmed,
                ),
            )
            .await?;

        let sent: Vec<LiquidityTransferred> = decode_logs::<LiquidityTransferred>(&sent_logs)?
            .into_iter()
            .filter(|t| t.to_chain == self.remote_selector.0)
            .collect();
        let deposits = decode_logs::<DepositFinalized>(&deposit_logs)?;
        let received: Vec<LiquidityTransferred> = decode_logs::<LiquidityTransferred>(&received_logs)?
            .into_iter()
            .filter(|t| t.from_chain == self.local_selector.0)
            .collect();

        Ok((sent, deposits, received))
    }
}

#[async_trait]
impl Bridge for L1ToL2Bridge {
    async fn get_transfers(
        &self,
        ctx: &Ctx,
        local_token: Address,
        remote_token: Address,
    ) -> BridgeResult<Vec<PendingTransfer>> {
        let (sent, deposits, received) = self.get_logs(ctx).await?;
        let partition = partition_transfers(
            local_token,
            self.l1_bridge_adapter,
            self.l2_liquidity_manager,
            &sent,
            &deposits,
            &received,
        )?;

        tracing::info!(
            sent = sent.len(),
            deposit_finalized = deposits.len(),
            received = received.len(),
            not_ready = partition.not_ready.len(),
            ready = partition.ready.len(),
            "partitioned L1 -> L2 transfers"
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

    async fn get_finalization_payload_and_fee(
        &self,
        ctx: &Ctx,
        transfer: &Transfer,
    ) -> BridgeResult<(Bytes, U256)> {
        let l1_gateway = ctx
            .run("l1 gateway for token", self.base.gateway_for(transfer.local_token))
            .await?;
        if l1_gateway.is_zero() {
            return Err(BridgeError::Unresolved { what: "l1 gateway", key: transfer.local_token });
        }
        let l2_gateway = ctx
            .run("l2 counterpart gateway", self.base.counterpart_gateway(l1_gateway))
            .await?;
        if l2_gateway.is_zero() {
            return Err(BridgeError::Unresolved { what: "l2 counterpart gateway", key: l1_gateway });
        }

        let l2_calldata = ctx
            .run(
                "outbound calldata",
                self.base.outbound_calldata(
                    l1_gateway,
                    transfer.local_token,
                    self.l1_bridge_adapter,
                    transfer.receiver,
                    transfer.amount,
                    Bytes::new(),
                ),
            )
            .await?;

        let retryable = RetryableData {
            from: l1_gateway,
            to: l2_gateway,
            l2_call_value: U256::ZERO,
            excess_fee_refund_addr: self.l2_liquidity_manager,
            call_value_refund_addr: self.l2_liquidity_manager,
            data: l2_calldata,
        };

        let l1_base_fee = ctx.run("l1 base fee", self.base.latest_base_fee()).await?;
        let fees = self.fees.estimate_all(ctx, &retryable, l1_base_fee).await?;

        tracing::info!(
            amount = %transfer.amount,
            gas_limit = %fees.gas_limit,
            deposit = %fees.deposit,
            "built L1 -> L2 send payload"
        );
        Ok((fees.params().encode(), fees.deposit))
    }

    fn quorumized_payload(&self, payloads: &[Bytes], f: usize) -> BridgeResult<Bytes> {
        quorumized_retryable_params(payloads, f)
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

/// Deposit-finalized events the gateway emitted for this protocol's own transfers.
pub fn effective_deposits<'a>(
    local_token: Address,
    l1_bridge_adapter: Address,
    l2_liquidity_manager: Address,
    deposits: &'a [DepositFinalized],
) -> Vec<&'a DepositFinalized> {
    deposits
        .iter()
        .filter(|d| d.from == l1_bridge_adapter && d.l1_token == local_token && d.to == l2_liquidity_manager)
        .collect()
}

/// Splits sent transfers into not ready, and ready with the calldata their finalization needs.
///
/// Deposits carry no transfer id, so a sent transfer is matched by (amount, recipient). Two
/// same-amount transfers to the same recipient are indistinguishable here.
pub fn partition_transfers(
    local_token: Address,
    l1_bridge_adapter: Address,
    l2_liquidity_manager: Address,
    sent: &[LiquidityTransferred],
    deposits: &[DepositFinalized],
    received: &[LiquidityTransferred],
) -> BridgeResult<Partition> {
    let effective = effective_deposits(local_token, l1_bridge_adapter, l2_liquidity_manager, deposits);

    let mut not_ready = Vec::new();
    let mut candidates = Vec::new();
    for transfer in sent {
        let matched = effective
            .iter()
            .any(|d| d.amount == transfer.amount && d.to == transfer.to);
        if matched {
            candidates.push(transfer.clone());
        } else {
            not_ready.push(transfer.clone());
        }
    }

    let ready = filter_executed(candidates, received)?;
    let ready_data = ready.iter().map(|t| t.bridge_return_data.clone()).collect();
    Ok(Partition { not_ready, ready, ready_data })
}

/// Drops candidates whose finalization already landed on L2.
pub fn filter_executed(
    candidates: Vec<LiquidityTransferred>,
    received: &[LiquidityTransferred],
) -> BridgeResult<Vec<LiquidityTransferred>> {
    let mut ready = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !matching_execution_exists(&candidate, received)? {
            ready.push(candidate);
        }
    }
    Ok(ready)
}

pub fn matching_execution_exists(
    candidate: &LiquidityTransferred,
    received: &[LiquidityTransferred],
) -> BridgeResult<bool> {
    let id = decode_transfer_id(&candidate.bridge_return_data)?;
    for r in received {
        let received_id = decode_transfer_id(&r.bridge_specific_data)?;
        if received_id != id {
            continue;
        }
        if r.amount != candidate.amount {
            return Err(BridgeError::AmountMismatch {
                id,
                sent: candidate.amount,
                received: r.amount,
            });
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_transfer_id;
    use alloy::primitives::address;

    const TOKEN: Address = address!("0000000000000000000000000000000000000a01");
    const ADAPTER: Address = address!("0000000000000000000000000000000000000a02");
    const L2_LM: Address = address!("0000000000000000000000000000000000000a03");

    fn deposit(l1_token: Address, from: Address, to: Address, amount: u64) -> DepositFinalized {
        DepositFinalized { l1_token, from, to, amount: U256::from(amount) }
    }

    #[test]
    fn test_effective_deposits_require_all_three_fields() {
        let other = address!("0000000000000000000000000000000000000fff");
        let deposits = vec![
            deposit(other, other, other, 100),
            deposit(TOKEN, other, L2_LM, 100),
            deposit(TOKEN, ADAPTER, other, 200),
            deposit(other, ADAPTER, L2_LM, 300),
            deposit(TOKEN, ADAPTER, L2_LM, 100),
            deposit(TOKEN, ADAPTER, L2_LM, 200),
        ];
        let got = effective_deposits(TOKEN, ADAPTER, L2_LM, &deposits);
        assert_eq!(got, vec![&deposits[4], &deposits[5]]);
        assert!(effective_deposits(TOKEN, ADAPTER, L2_LM, &[]).is_empty());
    }

    #[test]
    fn test_matching_execution_rejects_malformed_ids() {
        let bad_return = LiquidityTransferred {
            bridge_return_data: Bytes::from(vec![1, 2, 3]),
            ..Default::default()
        };
        assert!(matching_execution_exists(&bad_return, &[]).is_err());

        let good = LiquidityTransferred {
            bridge_return_data: encode_transfer_id(U256::from(10u64)),
            ..Default::default()
        };
        let bad_received = LiquidityTransferred {
            bridge_specific_data: Bytes::from(vec![1, 2, 3]),
            ..Default::default()
        };
        assert!(matching_execution_exists(&good, &[bad_received]).is_err());
    }
}
