//! Retryable ticket pricing for L1 -> L2 sends.

use alloy::primitives::U256;
use std::sync::Arc;

use crate::codec::RetryableTicketParams;
use crate::config::FeeConfig;
use crate::ctx::Ctx;
use crate::error::BridgeResult;
use crate::queries::{BaseQueries, RetryableData, RollupQueries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryableFees {
    pub gas_limit: U256,
    pub max_submission_cost: U256,
    pub max_fee_per_gas: U256,
    /// Native value the L1 send must carry to fund the ticket.
    pub deposit: U256,
}

impl RetryableFees {
    pub fn params(&self) -> RetryableTicketParams {
        RetryableTicketParams {
            gas_limit: self.gas_limit,
            max_submission_cost: self.max_submission_cost,
            max_fee_per_gas: self.max_fee_per_gas,
        }
    }
}

pub struct FeeEstimator {
    base: Arc<dyn BaseQueries>,
    rollup: Arc<dyn RollupQueries>,
    config: FeeConfig,
}

impl FeeEstimator {
    pub fn new(base: Arc<dyn BaseQueries>, rollup: Arc<dyn RollupQueries>, config: FeeConfig) -> Self {
        Self { base, rollup, config }
    }

    pub async fn max_fee_per_gas(&self, ctx: &Ctx) -> BridgeResult<U256> {
        let price = ctx.run("l2 gas price", self.rollup.suggest_gas_price()).await?;
        Ok(price.saturating_mul(U256::from(self.config.max_fee_per_gas_multiplier)))
    }

    pub async fn max_submission_cost(&self, ctx: &Ctx, l1_base_fee: U256, data_len: usize) -> BridgeResult<U256> {
        let fee = ctx
            .run(
                "retryable submission fee",
                self.base.retryable_submission_fee(data_len, l1_base_fee),
            )
            .await?;
        Ok(fee.saturating_mul(U256::from(self.config.submission_fee_multiplier)))
    }

    /// Simulated, so used as-is.
    pub async fn retryable_gas_limit(&self, ctx: &Ctx, data: &RetryableData) -> BridgeResult<U256> {
        ctx.run(
            "estimate retryable gas",
            self.rollup
                .estimate_retryable_gas(data, self.config.retryable_estimate_deposit),
        )
        .await
    }

    pub async fn estimate_all(&self, ctx: &Ctx, data: &RetryableData, l1_base_fee: U256) -> BridgeResult<RetryableFees> {
        let max_fee_per_gas = self.max_fee_per_gas(ctx).await?;
        let max_submission_cost = self.max_submission_cost(ctx, l1_base_fee, data.data.len()).await?;
        let gas_limit = self.retryable_gas_limit(ctx, data).await?;
        let deposit = gas_limit
            .saturating_mul(max_fee_per_gas)
            .saturating_add(max_submission_cost);

        tracing::debug!(
            %gas_limit,
            %max_submission_cost,
            %max_fee_per_gas,
            %deposit,
            "estimated retryable fees"
        );
        Ok(RetryableFees {
            gas_limit,
            max_submission_cost,
            max_fee_per_gas,
            deposit,
        })
    }
}
