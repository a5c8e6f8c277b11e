//! Narrow, purpose-specific views of the chains and the log index.
//!
//! The reconcilers only talk to these traits. `crate::rpc` backs them with alloy providers,
//! tests back them with in-memory fakes.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;

use crate::error::BridgeResult;

/// How deep a log must be before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmations {
    Unconfirmed,
    Finalized,
}

/// A named log subscription held by a reconciler for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub name: String,
    pub event_sigs: Vec<B256>,
    pub addresses: Vec<Address>,
}

#[async_trait]
pub trait LogSource: Send + Sync {
    async fn register_filter(&self, filter: LogFilter) -> BridgeResult<()>;

    async fn unregister_filter(&self, name: &str) -> BridgeResult<()>;

    /// Logs with `event_sig` emitted by `address` in blocks stamped at or after `after` (unix secs).
    async fn logs_created_after(
        &self,
        event_sig: B256,
        address: Address,
        after: u64,
        confs: Confirmations,
    ) -> BridgeResult<Vec<Log>>;

    async fn latest_log_by_event_sig(
        &self,
        event_sig: B256,
        address: Address,
        confs: Confirmations,
    ) -> BridgeResult<Option<Log>>;
}

/// Inputs of `NodeInterface.estimateRetryableTicket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableData {
    pub from: Address,
    pub to: Address,
    pub l2_call_value: U256,
    pub excess_fee_refund_addr: Address,
    pub call_value_refund_addr: Address,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct ReceiptLogs {
    pub block_number: u64,
    pub logs: Vec<Log>,
}

/// Queries against the rollup (Arbitrum) node.
#[async_trait]
pub trait RollupQueries: Send + Sync {
    async fn suggest_gas_price(&self) -> BridgeResult<U256>;

    /// Gas the retryable redemption needs, simulated against the NodeInterface precompile.
    async fn estimate_retryable_gas(&self, data: &RetryableData, deposit: U256) -> BridgeResult<U256>;

    async fn construct_outbox_proof(&self, send_count: u64, message_id: u64) -> BridgeResult<Vec<B256>>;

    async fn transaction_receipt(&self, tx_hash: B256) -> BridgeResult<ReceiptLogs>;

    /// `sendCount` header field of an L2 block, absent from the standard block type.
    async fn send_count(&self, block_hash: B256) -> BridgeResult<u64>;

    /// `l1BlockNumber` receipt field of an L2 transaction, absent from the standard receipt type.
    async fn l1_block_number(&self, tx_hash: B256) -> BridgeResult<u64>;
}

/// Queries against the base chain (Ethereum) node.
#[async_trait]
pub trait BaseQueries: Send + Sync {
    async fn latest_base_fee(&self) -> BridgeResult<U256>;

    async fn retryable_submission_fee(&self, data_len: usize, base_fee: U256) -> BridgeResult<U256>;

    async fn gateway_for(&self, token: Address) -> BridgeResult<Address>;

    async fn counterpart_gateway(&self, l1_gateway: Address) -> BridgeResult<Address>;

    async fn outbound_calldata(
        &self,
        l1_gateway: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
        data: Bytes,
    ) -> BridgeResult<Bytes>;
}
