use alloy::eips::BlockNumberOrTag;
use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::cmp::min;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::contracts::{IArbitrumInbox, IL1ArbitrumGateway, IL1GatewayRouter, INodeInterface};
use crate::error::{BridgeError, BridgeResult};
use crate::queries::{
    BaseQueries, Confirmations, LogFilter, LogSource, ReceiptLogs, RetryableData, RollupQueries,
};

const DEFAULT_CHUNK_SIZE: u64 = 500;

pub fn connect_http(url: &str) -> anyhow::Result<DynProvider<Ethereum>> {
    Ok(ProviderBuilder::new().connect_http(url.parse()?).erased())
}

/// Reads a hex quantity field (`"0x1a"`) out of a raw JSON-RPC object.
fn hex_quantity(value: &serde_json::Value, field: &'static str) -> BridgeResult<u64> {
    let raw = value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| BridgeError::decode(field, "field missing from rpc response"))?;
    u64::from_str_radix(raw.trim_start_matches("0x"), 16).map_err(|e| BridgeError::decode(field, e))
}

pub struct ArbitrumNode {
    provider: DynProvider<Ethereum>,
    node_interface: Address,
}

impl ArbitrumNode {
    pub fn new(provider: DynProvider<Ethereum>, node_interface: Address) -> Self {
        Self { provider, node_interface }
    }
}

#[async_trait]
impl RollupQueries for ArbitrumNode {
    async fn suggest_gas_price(&self) -> BridgeResult<U256> {
        let price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| BridgeError::rpc("l2 gas price", e))?;
        Ok(U256::from(price))
    }

    async fn estimate_retryable_gas(&self, data: &RetryableData, deposit: U256) -> BridgeResult<U256> {
        let call = INodeInterface::estimateRetryableTicketCall {
            sender: data.from,
            deposit,
            to: data.to,
            l2CallValue: data.l2_call_value,
            excessFeeRefundAddress: data.excess_fee_refund_addr,
            callValueRefundAddress: data.call_value_refund_addr,
            data: data.data.clone(),
        };
        let tx = TransactionRequest::default()
            .to(self.node_interface)
            .input(Bytes::from(call.abi_encode()).into());
        let gas = self
            .provider
            .estimate_gas(tx)
            .await
            .map_err(|e| BridgeError::rpc("estimate retryable ticket", e))?;
        Ok(U256::from(gas))
    }

    async fn construct_outbox_proof(&self, send_count: u64, message_id: u64) -> BridgeResult<Vec<B256>> {
        let node_interface = INodeInterface::new(self.node_interface, self.provider.clone());
        let result = node_interface
            .constructOutboxProof(send_count, message_id)
            .call()
            .await
            .map_err(|e| BridgeError::rpc("construct outbox proof", e))?;
        Ok(result.proof)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> BridgeResult<ReceiptLogs> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| BridgeError::rpc("l2 transaction receipt", e))?
            .ok_or_else(|| BridgeError::rpc("l2 transaction receipt", format!("no receipt for {tx_hash}")))?;
        Ok(ReceiptLogs {
            block_number: receipt.block_number.unwrap_or(0),
            logs: receipt.inner.logs().to_vec(),
        })
    }

    async fn send_count(&self, block_hash: B256) -> BridgeResult<u64> {
        let block: serde_json::Value = self
            .provider
            .raw_request("eth_getBlockByHash".into(), (block_hash, false))
            .await
            .map_err(|e| BridgeError::rpc("l2 block by hash", e))?;
        if block.is_null() {
            return Err(BridgeError::rpc("l2 block by hash", format!("block {block_hash} not found")));
        }
        hex_quantity(&block, "sendCount")
    }

    async fn l1_block_number(&self, tx_hash: B256) -> BridgeResult<u64> {
        let receipt: serde_json::Value = self
            .provider
            .raw_request("eth_getTransactionReceipt".into(), (tx_hash,))
            .await
            .map_err(|e| BridgeError::rpc("l2 raw receipt", e))?;
        if receipt.is_null() {
            return Err(BridgeError::rpc("l2 raw receipt", format!("no receipt for {tx_hash}")));
        }
        hex_quantity(&receipt, "l1BlockNumber")
    }
}

pub struct EthereumNode {
    provider: DynProvider<Ethereum>,
    gateway_router: Address,
    inbox: Address,
}

impl EthereumNode {
    pub fn new(provider: DynProvider<Ethereum>, gateway_router: Address, inbox: Address) -> Self {
        Self { provider, gateway_router, inbox }
    }
}

#[async_trait]
impl BaseQueries for EthereumNode {
    async fn latest_base_fee(&self) -> BridgeResult<U256> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| BridgeError::rpc("l1 latest block", e))?
            .ok_or_else(|| BridgeError::rpc("l1 latest block", "latest block not found"))?;
        let base_fee = block
            .header
            .base_fee_per_gas
            .ok_or_else(|| BridgeError::rpc("l1 latest block", "latest block has no base fee"))?;
        Ok(U256::from(base_fee))
    }

    async fn retryable_submission_fee(&self, data_len: usize, base_fee: U256) -> BridgeResult<U256> {
        IArbitrumInbox::new(self.inbox, self.provider.clone())
            .calculateRetryableSubmissionFee(U256::from(data_len), base_fee)
            .call()
            .await
            .map_err(|e| BridgeError::rpc("calculate retryable submission fee", e))
    }

    async fn gateway_for(&self, token: Address) -> BridgeResult<Address> {
        IL1GatewayRouter::new(self.gateway_router, self.provider.clone())
            .getGateway(token)
            .call()
            .await
            .map_err(|e| BridgeError::rpc("l1 gateway for token", e))
    }

    async fn counterpart_gateway(&self, l1_gateway: Address) -> BridgeResult<Address> {
        IL1ArbitrumGateway::new(l1_gateway, self.provider.clone())
            .counterpartGateway()
            .call()
            .await
            .map_err(|e| BridgeError::rpc("l2 counterpart gateway", e))
    }

    async fn outbound_calldata(
        &self,
        l1_gateway: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
        data: Bytes,
    ) -> BridgeResult<Bytes> {
        IL1ArbitrumGateway::new(l1_gateway, self.provider.clone())
            .getOutboundCalldata(token, from, to, amount, data)
            .call()
            .await
            .map_err(|e| BridgeError::rpc("outbound calldata", e))
    }
}

/// Log source that scans `eth_getLogs` in chunks over a trailing window. Nothing is stored.
pub struct ProviderLogSource {
    provider: DynProvider<Ethereum>,
    lookback_blocks: u64,
    chunk_size: u64,
    filters: RwLock<HashMap<String, LogFilter>>,
}

impl ProviderLogSource {
    pub fn new(provider: DynProvider<Ethereum>, lookback_blocks: u64) -> Self {
        Self {
            provider,
            lookback_blocks,
            chunk_size: DEFAULT_CHUNK_SIZE,
            filters: RwLock::new(HashMap::new()),
        }
    }

    /// Blocks per `eth_getLogs` request.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub async fn registered(&self) -> Vec<String> {
        self.filters.read().await.keys().cloned().collect()
    }

    async fn head(&self, confs: Confirmations) -> BridgeResult<u64> {
        match confs {
            Confirmations::Unconfirmed => self
                .provider
                .get_block_number()
                .await
                .map_err(|e| BridgeError::rpc("block number", e)),
            Confirmations::Finalized => {
                let block = self
                    .provider
                    .get_block_by_number(BlockNumberOrTag::Finalized)
                    .await
                    .map_err(|e| BridgeError::rpc("finalized block", e))?
                    .ok_or_else(|| BridgeError::rpc("finalized block", "node reports no finalized block"))?;
                Ok(block.header.number)
            }
        }
    }

    async fn chunk(&self, event_sig: B256, address: Address, from_block: u64, to_block: u64) -> BridgeResult<Vec<Log>> {
        let filter = Filter::new()
            .address(address)
            .event_signature(event_sig)
            .from_block(from_block)
            .to_block(to_block);
        let mut logs = self.provider.get_logs(&filter).await.map_err(|e| {
            tracing::warn!(from_block, to_block, error = %e, "failed to query logs");
            BridgeError::rpc("get logs", e)
        })?;
        self.fill_block_timestamps(&mut logs).await?;
        Ok(logs)
    }

    /// Most nodes omit `blockTimestamp` from `eth_getLogs`; read it from the block headers.
    async fn fill_block_timestamps(&self, logs: &mut [Log]) -> BridgeResult<()> {
        let mut stamps = HashMap::new();
        for number in blocks_missing_timestamp(logs) {
            let block = self
                .provider
                .get_block_by_number(BlockNumberOrTag::Number(number))
                .await
                .map_err(|e| BridgeError::rpc("block timestamp", e))?
                .ok_or_else(|| BridgeError::rpc("block timestamp", format!("block {number} not found")))?;
            stamps.insert(number, block.header.timestamp);
        }
        apply_block_timestamps(logs, &stamps);
        Ok(())
    }
}

#[async_trait]
impl LogSource for ProviderLogSource {
    async fn register_filter(&self, filter: LogFilter) -> BridgeResult<()> {
        tracing::debug!(name = %filter.name, "registering log filter");
        self.filters.write().await.insert(filter.name.clone(), filter);
        Ok(())
    }

    async fn unregister_filter(&self, name: &str) -> BridgeResult<()> {
        if self.filters.write().await.remove(name).is_none() {
            tracing::warn!(name, "unregistering unknown log filter");
        }
        Ok(())
    }

    async fn logs_created_after(
        &self,
        event_sig: B256,
        address: Address,
        after: u64,
        confs: Confirmations,
    ) -> BridgeResult<Vec<Log>> {
        let head = self.head(confs).await?;
        let mut from_block = head.saturating_sub(self.lookback_blocks);
        let mut out = Vec::new();
        while from_block <= head {
            let to_block = min(from_block.saturating_add(self.chunk_size - 1), head);
            let logs = self.chunk(event_sig, address, from_block, to_block).await?;
            out.extend(
                logs.into_iter()
                    .filter(|log| log.block_timestamp.is_none_or(|ts| ts >= after)),
            );
            from_block = to_block + 1;
        }
        Ok(out)
    }

    async fn latest_log_by_event_sig(
        &self,
        event_sig: B256,
        address: Address,
        confs: Confirmations,
    ) -> BridgeResult<Option<Log>> {
        let head = self.head(confs).await?;
        let floor = head.saturating_sub(self.lookback_blocks);
        let mut to_block = head;
        loop {
            let from_block = to_block.saturating_sub(self.chunk_size - 1).max(floor);
            let mut logs = self.chunk(event_sig, address, from_block, to_block).await?;
            if let Some(log) = logs.pop() {
                return Ok(Some(log));
            }
            if from_block == floor {
                return Ok(None);
            }
            to_block = from_block - 1;
        }
    }
}

/// Distinct block numbers of logs that came back without a timestamp.
fn blocks_missing_timestamp(logs: &[Log]) -> BTreeSet<u64> {
    logs.iter()
        .filter(|log| log.block_timestamp.is_none())
        .filter_map(|log| log.block_number)
        .collect()
}

fn apply_block_timestamps(logs: &mut [Log], stamps: &HashMap<u64, u64>) {
    for log in logs.iter_mut().filter(|log| log.block_timestamp.is_none()) {
        log.block_timestamp = log.block_number.and_then(|n| stamps.get(&n).copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hex_quantity() {
        let block = json!({ "hash": "0x00", "sendCount": "0x1a2b" });
        assert_eq!(hex_quantity(&block, "sendCount").unwrap(), 0x1a2b);
        assert!(hex_quantity(&block, "l1BlockNumber").is_err());
        assert!(hex_quantity(&json!({ "sendCount": "0xzz" }), "sendCount").is_err());
    }

    fn log_at(block: Option<u64>, timestamp: Option<u64>) -> Log {
        Log {
            block_number: block,
            block_timestamp: timestamp,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_block_timestamps_are_filled() {
        let mut logs = vec![
            log_at(Some(7), None),
            log_at(Some(7), None),
            log_at(Some(8), Some(1_000)),
            log_at(Some(9), None),
            log_at(None, None),
        ];
        let missing = blocks_missing_timestamp(&logs);
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec![7, 9]);

        let stamps = HashMap::from([(7, 1_700_000_000), (9, 1_700_000_012), (8, 5)]);
        apply_block_timestamps(&mut logs, &stamps);
        let got: Vec<Option<u64>> = logs.iter().map(|l| l.block_timestamp).collect();
        assert_eq!(
            got,
            vec![Some(1_700_000_000), Some(1_700_000_000), Some(1_000), Some(1_700_000_012), None]
        );
    }
}
