#![allow(dead_code)]

use alloy::primitives::{address, Address, Bytes, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use arb_liquidity_bridge::bridge::BridgeDeps;
use arb_liquidity_bridge::config::{BridgeConfig, BridgeDirection, FeeConfig};
use arb_liquidity_bridge::contracts::{IArbRollupCore, ILiquidityManager};
use arb_liquidity_bridge::error::{BridgeError, BridgeResult};
use arb_liquidity_bridge::models::NetworkSelector;
use arb_liquidity_bridge::queries::{
    BaseQueries, Confirmations, LogFilter, LogSource, ReceiptLogs, RetryableData, RollupQueries,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const L1_SELECTOR: u64 = 5_009_297_550_715_157_269;
pub const L2_SELECTOR: u64 = 4_949_039_107_694_359_620;

pub const L1_LM: Address = address!("1000000000000000000000000000000000000001");
pub const L2_LM: Address = address!("2000000000000000000000000000000000000002");
pub const L1_ADAPTER: Address = address!("1000000000000000000000000000000000000003");
pub const L1_ROUTER: Address = address!("1000000000000000000000000000000000000004");
pub const L1_GATEWAY: Address = address!("1000000000000000000000000000000000000005");
pub const L2_GATEWAY: Address = address!("2000000000000000000000000000000000000006");
pub const INBOX: Address = address!("1000000000000000000000000000000000000007");
pub const ROLLUP: Address = address!("1000000000000000000000000000000000000008");
pub const L1_TOKEN: Address = address!("1000000000000000000000000000000000000009");
pub const L2_TOKEN: Address = address!("200000000000000000000000000000000000000a");

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn test_config(direction: BridgeDirection) -> BridgeConfig {
    let (local_token, remote_token) = match direction {
        BridgeDirection::L1ToL2 => (L1_TOKEN, L2_TOKEN),
        BridgeDirection::L2ToL1 => (L2_TOKEN, L1_TOKEN),
    };
    BridgeConfig {
        ethereum_rpc: "http://localhost:8545".to_string(),
        arbitrum_rpc: "http://localhost:8547".to_string(),
        direction,
        l1_selector: NetworkSelector(L1_SELECTOR),
        l2_selector: NetworkSelector(L2_SELECTOR),
        l1_liquidity_manager: L1_LM,
        l2_liquidity_manager: L2_LM,
        l1_bridge_adapter: L1_ADAPTER,
        l1_gateway_router: L1_ROUTER,
        l2_gateway: L2_GATEWAY,
        arbitrum_inbox: INBOX,
        arbitrum_rollup: ROLLUP,
        local_token,
        remote_token,
        log_lookback_secs: 3600,
        l1_log_lookback_blocks: 300,
        l2_log_lookback_blocks: 14_400,
        l1_log_chunk_blocks: 500,
        l2_log_chunk_blocks: 10_000,
        request_timeout: Duration::from_secs(5),
        fees: FeeConfig::default(),
    }
}

/// Wraps an event into the shape an RPC node returns it in.
pub fn rpc_log<E: SolEvent>(emitter: Address, event: &E, tx: u8, log_index: u64, block: u64, timestamp: u64) -> Log {
    Log {
        inner: alloy::primitives::Log { address: emitter, data: event.encode_log_data() },
        block_hash: Some(B256::with_last_byte(block as u8)),
        block_number: Some(block),
        block_timestamp: Some(timestamp),
        transaction_hash: Some(B256::with_last_byte(tx)),
        transaction_index: Some(0),
        log_index: Some(log_index),
        removed: false,
    }
}

pub fn liquidity_transferred(
    from_chain: u64,
    to_chain: u64,
    to: Address,
    amount: u64,
    bridge_specific_data: Bytes,
    bridge_return_data: Bytes,
) -> ILiquidityManager::LiquidityTransferred {
    ILiquidityManager::LiquidityTransferred {
        ocrSeqNum: 1,
        fromChainSelector: from_chain,
        toChainSelector: to_chain,
        to,
        amount: U256::from(amount),
        bridgeSpecificData: bridge_specific_data,
        bridgeReturnData: bridge_return_data,
    }
}

pub fn node_confirmed(node_num: u64, block_hash: B256) -> IArbRollupCore::NodeConfirmed {
    IArbRollupCore::NodeConfirmed {
        nodeNum: node_num,
        blockHash: block_hash,
        sendRoot: B256::ZERO,
    }
}

/// In-memory log index.
#[derive(Default)]
pub struct MockLogSource {
    pub logs: Mutex<Vec<Log>>,
    pub registered: Mutex<Vec<LogFilter>>,
    pub unregistered: Mutex<Vec<String>>,
    pub latest_confs: Mutex<Vec<Confirmations>>,
    /// (event signature, emitter, depth) of every range query.
    pub range_queries: Mutex<Vec<(B256, Address, Confirmations)>>,
    pub fail_unregister: bool,
}

impl MockLogSource {
    pub fn with_logs(logs: Vec<Log>) -> Self {
        Self { logs: Mutex::new(logs), ..Default::default() }
    }

    pub fn failing_unregister() -> Self {
        Self { fail_unregister: true, ..Default::default() }
    }

    pub fn push(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    pub fn depth_of(&self, event_sig: B256) -> Vec<Confirmations> {
        self.range_queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(sig, _, _)| *sig == event_sig)
            .map(|(_, _, confs)| *confs)
            .collect()
    }

    fn matching(&self, event_sig: B256, address: Address) -> Vec<Log> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.address() == address && l.topics().first() == Some(&event_sig))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LogSource for MockLogSource {
    async fn register_filter(&self, filter: LogFilter) -> BridgeResult<()> {
        self.registered.lock().unwrap().push(filter);
        Ok(())
    }

    async fn unregister_filter(&self, name: &str) -> BridgeResult<()> {
        self.unregistered.lock().unwrap().push(name.to_string());
        if self.fail_unregister {
            return Err(BridgeError::rpc("unregister filter", format!("{name} is gone")));
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
        self.range_queries.lock().unwrap().push((event_sig, address, confs));
        Ok(self
            .matching(event_sig, address)
            .into_iter()
            .filter(|l| l.block_timestamp.unwrap_or(0) >= after)
            .collect())
    }

    async fn latest_log_by_event_sig(
        &self,
        event_sig: B256,
        address: Address,
        confs: Confirmations,
    ) -> BridgeResult<Option<Log>> {
        self.latest_confs.lock().unwrap().push(confs);
        Ok(self
            .matching(event_sig, address)
            .into_iter()
            .max_by_key(|l| (l.block_number, l.log_index)))
    }
}

#[derive(Default)]
pub struct MockRollup {
    pub gas_price: U256,
    pub retryable_gas: U256,
    /// Keyed by (send count, message id); a missing key fails the proof.
    pub proofs: HashMap<(u64, u64), Vec<B256>>,
    pub receipts: HashMap<B256, ReceiptLogs>,
    pub send_counts: HashMap<B256, u64>,
    pub l1_blocks: HashMap<B256, u64>,
    pub estimate_calls: Mutex<Vec<(RetryableData, U256)>>,
    pub proof_calls: Mutex<Vec<(u64, u64)>>,
}

#[async_trait]
impl RollupQueries for MockRollup {
    async fn suggest_gas_price(&self) -> BridgeResult<U256> {
        Ok(self.gas_price)
    }

    async fn estimate_retryable_gas(&self, data: &RetryableData, deposit: U256) -> BridgeResult<U256> {
        self.estimate_calls.lock().unwrap().push((data.clone(), deposit));
        Ok(self.retryable_gas)
    }

    async fn construct_outbox_proof(&self, send_count: u64, message_id: u64) -> BridgeResult<Vec<B256>> {
        self.proof_calls.lock().unwrap().push((send_count, message_id));
        self.proofs
            .get(&(send_count, message_id))
            .cloned()
            .ok_or_else(|| BridgeError::rpc("construct outbox proof", "execution reverted: leaf not in tree"))
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> BridgeResult<ReceiptLogs> {
        self.receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| BridgeError::rpc("transaction receipt", format!("no receipt for {tx_hash}")))
    }

    async fn send_count(&self, block_hash: B256) -> BridgeResult<u64> {
        self.send_counts
            .get(&block_hash)
            .copied()
            .ok_or_else(|| BridgeError::rpc("block by hash", format!("unknown block {block_hash}")))
    }

    async fn l1_block_number(&self, tx_hash: B256) -> BridgeResult<u64> {
        self.l1_blocks
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| BridgeError::rpc("transaction receipt", format!("no receipt for {tx_hash}")))
    }
}

#[derive(Default)]
pub struct MockBase {
    pub base_fee: U256,
    pub submission_fee: U256,
    pub gateways: HashMap<Address, Address>,
    pub counterparts: HashMap<Address, Address>,
    pub calldata: Bytes,
    pub submission_calls: Mutex<Vec<(usize, U256)>>,
    pub outbound_calls: Mutex<Vec<(Address, Address, Address, Address, U256)>>,
}

#[async_trait]
impl BaseQueries for MockBase {
    async fn latest_base_fee(&self) -> BridgeResult<U256> {
        Ok(self.base_fee)
    }

    async fn retryable_submission_fee(&self, data_len: usize, base_fee: U256) -> BridgeResult<U256> {
        self.submission_calls.lock().unwrap().push((data_len, base_fee));
        Ok(self.submission_fee)
    }

    async fn gateway_for(&self, token: Address) -> BridgeResult<Address> {
        Ok(self.gateways.get(&token).copied().unwrap_or(Address::ZERO))
    }

    async fn counterpart_gateway(&self, l1_gateway: Address) -> BridgeResult<Address> {
        Ok(self.counterparts.get(&l1_gateway).copied().unwrap_or(Address::ZERO))
    }

    async fn outbound_calldata(
        &self,
        l1_gateway: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
        _data: Bytes,
    ) -> BridgeResult<Bytes> {
        self.outbound_calls
            .lock()
            .unwrap()
            .push((l1_gateway, token, from, to, amount));
        Ok(self.calldata.clone())
    }
}

pub struct Harness {
    pub l1_logs: Arc<MockLogSource>,
    pub l2_logs: Arc<MockLogSource>,
    pub base: Arc<MockBase>,
    pub rollup: Arc<MockRollup>,
}

impl Harness {
    pub fn new(l1_logs: MockLogSource, l2_logs: MockLogSource, base: MockBase, rollup: MockRollup) -> Self {
        Self {
            l1_logs: Arc::new(l1_logs),
            l2_logs: Arc::new(l2_logs),
            base: Arc::new(base),
            rollup: Arc::new(rollup),
        }
    }

    pub fn deps(&self) -> BridgeDeps {
        BridgeDeps {
            l1_logs: self.l1_logs.clone(),
            l2_logs: self.l2_logs.clone(),
            base: self.base.clone(),
            rollup: self.rollup.clone(),
        }
    }
}
