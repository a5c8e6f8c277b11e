use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::Log;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contracts::{IL2ArbitrumGateway, ILiquidityManager};
use crate::error::{BridgeError, BridgeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkSelector(pub u64);

impl fmt::Display for NetworkSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle position of a transfer. Only the first two are produced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStage {
    RebalanceConfirmed = 1,
    FinalizeReady = 2,
    FinalizeConfirmed = 3,
}

impl TransferStage {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    NotReady,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: NetworkSelector,
    pub to: NetworkSelector,
    pub sender: Address,
    pub receiver: Address,
    pub local_token: Address,
    pub remote_token: Address,
    pub amount: U256,
    /// Unix seconds of the block that carried the sent event.
    pub date: u64,
    pub bridge_data: Bytes,
    pub stage: TransferStage,
    pub native_bridge_fee: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    #[serde(flatten)]
    pub transfer: Transfer,
    pub status: TransferStatus,
    pub id: String,
}

/// Where a decoded event came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogMeta {
    pub tx_hash: B256,
    pub log_index: u64,
    pub block_number: u64,
    pub block_timestamp: Option<u64>,
}

impl LogMeta {
    pub fn transfer_id(&self) -> String {
        format!("{}-{}", self.tx_hash, self.log_index)
    }
}

impl TryFrom<&Log> for LogMeta {
    type Error = BridgeError;

    fn try_from(log: &Log) -> BridgeResult<Self> {
        let tx_hash = log
            .transaction_hash
            .ok_or_else(|| BridgeError::decode("log metadata", "missing transaction hash"))?;
        Ok(Self {
            tx_hash,
            log_index: log.log_index.unwrap_or(0),
            block_number: log.block_number.unwrap_or(0),
            block_timestamp: log.block_timestamp,
        })
    }
}

/// `LiquidityTransferred` emitted by a liquidity manager, on either side of a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiquidityTransferred {
    pub ocr_seq_num: u64,
    pub from_chain: u64,
    pub to_chain: u64,
    pub to: Address,
    pub amount: U256,
    pub bridge_specific_data: Bytes,
    pub bridge_return_data: Bytes,
    pub meta: LogMeta,
}

impl TryFrom<&Log> for LiquidityTransferred {
    type Error = BridgeError;

    fn try_from(log: &Log) -> BridgeResult<Self> {
        let decoded = log
            .log_decode::<ILiquidityManager::LiquidityTransferred>()
            .map_err(|e| BridgeError::decode("LiquidityTransferred", e))?;
        let ev = decoded.inner.data;
        Ok(Self {
            ocr_seq_num: ev.ocrSeqNum,
            from_chain: ev.fromChainSelector,
            to_chain: ev.toChainSelector,
            to: ev.to,
            amount: ev.amount,
            bridge_specific_data: ev.bridgeSpecificData,
            bridge_return_data: ev.bridgeReturnData,
            meta: LogMeta::try_from(log)?,
        })
    }
}

/// Token gateway deposit on L2. Emitted for every deposit through the gateway, not only ours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositFinalized {
    pub l1_token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

impl TryFrom<&Log> for DepositFinalized {
    type Error = BridgeError;

    fn try_from(log: &Log) -> BridgeResult<Self> {
        let ev = log
            .log_decode::<IL2ArbitrumGateway::DepositFinalized>()
            .map_err(|e| BridgeError::decode("DepositFinalized", e))?
            .inner
            .data;
        Ok(Self {
            l1_token: ev.l1Token,
            from: ev._from,
            to: ev._to,
            amount: ev._amount,
        })
    }
}
