//! ABI tuple encoding of the payloads handed to the bridge adapters.
//!
//! Both payloads are laid out exactly like Solidity's `abi.encode(payload)`, which is also
//! what packing a single-struct method call produces once its 4-byte selector is removed.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolValue;

use crate::contracts::{ArbitrumFinalizationPayload, SendERC20Params};
use crate::error::{BridgeError, BridgeResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryableTicketParams {
    pub gas_limit: U256,
    pub max_submission_cost: U256,
    pub max_fee_per_gas: U256,
}

impl RetryableTicketParams {
    pub fn encode(&self) -> Bytes {
        SendERC20Params {
            gasLimit: self.gas_limit,
            maxSubmissionCost: self.max_submission_cost,
            maxFeePerGas: self.max_fee_per_gas,
        }
        .abi_encode()
        .into()
    }

    pub fn decode(data: &[u8]) -> BridgeResult<Self> {
        let p = SendERC20Params::abi_decode(data)
            .map_err(|e| BridgeError::decode("retryable ticket params", e))?;
        Ok(Self {
            gas_limit: p.gasLimit,
            max_submission_cost: p.maxSubmissionCost,
            max_fee_per_gas: p.maxFeePerGas,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizationPayload {
    pub proof: Vec<B256>,
    pub index: U256,
    pub l2_sender: Address,
    pub to: Address,
    pub l2_block: U256,
    pub l1_block: U256,
    pub l2_timestamp: U256,
    pub value: U256,
    pub data: Bytes,
}

impl FinalizationPayload {
    pub fn encode(&self) -> Bytes {
        ArbitrumFinalizationPayload {
            proof: self.proof.clone(),
            index: self.index,
            l2Sender: self.l2_sender,
            to: self.to,
            l2Block: self.l2_block,
            l1Block: self.l1_block,
            l2Timestamp: self.l2_timestamp,
            value: self.value,
            data: self.data.clone(),
        }
        .abi_encode()
        .into()
    }

    pub fn decode(data: &[u8]) -> BridgeResult<Self> {
        let p = ArbitrumFinalizationPayload::abi_decode(data)
            .map_err(|e| BridgeError::decode("finalization payload", e))?;
        Ok(Self {
            proof: p.proof,
            index: p.index,
            l2_sender: p.l2Sender,
            to: p.to,
            l2_block: p.l2Block,
            l1_block: p.l1Block,
            l2_timestamp: p.l2Timestamp,
            value: p.value,
            data: p.data,
        })
    }
}

/// Decodes the `abi.encode(uint256)` id a bridge adapter returns from a send or receives on finalize.
pub fn decode_transfer_id(data: &[u8]) -> BridgeResult<U256> {
    U256::abi_decode(data).map_err(|e| BridgeError::decode("transfer id", e))
}

pub fn encode_transfer_id(id: U256) -> Bytes {
    id.abi_encode().into()
}
