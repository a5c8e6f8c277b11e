//! Maps correlator output onto the transfer records the rebalancer consumes.

use alloy::primitives::{Address, Bytes, U256};

use crate::error::{BridgeError, BridgeResult};
use crate::models::{
    LiquidityTransferred, NetworkSelector, PendingTransfer, Transfer, TransferStage, TransferStatus,
};

/// The fixed half of every transfer a reconciler reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferEndpoints {
    pub local_selector: NetworkSelector,
    pub remote_selector: NetworkSelector,
    pub sender: Address,
    pub receiver: Address,
}

pub fn to_pending_transfers(
    endpoints: &TransferEndpoints,
    local_token: Address,
    remote_token: Address,
    not_ready: &[LiquidityTransferred],
    ready: &[LiquidityTransferred],
    ready_data: &[Bytes],
) -> BridgeResult<Vec<PendingTransfer>> {
    if ready.len() != ready_data.len() {
        return Err(BridgeError::ReadyLengthMismatch {
            ready: ready.len(),
            data: ready_data.len(),
        });
    }

    let transfer = |event: &LiquidityTransferred, bridge_data: Bytes, stage: TransferStage| Transfer {
        from: endpoints.local_selector,
        to: endpoints.remote_selector,
        sender: endpoints.sender,
        receiver: endpoints.receiver,
        local_token,
        remote_token,
        amount: event.amount,
        date: event.meta.block_timestamp.unwrap_or(0),
        bridge_data,
        stage,
        native_bridge_fee: U256::ZERO,
    };

    let mut out = Vec::with_capacity(not_ready.len() + ready.len());
    for event in not_ready {
        out.push(PendingTransfer {
            transfer: transfer(event, Bytes::new(), TransferStage::RebalanceConfirmed),
            status: TransferStatus::NotReady,
            id: event.meta.transfer_id(),
        });
    }
    for (event, data) in ready.iter().zip(ready_data) {
        if data.is_empty() {
            return Err(BridgeError::decode(
                "ready transfer data",
                format!("transfer {} is ready without finalization data", event.meta.transfer_id()),
            ));
        }
        out.push(PendingTransfer {
            transfer: transfer(event, data.clone(), TransferStage::FinalizeReady),
            status: TransferStatus::Ready,
            id: event.meta.transfer_id(),
        });
    }
    Ok(out)
}
