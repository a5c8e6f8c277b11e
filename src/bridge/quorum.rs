use alloy::primitives::{Bytes, U256};

use crate::codec::RetryableTicketParams;
use crate::error::{BridgeError, BridgeResult};

/// Picks, per fee field, the (f+1)-th highest value across all reporters.
///
/// Selection is column-wise: the result need not equal any single submission, but each field
/// is at least as high as what `f + 1` reporters proposed and no higher than what the rest did.
pub fn quorumized_retryable_params(payloads: &[Bytes], f: usize) -> BridgeResult<Bytes> {
    if payloads.len() <= f {
        return Err(BridgeError::NotEnoughPayloads { got: payloads.len(), f });
    }

    let decoded = payloads
        .iter()
        .map(|p| RetryableTicketParams::decode(p))
        .collect::<BridgeResult<Vec<_>>>()?;

    let index = decoded.len() - f - 1;
    let pick = |field: fn(&RetryableTicketParams) -> U256| {
        let mut column: Vec<U256> = decoded.iter().map(field).collect();
        column.sort_unstable();
        column[index]
    };

    let selected = RetryableTicketParams {
        gas_limit: pick(|p| p.gas_limit),
        max_submission_cost: pick(|p| p.max_submission_cost),
        max_fee_per_gas: pick(|p| p.max_fee_per_gas),
    };
    tracing::debug!(
        payloads = payloads.len(),
        f,
        gas_limit = %selected.gas_limit,
        max_submission_cost = %selected.max_submission_cost,
        max_fee_per_gas = %selected.max_fee_per_gas,
        "selected quorum retryable params"
    );
    Ok(selected.encode())
}

/// Directions without a fee payload still require a quorum of (empty) submissions.
pub fn quorumized_empty_payload(payloads: &[Bytes], f: usize) -> BridgeResult<Bytes> {
    if payloads.len() <= f {
        return Err(BridgeError::NotEnoughPayloads { got: payloads.len(), f });
    }
    Ok(Bytes::new())
}
