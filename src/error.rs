use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// An upstream chain query failed; the caller's scheduler owns retries.
    #[error("rpc error ({context}): {message}")]
    Rpc { context: &'static str, message: String },

    #[error("failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("transfer id {id} matched a received transfer but amounts differ: sent {sent}, received {received}")]
    AmountMismatch { id: U256, sent: U256, received: U256 },

    #[error("ready transfers ({ready}) and ready data ({data}) lengths differ")]
    ReadyLengthMismatch { ready: usize, data: usize },

    #[error("transaction {tx_hash} has no {event} log")]
    MissingLog { tx_hash: B256, event: &'static str },

    #[error("no {0} event found")]
    NoConfirmedNode(&'static str),

    #[error("not enough payloads: got {got}, need more than {f}")]
    NotEnoughPayloads { got: usize, f: usize },

    #[error("could not resolve {what} for {key}")]
    Unresolved { what: &'static str, key: Address },

    #[error("operation {0} cancelled")]
    Cancelled(&'static str),

    #[error("operation {0} timed out")]
    DeadlineExceeded(&'static str),

    #[error("{0}")]
    Close(String),
}

impl BridgeError {
    pub fn rpc(context: &'static str, err: impl std::fmt::Display) -> Self {
        BridgeError::Rpc { context, message: err.to_string() }
    }

    pub fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        BridgeError::Decode { what, message: err.to_string() }
    }
}
