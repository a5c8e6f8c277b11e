//! Cancellation and deadline handle threaded through every chain query.

use std::future::Future;
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{BridgeError, BridgeResult};

#[derive(Debug, Clone, Default)]
pub struct Ctx {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Ctx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child context that also expires after `timeout`. Cancelling the parent cancels the child.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(match self.deadline {
                Some(d) if d < deadline => d,
                _ => deadline,
            }),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drives `fut` until it completes, the token is cancelled or the deadline passes.
    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> BridgeResult<T>
    where
        F: Future<Output = BridgeResult<T>>,
    {
        if self.token.is_cancelled() {
            return Err(BridgeError::Cancelled(op));
        }
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(d) => sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(BridgeError::Cancelled(op)),
            _ = expired => Err(BridgeError::DeadlineExceeded(op)),
            res = fut => res,
        }
    }
}
