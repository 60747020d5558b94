//! Caller-supplied deadline and cancellation for outbound calls

use crate::{GatewayError, Result};
use std::future::Future;
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation signal attached to a gateway call.
///
/// Both are optional. The whole call, resolution included, is aborted when
/// either fires.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancellation: Option<CancellationToken>,
}

impl CallContext {
    /// Context with neither deadline nor cancellation
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the call once `timeout` has elapsed from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(|token| token.is_cancelled())
            .unwrap_or(false)
    }

    /// Drive `operation` until it completes, the deadline passes or the
    /// token is cancelled, whichever comes first.
    pub async fn run<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(GatewayError::Cancelled),
            _ = deadline => Err(GatewayError::DeadlineExceeded),
            result = operation => result,
        }
    }
}
