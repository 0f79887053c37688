//! Per-call deadline and cancellation

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation signal carried by every repository call
///
/// A triggered token or an elapsed deadline aborts the in-flight store call;
/// nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

/// Why a guarded call stopped before completing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    DeadlineExceeded,
    Cancelled,
}

impl CallContext {
    /// No deadline and a fresh cancellation token
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::default().deadline_in(timeout)
    }

    pub fn deadline_in(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Drive `future` until it completes, the deadline passes, or the token fires.
    ///
    /// `fallback_timeout` applies only when this context carries no deadline.
    pub async fn run<F: Future>(
        &self,
        fallback_timeout: Option<Duration>,
        future: F,
    ) -> Result<F::Output, Interrupted> {
        let deadline = self
            .deadline
            .or_else(|| fallback_timeout.map(|t| Instant::now() + t));

        let bounded = async {
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, future)
                    .await
                    .map_err(|_| Interrupted::DeadlineExceeded),
                None => Ok(future.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(Interrupted::Cancelled),
            result = bounded => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_without_deadline() {
        let ctx = CallContext::background();
        assert_eq!(ctx.run(None, async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = CallContext::with_timeout(Duration::from_millis(10));
        let result = ctx
            .run(None, tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(result, Err(Interrupted::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_fallback_timeout_applies_without_deadline() {
        let ctx = CallContext::background();
        let result = ctx
            .run(
                Some(Duration::from_millis(10)),
                tokio::time::sleep(Duration::from_secs(5)),
            )
            .await;
        assert_eq!(result, Err(Interrupted::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = CallContext::background().with_cancellation(token);

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.run(None, async { 1 }).await, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_while_running() {
        let token = CancellationToken::new();
        let ctx = CallContext::background().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result = ctx
            .run(None, tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(result, Err(Interrupted::Cancelled));
        canceller.await.unwrap();
    }
}
