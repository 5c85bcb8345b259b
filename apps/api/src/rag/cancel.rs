use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::rag::error::RagError;

/// Races an external call against the caller's token and a per-call timeout.
/// Either one firing ends the call with `RagError::Cancelled`.
#[derive(Debug, Clone)]
pub struct CallGuard {
    token: CancellationToken,
    timeout: Duration,
}

impl CallGuard {
    pub fn new(token: CancellationToken, timeout: Duration) -> Self {
        Self { token, timeout }
    }

    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, RagError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(RagError::Cancelled),
            result = tokio::time::timeout(self.timeout, fut) => result.map_err(|_| RagError::Cancelled),
        }
    }

    pub fn check(&self) -> Result<(), RagError> {
        if self.token.is_cancelled() {
            Err(RagError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completed_call_passes_through() {
        let guard = CallGuard::new(CancellationToken::new(), Duration::from_secs(5));
        assert_eq!(guard.run(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let guard = CallGuard::new(token, Duration::from_secs(5));
        let result = guard.run(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(RagError::Cancelled)));
        assert!(guard.check().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_cancelled() {
        let guard = CallGuard::new(CancellationToken::new(), Duration::from_millis(50));
        let result = guard.run(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(RagError::Cancelled)));
    }
}
