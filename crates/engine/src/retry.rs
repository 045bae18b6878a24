use configuration::OrchestratorSettings;
use core_types::CollaboratorError;
use std::future::Future;
use std::time::Duration;

/// Timeout and single-retry policy applied to every collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub backoff: Duration,
}

impl CallPolicy {
    pub fn from_settings(settings: &OrchestratorSettings) -> Self {
        Self {
            timeout: settings.request_timeout,
            backoff: settings.retry_backoff,
        }
    }

    /// Runs `call` under the timeout. Unavailability and timeouts are retried once
    /// after the backoff; `NotFound` and `InvalidData` are returned immediately.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, CollaboratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        match self.attempt(call()).await {
            Err(e) if is_transient(&e) => {
                tracing::warn!(operation, error = %e, backoff = ?self.backoff, "Collaborator call failed; retrying once");
                tokio::time::sleep(self.backoff).await;
                self.attempt(call()).await
            }
            other => other,
        }
    }

    async fn attempt<T, Fut>(&self, fut: Fut) -> Result<T, CollaboratorError>
    where
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout(
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}

fn is_transient(err: &CollaboratorError) -> bool {
    matches!(err, CollaboratorError::Unavailable(_) | CollaboratorError::Timeout(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy() -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_millis(50),
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = policy()
            .run("flaky", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CollaboratorError::Unavailable("down".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_failure_is_returned() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<(), _> = policy()
            .run("down", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CollaboratorError::Unavailable("down".to_string()))
            })
            .await;
        assert!(matches!(result, Err(CollaboratorError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<(), _> = policy()
            .run("lookup", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CollaboratorError::NotFound("client".to_string()))
            })
            .await;
        assert!(matches!(result, Err(CollaboratorError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let result: Result<(), _> = policy()
            .run("slow", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(CollaboratorError::Timeout(50))));
    }
}
