//! Run independent per-item operations and collect partial results.
//!
//! There is no cross-item transaction: one failed item never cancels or rolls
//! back its siblings. Failures are returned as data alongside the successes.

use std::future::Future;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::{ErrorKind, MorgenResult};

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSuccess {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub kind: ErrorKind,
    pub error: String,
}

/// Every input item lands in exactly one of the two lists, each in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub succeeded: Vec<BatchSuccess>,
    pub failed: Vec<BatchFailure>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    concurrency: usize,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl BatchExecutor {
    pub fn new(concurrency: usize) -> Self {
        BatchExecutor {
            concurrency: concurrency.max(1),
        }
    }

    /// Run `op` over `(id, item)` pairs with at most `concurrency` in flight.
    pub async fn run<T, F, Fut>(&self, items: Vec<(String, T)>, op: F) -> BatchResult
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = MorgenResult<()>>,
    {
        let total = items.len();
        let outcomes: Vec<(String, MorgenResult<()>)> = stream::iter(items)
            .map(|(id, item)| {
                let fut = op(item);
                async move { (id, fut.await) }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut result = BatchResult::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => result.succeeded.push(BatchSuccess { id }),
                Err(err) => {
                    tracing::debug!(item = %id, "batch item failed: {err}");
                    result.failed.push(BatchFailure {
                        id,
                        kind: err.kind(),
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            total,
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "batch finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MorgenError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn items(ids: &[&str]) -> Vec<(String, String)> {
        ids.iter().map(|id| (id.to_string(), id.to_string())).collect()
    }

    #[tokio::test]
    async fn test_middle_failure_does_not_stop_siblings() {
        let attempted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempted);

        let result = BatchExecutor::default()
            .run(items(&["evt1", "evt2", "evt3"]), move |id| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if id == "evt2" {
                        Err(MorgenError::Upstream {
                            status: 404,
                            message: "Event not found".into(),
                            rate_limit: None,
                            retry_after: None,
                        })
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(attempted.load(Ordering::SeqCst), 3);
        assert_eq!(
            result.succeeded,
            vec![
                BatchSuccess { id: "evt1".into() },
                BatchSuccess { id: "evt3".into() }
            ]
        );
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].id, "evt2");
        assert_eq!(result.failed[0].kind, ErrorKind::Upstream);
        assert!(result.failed[0].error.contains("Event not found"));
    }

    #[tokio::test]
    async fn test_order_follows_input_not_completion() {
        let result = BatchExecutor::new(3)
            .run(
                vec![
                    ("slow".to_string(), 30u64),
                    ("medium".to_string(), 15),
                    ("fast".to_string(), 0),
                ],
                |delay| async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(())
                },
            )
            .await;

        let ids: Vec<_> = result.succeeded.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["slow", "medium", "fast"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let ids: Vec<String> = (0..10).map(|i| format!("evt{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let (in_flight_op, peak_op) = (Arc::clone(&in_flight), Arc::clone(&peak));
        let result = BatchExecutor::new(2)
            .run(items(&id_refs), move |_| {
                let in_flight = Arc::clone(&in_flight_op);
                let peak = Arc::clone(&peak_op);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert_eq!(result.len(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_k_failures_of_n() {
        let result = BatchExecutor::default()
            .run(items(&["a", "b", "c", "d", "e"]), |id| async move {
                if id == "b" || id == "e" {
                    Err(MorgenError::UnknownVirtualId(id))
                } else {
                    Ok(())
                }
            })
            .await;

        assert_eq!(result.succeeded.len(), 3);
        assert_eq!(result.failed.len(), 2);
        assert_eq!(result.len(), 5);
        let failed: Vec<_> = result.failed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(failed, ["b", "e"]);
        assert!(result.failed.iter().all(|f| f.kind == ErrorKind::UnknownVirtualId));
    }
}
