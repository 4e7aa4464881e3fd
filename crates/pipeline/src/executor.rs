//! Bounded-parallelism batch executor.
//!
//! Drives an async handler over a batch of items with a semaphore-capped
//! number of handlers in flight. A handler failure is caught and counted,
//! never propagated to siblings. A cancellation signal skips items that
//! have not started yet; in-flight handlers run to completion, so a
//! cancelled batch ends in a consistent partial state.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use tracing::warn;

use crate::error::PipelineError;

/// Smallest allowed worker cap.
pub const MIN_CONCURRENCY: usize = 1;
/// Largest allowed worker cap.
pub const MAX_CONCURRENCY: usize = 12;
/// Cap used when the caller does not specify one.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Clamp a requested worker cap into the supported range.
pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
}

/// Cooperative cancellation signal shared between the server and the
/// executor. Cloning shares the same underlying flag.
#[derive(Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    /// Create a fresh, untriggered signal.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trigger cancellation. Idempotent.
    pub fn cancel(&self) {
        // send_replace stores the value even with no receivers alive
        self.tx.send_replace(true);
    }

    /// Whether cancellation has been triggered.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate outcome of one batch execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Handlers that returned Ok
    pub completed: u64,
    /// Handlers that returned Err or panicked
    pub failed: u64,
    /// Items skipped because cancellation fired before they started
    pub skipped: u64,
}

/// Run `handler` over every item with at most `concurrency` handlers
/// active simultaneously (clamped to the supported range).
///
/// Returns only after every item has been accounted for. Handler
/// invocations equal the item count unless cancellation skips the tail.
/// No completion-order guarantee.
pub async fn run_all<T, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    cancel: CancelSignal,
    handler: F,
) -> BatchOutcome
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PipelineError>> + Send,
{
    let handler = Arc::new(handler);
    let semaphore = Arc::new(Semaphore::new(clamp_concurrency(concurrency)));
    let completed = Arc::new(AtomicU64::new(0));
    let failed = Arc::new(AtomicU64::new(0));
    let skipped = Arc::new(AtomicU64::new(0));

    let mut tasks = Vec::with_capacity(items.len());
    for item in items {
        let handler = Arc::clone(&handler);
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        let completed = Arc::clone(&completed);
        let failed = Arc::clone(&failed);
        let skipped = Arc::clone(&skipped);

        tasks.push(tokio::spawn(async move {
            // Closed semaphore cannot happen; treat it like cancellation
            let Ok(_permit) = semaphore.acquire_owned().await else {
                skipped.fetch_add(1, Ordering::Relaxed);
                return;
            };

            if cancel.is_cancelled() {
                skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }

            match handler(item).await {
                Ok(()) => {
                    completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    warn!(error = %err, "item handler failed");
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    for task in tasks {
        if let Err(err) = task.await {
            // A panicked handler counts as a failure, not a batch abort
            warn!(error = %err, "item handler panicked");
            failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    BatchOutcome {
        completed: completed.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
        skipped: skipped.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI64;
    use std::time::Duration;

    #[test]
    fn cancel_signal_flag_is_observable_without_receivers() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());

        // No watch receiver is alive; the flag must still stick
        signal.cancel();
        assert!(signal.is_cancelled());

        // Clones share the flag, and cancel is idempotent
        let clone = signal.clone();
        assert!(clone.is_cancelled());
        clone.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn concurrency_is_clamped() {
        assert_eq!(clamp_concurrency(0), 1);
        assert_eq!(clamp_concurrency(1), 1);
        assert_eq!(clamp_concurrency(4), 4);
        assert_eq!(clamp_concurrency(12), 12);
        assert_eq!(clamp_concurrency(100), 12);
    }

    #[tokio::test]
    async fn every_item_is_invoked_exactly_once() {
        let invocations = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&invocations);

        let outcome = run_all(
            (0..50).collect::<Vec<i64>>(),
            4,
            CancelSignal::new(),
            move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
            },
        )
        .await;

        assert_eq!(invocations.load(Ordering::Relaxed), 50);
        assert_eq!(outcome.completed, 50);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.skipped, 0);
    }

    #[tokio::test]
    async fn cap_bounds_simultaneous_handlers() {
        let cap = 3usize;
        let active = Arc::new(AtomicI64::new(0));
        let high_water = Arc::new(AtomicI64::new(0));

        let a = Arc::clone(&active);
        let hw = Arc::clone(&high_water);
        let outcome = run_all(
            (0..40).collect::<Vec<i64>>(),
            cap,
            CancelSignal::new(),
            move |_| {
                let active = Arc::clone(&a);
                let high_water = Arc::clone(&hw);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        )
        .await;

        assert_eq!(outcome.completed, 40);
        assert!(high_water.load(Ordering::SeqCst) <= cap as i64);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_siblings() {
        let outcome = run_all(
            (0..10).collect::<Vec<i64>>(),
            2,
            CancelSignal::new(),
            |n| async move {
                if n == 3 {
                    Err(PipelineError::NotFound("variant 3".to_string()))
                } else {
                    Ok(())
                }
            },
        )
        .await;

        assert_eq!(outcome.completed, 9);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn panicking_handler_is_counted_as_failed() {
        let outcome = run_all(
            vec![1i64, 2, 3],
            1,
            CancelSignal::new(),
            |n| async move {
                if n == 2 {
                    panic!("boom");
                }
                Ok(())
            },
        )
        .await;

        assert_eq!(outcome.completed, 2);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn cancellation_skips_unstarted_items() {
        let cancel = CancelSignal::new();
        let trigger = cancel.clone();

        let outcome = run_all(
            (0..20).collect::<Vec<i64>>(),
            1,
            cancel,
            move |n| {
                let trigger = trigger.clone();
                async move {
                    if n == 4 {
                        trigger.cancel();
                    }
                    Ok(())
                }
            },
        )
        .await;

        // Serial execution: items 0..=4 ran, the rest were skipped
        assert_eq!(outcome.completed, 5);
        assert_eq!(outcome.skipped, 15);
        assert_eq!(outcome.completed + outcome.skipped, 20);
    }
}
