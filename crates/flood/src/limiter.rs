//! Bounded admission of in-flight submission tasks.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of submissions in flight at once.
///
/// [`admit`](Self::admit) suspends the caller while the bound is
/// reached and resumes one waiter when a previously admitted task
/// finishes. Tokio's semaphore queues waiters fairly, so no caller
/// starves. A bound of 1 degenerates to fully sequential submission.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    permits: Arc<Semaphore>,
    bound: usize,
}

/// Held for the lifetime of one admitted task; releases the slot on
/// drop at any exit path.
#[derive(Debug)]
pub struct InFlightPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// Create a limiter with the given bound (must be >= 1).
    pub fn new(bound: usize) -> Self {
        debug_assert!(bound >= 1, "concurrency bound must be at least 1");
        Self {
            permits: Arc::new(Semaphore::new(bound)),
            bound,
        }
    }

    /// Admit one task, suspending while the bound is reached.
    pub async fn admit(&self) -> InFlightPermit {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed");
        InFlightPermit { _permit: permit }
    }

    /// The configured bound.
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// How many more tasks could be admitted right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
