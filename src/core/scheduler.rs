//! One-shot delayed callbacks
//!
//! The quiz flow needs exactly one timer: the interlude pause before a
//! tie-breaker round. It goes through this trait so tests can fire it by
//! hand instead of waiting on a clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Work to run once the delay has passed
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Cancels a scheduled callback; cancelling after it ran is a no-op
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runs a callback once after a delay
pub trait Scheduler: Send + Sync {
    fn schedule_once(&self, delay: Duration, callback: Callback) -> CancelHandle;
}

// =============================================================================
// TOKIO
// =============================================================================

/// Timer backed by the tokio runtime; must be used inside one
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, callback: Callback) -> CancelHandle {
        let handle = CancelHandle::new();
        let guard = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !guard.is_cancelled() {
                callback();
            }
        });
        handle
    }
}

// =============================================================================
// MANUAL
// =============================================================================

struct Scheduled {
    delay: Duration,
    handle: CancelHandle,
    callback: Callback,
}

/// Deterministic scheduler: callbacks wait until `fire_all` is called
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Vec<Scheduled>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks scheduled and not yet fired or cancelled
    pub fn pending_count(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| !s.handle.is_cancelled())
            .count()
    }

    /// Delays of the live callbacks, in scheduling order
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| !s.handle.is_cancelled())
            .map(|s| s.delay)
            .collect()
    }

    /// Run every live callback; returns how many ran
    ///
    /// The queue is drained before running, so callbacks may schedule again.
    pub fn fire_all(&self) -> usize {
        let due: Vec<Scheduled> = std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner));
        let mut fired = 0;
        for scheduled in due {
            if !scheduled.handle.is_cancelled() {
                (scheduled.callback)();
                fired += 1;
            }
        }
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration, callback: Callback) -> CancelHandle {
        let handle = CancelHandle::new();
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Scheduled {
                delay,
                handle: handle.clone(),
                callback,
            });
        handle
    }
}

// =============================================================================
// TESTS
// =============================================================================
