//! Delayed Action Scheduler
//!
//! Runs a closure after a configured delay on the tokio runtime, so the
//! caller that requested a transition returns immediately. A panic inside
//! the action is caught at the task boundary and logged; it never takes the
//! runtime worker down.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::error;

use crate::error::AccessError;

/// Shared scheduling facility. Cheap to clone; carries no per-instance
/// state beyond the runtime handle.
#[derive(Clone)]
pub struct Scheduler {
    runtime: Handle,
}

impl Scheduler {
    /// Capture the current tokio runtime. Fails with `Scheduling` when
    /// called outside a runtime, which the dispatcher reports to the host.
    pub fn new() -> Result<Self, AccessError> {
        Handle::try_current()
            .map(|runtime| Self { runtime })
            .map_err(|e| AccessError::Scheduling(e.to_string()))
    }

    pub fn from_handle(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Run `action` once after `after`. The returned handle cancels it.
    pub fn schedule<F>(&self, after: Duration, action: F) -> DelayHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(action)) {
                error!("Scheduled action panicked: {}", panic_message(&panic));
            }
        });
        DelayHandle { task }
    }
}

/// Cancelable handle for one scheduled action.
pub struct DelayHandle {
    task: JoinHandle<()>,
}

impl DelayHandle {
    /// Idempotent; a no-op if the action already ran.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_schedule_fires_once() {
        let scheduler = Scheduler::new().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();

        let handle = scheduler.schedule(Duration::from_millis(10), move || {
            fired2.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());

        // Cancel after completion is a no-op.
        handle.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_prevents_action() {
        let scheduler = Scheduler::new().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();

        let handle = scheduler.schedule(Duration::from_millis(30), move || {
            fired2.fetch_add(1, Ordering::SeqCst);
        });
        handle.cancel();
        handle.cancel(); // idempotent

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let scheduler = Scheduler::new().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();

        scheduler.schedule(Duration::from_millis(5), || panic!("boom"));
        scheduler.schedule(Duration::from_millis(20), move || {
            fired2.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        // The second action still ran.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
