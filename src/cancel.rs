//! Cooperative cancellation for a running campaign
//!
//! The engine checks the flag at the top of every state-machine iteration and
//! before every sleep; a cancelled campaign stops at the next checkpoint with
//! whatever was collected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// A cloneable cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; wakes every pending wait
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.inner.notify.notified();
            // Re-check after registering so a cancel between the check and
            // the registration cannot be missed
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Sleeps for `duration` unless the flag fires first
///
/// Returns true if the full sleep elapsed, false if it was cut short by
/// cancellation (or the flag was already set).
pub async fn sleep_unless_cancelled(cancel: &CancelFlag, duration: Duration) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_starts_clear() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_to_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_sleep_completes_when_not_cancelled() {
        let flag = CancelFlag::new();
        assert!(sleep_unless_cancelled(&flag, Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_sleep_skipped_when_already_cancelled() {
        let flag = CancelFlag::new();
        flag.cancel();
        assert!(!sleep_unless_cancelled(&flag, Duration::from_secs(300)).await);
    }

    #[tokio::test]
    async fn test_sleep_interrupted_by_cancel() {
        let flag = CancelFlag::new();
        let waiter = flag.clone();
        let handle =
            tokio::spawn(
                async move { sleep_unless_cancelled(&waiter, Duration::from_secs(300)).await },
            );
        tokio::time::sleep(Duration::from_millis(10)).await;
        flag.cancel();
        assert!(!handle.await.unwrap());
    }
}
