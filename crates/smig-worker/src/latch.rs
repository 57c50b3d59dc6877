//! Completion latch shared by the dispatcher and the workers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Counts outstanding tasks and wakes waiters when the count reaches zero.
///
/// The dispatcher registers the full count with [`add`](Self::add) before
/// sending the first task, so a fast worker can never drive the count to
/// zero early.
#[derive(Debug, Default)]
pub struct CompletionLatch {
    pending: AtomicUsize,
    notify: Notify,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `n` more outstanding tasks.
    pub fn add(&self, n: usize) {
        self.pending.fetch_add(n, Ordering::SeqCst);
    }

    /// Mark one task finished, regardless of its outcome.
    pub fn done(&self) {
        let previous = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        if previous == Ok(1) {
            self.notify.notify_waiters();
        }
    }

    /// Number of tasks still outstanding.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until every registered task has signalled. Returns immediately
    /// when nothing is outstanding.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking so a concurrent `done` is not lost.
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Guard that calls [`done`](Self::done) when dropped, so a task signals
    /// even if it fails or panics.
    pub fn guard(self: &Arc<Self>) -> LatchGuard {
        LatchGuard {
            latch: Arc::clone(self),
        }
    }
}

/// Signals its latch on drop.
#[derive(Debug)]
pub struct LatchGuard {
    latch: Arc<CompletionLatch>,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.latch.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_immediately_at_zero() {
        let latch = CompletionLatch::new();
        tokio::time::timeout(Duration::from_millis(100), latch.wait())
            .await
            .expect("empty latch must not block");
    }

    #[tokio::test]
    async fn test_wait_blocks_until_all_done() {
        let latch = Arc::new(CompletionLatch::new());
        latch.add(3);

        let waiter = {
            let latch = Arc::clone(&latch);
            tokio::spawn(async move { latch.wait().await })
        };

        latch.done();
        latch.done();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        latch.done();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert_eq!(latch.pending(), 0);
    }

    #[tokio::test]
    async fn test_guard_signals_on_panic() {
        let latch = Arc::new(CompletionLatch::new());
        latch.add(1);

        let guard = latch.guard();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("task blew up");
        });
        assert!(handle.await.is_err());

        tokio::time::timeout(Duration::from_secs(1), latch.wait())
            .await
            .expect("guard must signal on unwind");
    }

    #[test]
    fn test_wait_wakes_on_last_done() {
        let latch = CompletionLatch::new();
        latch.add(2);

        let mut wait = tokio_test::task::spawn(latch.wait());
        tokio_test::assert_pending!(wait.poll());

        latch.done();
        tokio_test::assert_pending!(wait.poll());

        latch.done();
        assert!(wait.is_woken());
        tokio_test::assert_ready!(wait.poll());
    }

    #[test]
    fn test_done_does_not_underflow() {
        let latch = CompletionLatch::new();
        latch.done();
        assert_eq!(latch.pending(), 0);
    }
}
