//! Live verification scheduling — a cancellable fixed-period task.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fixed polling period for live verification.
pub const LIVE_INTERVAL: Duration = Duration::from_millis(2000);

/// The recurring-polling run. At most one exists at a time: the opaque
/// task handle's presence is both the `running` flag and the guard that
/// makes a second start a no-op.
#[derive(Default)]
pub struct LiveSession {
    handle: Option<JoinHandle<()>>,
}

impl LiveSession {
    pub fn new() -> Self {
        Self { handle: None }
    }

    pub fn running(&self) -> bool {
        self.handle.is_some()
    }

    /// Register the repeating tick. Returns false without touching the
    /// schedule when a timer handle already exists.
    pub fn start<F, Fut>(&mut self, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.handle.is_some() {
            return false;
        }

        self.handle = Some(tokio::spawn(async move {
            let first = tokio::time::Instant::now() + LIVE_INTERVAL;
            let mut interval = tokio::time::interval_at(first, LIVE_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                // Each tick runs detached: a slow upload never delays
                // the next scheduled tick, and cancelling the schedule
                // leaves work already in flight to finish on its own.
                tokio::spawn(tick());
            }
        }));
        tracing::info!(interval_ms = LIVE_INTERVAL.as_millis() as u64, "live schedule registered");
        true
    }

    /// Cancel the timer handle. Idempotent; returns whether a schedule
    /// was actually cancelled.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                tracing::info!("live schedule cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_fire_at_fixed_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut live = LiveSession::new();
        let c = count.clone();
        assert!(live.start(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        live.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_noop() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut live = LiveSession::new();
        let c = count.clone();
        assert!(live.start(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));
        // Exactly one timer: the second registration must be refused.
        assert!(!live.start(|| async {}));
        assert!(live.running());

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        live.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let mut live = LiveSession::new();
        assert!(!live.stop());

        live.start(|| async {});
        assert!(live.stop());
        assert!(!live.stop());
        assert!(!live.running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tick_does_not_delay_schedule() {
        let started = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut live = LiveSession::new();
        let s = started.clone();
        let c = completed.clone();
        live.start(move || {
            let s = s.clone();
            let c = c.clone();
            async move {
                s.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(30)).await;
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(6500)).await;
        // Three ticks fired on schedule even though none has finished.
        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(completed.load(Ordering::SeqCst), 0);
        live.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_inflight_tick_survives_stop() {
        let completed = Arc::new(AtomicUsize::new(0));
        let mut live = LiveSession::new();
        let c = completed.clone();
        live.start(move || {
            let c = c.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(1000)).await;
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        // First tick at 2000ms; stop while its work is still sleeping.
        tokio::time::sleep(Duration::from_millis(2100)).await;
        live.stop();
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }
}
