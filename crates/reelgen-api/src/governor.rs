//! Sliding-window request quota per client identity.
//!
//! Each identity owns the timestamps of its admitted requests inside the
//! trailing window. Purge, check and append run under one lock, so two
//! concurrent requests can never both take the last slot.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Time source for the governor.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: StdMutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: StdMutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

/// Admits or rejects requests against a per-identity sliding window.
#[derive(Clone)]
pub struct SlidingWindowGovernor {
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowGovernor {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Admit a request from `identity` if fewer than `max_requests` were
    /// admitted within the last `window`.
    ///
    /// A rejected request is not recorded.
    pub async fn admit(&self, identity: &str, max_requests: usize, window: Duration) -> bool {
        let now = self.clock.now();
        let window_start = now.checked_sub(window);

        let mut windows = self.windows.lock().await;

        // Expired timestamps are dropped for every identity; empty windows go with them.
        if let Some(start) = window_start {
            windows.retain(|_, timestamps| {
                while timestamps.front().is_some_and(|t| *t <= start) {
                    timestamps.pop_front();
                }
                !timestamps.is_empty()
            });
        }

        let count = windows.get(identity).map_or(0, VecDeque::len);
        if count >= max_requests {
            debug!(identity, count, max_requests, "Sliding window quota exhausted");
            return false;
        }

        windows.entry(identity.to_string()).or_default().push_back(now);
        true
    }

    /// Number of identities currently holding timestamps.
    pub async fn tracked_identities(&self) -> usize {
        self.windows.lock().await.len()
    }
}

impl Default for SlidingWindowGovernor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(15 * 60);

    fn governor() -> (SlidingWindowGovernor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (SlidingWindowGovernor::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_quota_and_recovery() {
        let (governor, clock) = governor();

        for _ in 0..3 {
            assert!(governor.admit("10.0.0.1", 3, WINDOW).await);
        }
        assert!(!governor.admit("10.0.0.1", 3, WINDOW).await);

        clock.advance(WINDOW);
        assert!(governor.admit("10.0.0.1", 3, WINDOW).await);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let (governor, _clock) = governor();

        assert!(governor.admit("a", 1, WINDOW).await);
        assert!(!governor.admit("a", 1, WINDOW).await);
        assert!(governor.admit("b", 1, WINDOW).await);
    }

    #[tokio::test]
    async fn test_rejection_does_not_consume_quota() {
        let (governor, clock) = governor();

        assert!(governor.admit("a", 2, WINDOW).await);
        clock.advance(Duration::from_secs(60));
        assert!(governor.admit("a", 2, WINDOW).await);

        // Repeated rejections must not push the window forward.
        for _ in 0..5 {
            clock.advance(Duration::from_secs(60));
            assert!(!governor.admit("a", 2, WINDOW).await);
        }

        // At 15 minutes only the first admission has expired.
        clock.advance(Duration::from_secs(8 * 60));
        assert!(governor.admit("a", 2, WINDOW).await);
        assert!(!governor.admit("a", 2, WINDOW).await);
    }

    #[tokio::test]
    async fn test_boundary_timestamp_is_purged() {
        let (governor, clock) = governor();

        assert!(governor.admit("a", 1, WINDOW).await);
        clock.advance(WINDOW - Duration::from_secs(1));
        assert!(!governor.admit("a", 1, WINDOW).await);
        clock.advance(Duration::from_secs(1));
        assert!(governor.admit("a", 1, WINDOW).await);
    }

    #[tokio::test]
    async fn test_empty_windows_are_dropped() {
        let (governor, clock) = governor();

        for identity in ["a", "b", "c"] {
            assert!(governor.admit(identity, 3, WINDOW).await);
        }
        assert_eq!(governor.tracked_identities().await, 3);

        clock.advance(WINDOW + Duration::from_secs(1));
        assert!(governor.admit("d", 3, WINDOW).await);
        assert_eq!(governor.tracked_identities().await, 1);
    }

    #[tokio::test]
    async fn test_zero_quota_rejects() {
        let (governor, _clock) = governor();
        assert!(!governor.admit("a", 0, WINDOW).await);
        assert_eq!(governor.tracked_identities().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_respect_quota() {
        let governor = SlidingWindowGovernor::new();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let governor = governor.clone();
                tokio::spawn(async move { governor.admit("shared", 3, WINDOW).await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
    }
}
