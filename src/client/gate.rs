//! Minimum-delay gate between remote sends
//!
//! The gate is the rate-limiting mechanism: each send waits until the
//! configured minimum delay has elapsed since the previous one.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cooperative rate gate enforcing a minimum delay between sends
#[derive(Debug)]
pub struct RateGate {
    min_delay: Duration,
    last_send: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Creates a gate that has not seen a send yet
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_send: Mutex::new(None),
        }
    }

    /// Calculates the time left before the next send may go out
    ///
    /// Returns None if a send can be made now, or the duration to wait otherwise.
    pub fn time_until_ready(&self, last_send: Option<Instant>, now: Instant) -> Option<Duration> {
        let last = last_send?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_delay {
            Some(self.min_delay - elapsed)
        } else {
            None
        }
    }

    /// Blocks until a send is allowed, then records it
    ///
    /// The lock is held across the sleep so concurrent callers queue behind
    /// each other instead of all waking at the same instant.
    pub async fn wait(&self) {
        let mut last_send = self.last_send.lock().await;

        if let Some(wait) = self.time_until_ready(*last_send, Instant::now()) {
            tracing::trace!("Rate gate waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }

        *last_send = Some(Instant::now());
    }
}
