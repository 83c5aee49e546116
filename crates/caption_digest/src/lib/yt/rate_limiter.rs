use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};

/// Enforces a minimum spacing between outbound calls.
///
/// One instance is shared (behind an `Arc`) by everything that talks to the
/// caption source, so the spacing holds across a whole run.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits out the remainder of the interval since the previous call, then stamps now
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limiting");
                tokio::time::sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}
