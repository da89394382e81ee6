//! Bounded polling for effects the cluster applies asynchronously

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Exponential backoff with a hard ceiling on total wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max_interval: Duration,
    pub ceiling: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            max_interval: Duration::from_secs(1),
            ceiling: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    fn next_interval(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_interval)
    }
}

/// Poll `probe` until it returns true or the ceiling is reached.
///
/// Returns whether the condition was observed. Hitting the ceiling is not an
/// error: the caller's own assertions decide what it means.
pub async fn wait_until<F, Fut>(what: &str, backoff: Backoff, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + backoff.ceiling;
    let mut interval = backoff.initial;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if probe().await {
            debug!("✅ {} after {} attempt(s)", what, attempts);
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            warn!("⏰ Gave up waiting for {} after {:?}", what, backoff.ceiling);
            return false;
        }

        sleep(interval.min(deadline - now)).await;
        interval = backoff.next_interval(interval);
    }
}
