//! Time source for the polling loop.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Source of "now" and of the inter-pass delay.
///
/// Tests drive the loop with Tokio's paused clock, so [`TokioClock`] is enough
/// for deterministic runs; other implementations can replace it wholesale.
#[async_trait::async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by `tokio::time`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock;
        let start = clock.now();

        clock.sleep(Duration::from_secs(30)).await;

        assert!(clock.now().duration_since(start) >= Duration::from_secs(30));
    }
}
