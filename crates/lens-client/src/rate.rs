//! Global outbound rate gate.
//!
//! One [`RateGate`] is shared by every worker; each outbound attempt must
//! acquire a slot first. Slots are spaced `1 / requests_per_second` apart,
//! so the aggregate request rate stays under the configured ceiling no
//! matter how many workers run concurrently.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateGate {
    /// A gate admitting `requests_per_second` calls per second. Zero or
    /// negative disables the gate.
    #[must_use]
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for the next request slot.
    ///
    /// Reserves the slot under the lock, then sleeps outside it so other
    /// workers can queue their own slots in the meantime.
    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let wait = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.min_interval);
            slot.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slots_are_spaced_by_the_interval() {
        let gate = RateGate::new(2.0); // one slot every 500ms
        let start = Instant::now();
        gate.acquire().await;
        gate.acquire().await;
        gate.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_is_shared_across_tasks() {
        let gate = std::sync::Arc::new(RateGate::new(10.0));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..5 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move { gate.acquire().await }));
        }
        for h in handles {
            h.await.unwrap();
        }
        // 5 acquisitions at 10 rps take at least 400ms regardless of task count.
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn zero_rate_disables_the_gate() {
        let gate = RateGate::new(0.0);
        gate.acquire().await; // returns immediately
    }
}
