//! Per-destination spacing of forwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;

type Slot = Arc<AsyncMutex<Option<Instant>>>;

/// Keeps forwards to the same destination at least `min_interval` apart.
///
/// Each destination has its own slot, so a wait on one destination never
/// delays another. Slots that nobody holds and whose last forward is at least
/// `min_interval` old are dropped, so the map only tracks recently active
/// destinations.
#[derive(Debug)]
pub struct ForwardThrottle {
    min_interval: Duration,
    slots: Mutex<HashMap<i64, Slot>>,
}

/// Exclusive hold on one destination's slot.
///
/// Call [`ThrottleGuard::record`] after a successful forward; dropping the
/// guard without recording leaves the previous timestamp in place.
#[derive(Debug)]
pub struct ThrottleGuard {
    slot: OwnedMutexGuard<Option<Instant>>,
}

impl ThrottleGuard {
    /// Stamp the current time as this destination's last forward.
    pub fn record(mut self) {
        *self.slot = Some(Instant::now());
    }
}

impl ForwardThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, destination: i64) -> Slot {
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.retain(|_, slot| self.is_live(slot));
        slots.entry(destination).or_default().clone()
    }

    /// A slot is live while someone holds or waits on it, or while its last
    /// forward still delays the next one.
    fn is_live(&self, slot: &Slot) -> bool {
        if Arc::strong_count(slot) > 1 {
            return true;
        }
        match slot.try_lock() {
            Ok(last) => (*last).map_or(false, |at| at.elapsed() < self.min_interval),
            Err(_) => true,
        }
    }

    /// Wait until `destination` may receive another forward.
    pub async fn acquire(&self, destination: i64) -> ThrottleGuard {
        let slot = self.slot(destination).lock_owned().await;

        if let Some(last) = *slot {
            let ready_at = last + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                debug!(destination, wait_ms = wait.as_millis() as u64, "Throttling forward");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        ThrottleGuard { slot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_forward_is_immediate() {
        let throttle = ForwardThrottle::new(Duration::from_secs(2));
        let start = Instant::now();
        throttle.acquire(1).await.record();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_destination_is_spaced() {
        let throttle = ForwardThrottle::new(Duration::from_secs(2));
        let start = Instant::now();

        throttle.acquire(1).await.record();
        throttle.acquire(1).await.record();
        assert!(start.elapsed() >= Duration::from_secs(2));

        throttle.acquire(1).await.record();
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_wait() {
        let throttle = ForwardThrottle::new(Duration::from_secs(2));
        throttle.acquire(1).await.record();
        tokio::time::advance(Duration::from_millis(1500)).await;

        let before = Instant::now();
        throttle.acquire(1).await.record();
        let waited = before.elapsed();
        assert!(waited >= Duration::from_millis(500));
        assert!(waited < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_destinations_are_independent() {
        let throttle = ForwardThrottle::new(Duration::from_secs(2));
        let start = Instant::now();
        throttle.acquire(1).await.record();
        throttle.acquire(2).await.record();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecorded_guard_does_not_delay() {
        let throttle = ForwardThrottle::new(Duration::from_secs(2));
        let start = Instant::now();
        drop(throttle.acquire(1).await);
        throttle.acquire(1).await.record();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    fn tracked(throttle: &ForwardThrottle) -> Vec<i64> {
        let mut ids: Vec<i64> = throttle.slots.lock().unwrap().keys().copied().collect();
        ids.sort();
        ids
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_destinations_are_dropped() {
        let throttle = ForwardThrottle::new(Duration::from_secs(2));
        throttle.acquire(1).await.record();
        throttle.acquire(2).await.record();
        assert_eq!(tracked(&throttle), vec![1, 2]);

        tokio::time::advance(Duration::from_secs(3)).await;
        throttle.acquire(3).await.record();
        assert_eq!(tracked(&throttle), vec![3]);

        // A recent stamp is kept and still spaces the next forward
        let start = Instant::now();
        throttle.acquire(3).await.record();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_held_slot_is_not_dropped() {
        let throttle = ForwardThrottle::new(Duration::from_secs(2));
        let guard = throttle.acquire(1).await;
        throttle.acquire(2).await.record();
        assert_eq!(tracked(&throttle), vec![1, 2]);
        guard.record();
    }
}
