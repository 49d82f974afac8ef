//! Per-host politeness limiter
//!
//! Every request reserves the next free slot for its host; slots are
//! `min_interval` apart. Reservations are made under a lock, so any number
//! of concurrent workers together never exceed one request per interval
//! per host.

use crate::url::host_key;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Shared minimum-interval rate limiter keyed by host
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until a request to this URL's host is allowed
    pub async fn acquire(&self, url: &Url) {
        if self.min_interval.is_zero() {
            return;
        }

        let key = host_key(url).unwrap_or_default();
        let slot = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match slots.get(&key) {
                Some(next) if *next > now => *next,
                _ => now,
            };
            slots.insert(key.clone(), slot + self.min_interval);
            slot
        };

        if slot > Instant::now() {
            tracing::trace!("Waiting {:?} before next request to {}", slot - Instant::now(), key);
            tokio::time::sleep_until(slot).await;
        }
    }
}
