//! Per-command cooldown tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Once the ledger grows past this, stale entries are swept before the next
/// insert. Keeps the map bounded by active traffic instead of all-time
/// traffic.
const SWEEP_THRESHOLD: usize = 1024;

/// Sliding-window rate limiter keyed by `(channel, invoker)`, one instance
/// per registered command.
#[derive(Default)]
pub struct CooldownLedger {
    entries: RwLock<HashMap<(String, String), Instant>>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow or reject an invocation attempt.
    ///
    /// The window is anchored to the last *successful* pass: a rejected
    /// attempt reports the remaining wait and leaves the timestamp alone.
    pub async fn check(
        &self,
        channel_id: &str,
        invoker_id: &str,
        window: Duration,
    ) -> Result<(), Duration> {
        if window.is_zero() {
            return Ok(());
        }

        let now = Instant::now();
        let key = (channel_id.to_string(), invoker_id.to_string());
        let mut entries = self.entries.write().await;

        if let Some(last) = entries.get(&key) {
            let elapsed = now.duration_since(*last);
            if elapsed < window {
                return Err(window - elapsed);
            }
        }

        if entries.len() >= SWEEP_THRESHOLD {
            let before = entries.len();
            entries.retain(|_, last| now.duration_since(*last) < window);
            debug!("swept {} stale cooldown entries", before - entries.len());
        }

        entries.insert(key, now);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_window_never_limits() {
        let ledger = CooldownLedger::new();
        for _ in 0..3 {
            assert!(ledger.check("c1", "u1", Duration::ZERO).await.is_ok());
        }
        assert_eq!(ledger.len().await, 0);
    }

    #[tokio::test]
    async fn test_sliding_window() {
        let ledger = CooldownLedger::new();
        let window = Duration::from_millis(80);

        assert!(ledger.check("c1", "u1", window).await.is_ok());

        let remaining = ledger.check("c1", "u1", window).await.unwrap_err();
        assert!(remaining > Duration::ZERO);
        assert!(remaining <= window);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(ledger.check("c1", "u1", window).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejection_does_not_refresh_window() {
        let ledger = CooldownLedger::new();
        let window = Duration::from_millis(80);

        assert!(ledger.check("c1", "u1", window).await.is_ok());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ledger.check("c1", "u1", window).await.is_err());

        // 50ms + 50ms puts us past the original anchor; if the rejection
        // above had refreshed the timestamp this would still be limited.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ledger.check("c1", "u1", window).await.is_ok());
    }

    #[tokio::test]
    async fn test_scoped_per_channel_and_invoker() {
        let ledger = CooldownLedger::new();
        let window = Duration::from_secs(60);

        assert!(ledger.check("c1", "u1", window).await.is_ok());
        assert!(ledger.check("c1", "u2", window).await.is_ok());
        assert!(ledger.check("c2", "u1", window).await.is_ok());
        assert!(ledger.check("c1", "u1", window).await.is_err());
    }
}
