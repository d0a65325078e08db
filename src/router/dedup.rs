//! Short-window duplicate suppression

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default suppression window
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_millis(1000);

/// Remembers the last admitted intent signature
///
/// A single slot: only an immediate repeat of the most recent intent is
/// suppressed. The slot is overwritten on admission, before dispatch.
#[derive(Debug)]
pub struct Deduplicator {
    window: Duration,
    last: Mutex<Option<(String, Instant)>>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_WINDOW)
    }
}

impl Deduplicator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit `signature` seen at `at`, or reject it as a duplicate
    pub fn admit(&self, signature: &str, at: Instant) -> bool {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some((previous, seen_at)) = last.as_ref() {
            if previous == signature && at.saturating_duration_since(*seen_at) < self.window {
                return false;
            }
        }

        *last = Some((signature.to_string(), at));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_within_window_rejected() {
        let dedup = Deduplicator::default();
        let start = Instant::now();

        assert!(dedup.admit("open-btc", start));
        assert!(!dedup.admit("open-btc", start + Duration::from_millis(200)));
    }

    #[test]
    fn test_repeat_after_window_admitted() {
        let dedup = Deduplicator::default();
        let start = Instant::now();

        assert!(dedup.admit("open-btc", start));
        assert!(dedup.admit("open-btc", start + Duration::from_millis(1500)));
    }

    #[test]
    fn test_different_signature_replaces_slot() {
        let dedup = Deduplicator::new(Duration::from_secs(10));
        let start = Instant::now();

        assert!(dedup.admit("a", start));
        assert!(dedup.admit("b", start + Duration::from_millis(1)));
        // Only the latest signature is remembered
        assert!(dedup.admit("a", start + Duration::from_millis(2)));
    }

    #[test]
    fn test_rejected_repeat_does_not_extend_window() {
        let dedup = Deduplicator::default();
        let start = Instant::now();

        assert!(dedup.admit("x", start));
        assert!(!dedup.admit("x", start + Duration::from_millis(900)));
        assert!(dedup.admit("x", start + Duration::from_millis(1000)));
    }
}
