//! Reading freshness: wall clock and inter-reading deltas

/// Source of wall-clock milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Tracks the timestamp of the previous reading of one sensor.
///
/// Starts from the time the watch was requested, so the first reading
/// reports how long the sensor took to deliver.
#[derive(Debug, Clone, Copy)]
pub struct LatencyTracker {
    last: i64,
}

impl LatencyTracker {
    pub fn starting_at(now_ms: i64) -> Self {
        Self { last: now_ms }
    }

    /// Record a reading timestamp.
    ///
    /// Returns the delta to the previous timestamp, or `None` when it is zero
    /// (a repeated delivery of the same reading).
    pub fn observe(&mut self, timestamp: i64) -> Option<i64> {
        let delta = timestamp.saturating_sub(self.last);
        self.last = timestamp;
        (delta != 0).then_some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_reports_delta() {
        let mut tracker = LatencyTracker::starting_at(900);
        assert_eq!(tracker.observe(1000), Some(100));
        assert_eq!(tracker.observe(1100), Some(100));
        assert_eq!(tracker.observe(1350), Some(250));
    }

    #[test]
    fn test_observe_skips_duplicates() {
        let mut tracker = LatencyTracker::starting_at(0);
        assert_eq!(tracker.observe(500), Some(500));
        assert_eq!(tracker.observe(500), None);
        assert_eq!(tracker.observe(400), Some(-100));
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
