//! Initialization payload and its entropy/time sources.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One-time payload handed to the core at channel open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitFlags {
    pub user: String,
    /// Unix epoch milliseconds at session start.
    pub current_time: i64,
    /// Per-session entropy in `[0, 1)`.
    pub initial_seed: f64,
}

impl InitFlags {
    /// Returns a reason string when the payload would be rejected by the core.
    pub fn malformed_reason(&self) -> Option<String> {
        if !self.initial_seed.is_finite() {
            return Some("initialSeed must be a finite number".to_string());
        }
        if !(0.0..1.0).contains(&self.initial_seed) {
            return Some(format!(
                "initialSeed must lie in [0, 1), got {}",
                self.initial_seed
            ));
        }
        None
    }
}

/// Wall clock used for `currentTime`.
pub trait Clock {
    fn now_epoch_ms(&self) -> i64;
}

/// Source of the per-session `initialSeed`.
pub trait SeedSource {
    fn next_seed(&mut self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Thread-local RNG; yields a fresh value per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSeed;

impl SeedSource for ThreadRngSeed {
    fn next_seed(&mut self) -> f64 {
        // `Standard` for f64 samples the half-open range [0, 1).
        rand::random::<f64>()
    }
}

/// Deterministic clock for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0
    }
}

/// Deterministic seed for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSeed(pub f64);

impl SeedSource for FixedSeed {
    fn next_seed(&mut self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{InitFlags, SeedSource, ThreadRngSeed};
    use serde_json::json;

    fn flags(seed: f64) -> InitFlags {
        InitFlags {
            user: "lucas".to_string(),
            current_time: 1_700_000_000_000,
            initial_seed: seed,
        }
    }

    #[test]
    fn serializes_with_core_field_names() {
        let value = serde_json::to_value(flags(0.25)).expect("encode");
        assert_eq!(
            value,
            json!({"user": "lucas", "currentTime": 1700000000000_i64, "initialSeed": 0.25})
        );
    }

    #[test]
    fn seed_range_is_half_open() {
        assert!(flags(0.0).malformed_reason().is_none());
        assert!(flags(0.999).malformed_reason().is_none());
        assert!(flags(1.0).malformed_reason().is_some());
        assert!(flags(-0.1).malformed_reason().is_some());
        assert!(flags(f64::NAN).malformed_reason().is_some());
    }

    #[test]
    fn thread_rng_seed_stays_in_range() {
        let mut source = ThreadRngSeed;
        for _ in 0..64 {
            let seed = source.next_seed();
            assert!((0.0..1.0).contains(&seed));
        }
    }
}
