//! Pacing policy: how long to wait before each network attempt.
//!
//! Every attempt is preceded by a delay drawn uniformly from the configured
//! `[min, max]` bounds — the jitter keeps the request pattern irregular so
//! the remote service's abuse defenses don't see a fixed cadence. Retries
//! multiply the draw by `2^attempt`. The backoff deliberately grows without
//! bound: a server that is rate-limiting or banning us wants silence, and
//! each further attempt should get quieter, not louder.

use rand::Rng;
use std::time::Duration;

/// Per-job pacing policy.
///
/// Constructed only from a validated [`crate::config::JobConfig`], so
/// `0 <= min <= max` holds by the time a policy exists.
#[derive(Debug, Clone, Copy)]
pub struct PacingPolicy {
    min_secs: f64,
    max_secs: f64,
}

impl PacingPolicy {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        debug_assert!(
            0.0 <= min_secs && min_secs <= max_secs,
            "bounds validated by JobConfigBuilder"
        );
        Self { min_secs, max_secs }
    }

    /// Delay before attempt `attempt` (0 = first attempt, >0 = retry).
    ///
    /// Attempt 0 draws uniformly from `[min, max]`; attempt `a` draws from
    /// `[min * 2^a, max * 2^a]`.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let base = if self.min_secs == self.max_secs {
            self.min_secs
        } else {
            rand::thread_rng().gen_range(self.min_secs..=self.max_secs)
        };
        let secs = base * 2f64.powi(attempt as i32);
        Duration::from_secs_f64(secs)
    }
}
