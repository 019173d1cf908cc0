//! Progress throttling.
//!
//! Rate-limits intermediate progress notifications of a single job so fast
//! engines do not flood subscribers.

use std::time::{Duration, Instant};

/// Rate-limiter for progress updates.
///
/// A zero interval lets every update through. The first update and any
/// forced update (a `finished` record) always pass.
#[derive(Debug)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a new throttle with the specified minimum interval.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// A throttle that never suppresses anything.
    pub const fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Check if this update should be emitted, recording it if so.
    pub fn should_emit(&mut self, force: bool) -> bool {
        let now = Instant::now();
        match self.last_emit {
            Some(last) if !force && now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::unthrottled()
    }
}
