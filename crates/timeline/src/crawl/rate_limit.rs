//! Request pacing.
//!
//! A rolling-hour request counter plus a randomized pre-request delay. Both
//! only compute durations; sleeping is left to the caller so the waits can be
//! raced against cancellation.

use std::time::{Duration, Instant};

use rand::Rng;

/// Length of a rate limit window.
pub const WINDOW: Duration = Duration::from_secs(60 * 60);

/// Longest delay a single jitter draw may produce.
pub const MAX_JITTER: Duration = WINDOW;

/// Rolling-hour request limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests_per_hour: u32,
    request_count: u32,
    window_start: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_hour` requests per window.
    ///
    /// A limit of 0 disables the ceiling.
    #[must_use]
    pub fn new(requests_per_hour: u32) -> Self {
        Self {
            requests_per_hour,
            request_count: 0,
            window_start: None,
        }
    }

    /// Account for a request about to be sent at `now`.
    ///
    /// Returns how long to wait before sending it. The window opens at the
    /// first request and resets once more than [`WINDOW`] has elapsed.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let start = match self.window_start {
            Some(start) if now.saturating_duration_since(start) <= WINDOW => start,
            _ => {
                self.window_start = Some(now);
                self.request_count = 0;
                now
            }
        };

        if self.requests_per_hour > 0 && self.request_count >= self.requests_per_hour {
            let wait = WINDOW.saturating_sub(now.saturating_duration_since(start));
            self.window_start = Some(now + wait);
            self.request_count = 1;
            tracing::info!(
                wait_secs = wait.as_secs(),
                limit = self.requests_per_hour,
                "Hourly request ceiling reached"
            );
            return wait;
        }

        self.request_count += 1;
        Duration::ZERO
    }

    /// Requests counted in the current window.
    #[must_use]
    pub fn requests_in_window(&self) -> u32 {
        self.request_count
    }
}

/// Random delay inserted before every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    min: Duration,
    max: Duration,
}

impl Jitter {
    /// Uniform delay between `min_secs` and `max_secs`.
    ///
    /// Negative or NaN bounds are treated as zero; bounds above
    /// [`MAX_JITTER`] are clamped to it.
    #[must_use]
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let clean = |secs: f64| {
            if secs.is_nan() || secs <= 0.0 {
                Duration::ZERO
            } else {
                Duration::try_from_secs_f64(secs).map_or(MAX_JITTER, |d| d.min(MAX_JITTER))
            }
        };
        let (min, max) = (clean(min_secs), clean(max_secs));
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// No delay at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Draw one delay.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        Duration::from_secs_f64(rng.gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64()))
    }
}
