//! Timeline crawling.
//!
//! Drives a [`crate::twitter::Transport`] page by page, paced by a rolling
//! hourly limiter and a randomized delay, deduplicating posts as they arrive.

mod engine;
mod rate_limit;

pub use engine::{CrawlEngine, CrawlOutcome, CrawlState, TerminationReason};
pub use rate_limit::{Jitter, RateLimiter, MAX_JITTER, WINDOW};
