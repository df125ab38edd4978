//! Timeline crate for X/Twitter home timeline crawling and quality scoring.
//!
//! This crate provides:
//! - Post resolution from the GraphQL timeline payload into a canonical schema
//! - Cursor-driven crawling with rate limiting and incremental dedup
//! - Same-day corpus persistence with merge-on-disk audit totals
//! - Extraction fidelity scoring with an optional golden baseline

pub mod auth;
pub mod config;
pub mod crawl;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod twitter;
pub mod validate;

// Re-export main types
pub use auth::Session;
pub use config::CrawlerConfig;
pub use crawl::{CrawlEngine, CrawlOutcome, TerminationReason};
pub use error::{CrawlError, Result};
pub use pipeline::{DailyRun, RunSummary};
pub use storage::{CorpusStore, PersistedCorpus};
pub use twitter::{Cursor, MediaAsset, Post, User};
pub use validate::{GoldenBaseline, QualityValidator, ValidationReport};
