//! Corpus storage.
//!
//! Deduplicates posts by ID in memory, persists daily snapshots as JSON, and
//! writes the daily report.

mod corpus;
mod report;
mod store;

pub use corpus::{Corpus, CorpusStats, MediaTypeCounts, UserCount, TOP_USERS};
pub use report::{DailyReport, DAILY_REPORTS_DIR};
pub use store::{CorpusStore, PersistedCorpus, DATE_FORMAT, POSTS_DIR};
