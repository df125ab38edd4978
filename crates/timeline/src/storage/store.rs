//! Same-day corpus files with merge-on-disk semantics.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::corpus::{Corpus, CorpusStats};
use crate::error::{CrawlError, Result};
use crate::twitter::Post;

/// Directory under the data root holding daily corpus files.
pub const POSTS_DIR: &str = "daily_posts";

/// Date stamp used in corpus file names.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// A corpus snapshot as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCorpus {
    /// Crawl date (`YYYYMMDD`).
    pub date: String,
    /// Timeline scope the posts came from.
    pub timeline_type: String,
    /// When the snapshot was written.
    pub crawl_time: DateTime<Utc>,
    /// Number of posts in `tweets`.
    pub tweet_count: usize,
    /// Unique posts after merging with earlier runs.
    #[serde(default)]
    pub unique_tweet_count: usize,
    /// Posts contributed by the latest run.
    #[serde(default)]
    pub total_crawled: usize,
    /// Posts dropped as duplicates during the merge.
    #[serde(default)]
    pub duplicates_removed: usize,
    /// Posts in corpus order.
    pub tweets: Vec<Post>,
}

impl PersistedCorpus {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let corpus: Self = serde_json::from_str(&content)?;
        Ok(corpus)
    }
}

/// Corpus files rooted at a data directory.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    root: PathBuf,
}

impl CorpusStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the corpus file for `scope` on `date`.
    #[must_use]
    pub fn path_for(&self, scope: &str, date: DateTime<Utc>) -> PathBuf {
        self.root.join(POSTS_DIR).join(format!(
            "{}_{scope}_posts.json",
            date.format(DATE_FORMAT)
        ))
    }

    /// Load the same-day snapshot for `scope`, if one exists.
    pub fn load_day(&self, scope: &str, date: DateTime<Utc>) -> Result<Option<PersistedCorpus>> {
        let path = self.path_for(scope, date);
        if !path.exists() {
            return Ok(None);
        }
        PersistedCorpus::load(&path).map(Some)
    }

    /// Merge `run_posts` into the same-day file and write it back.
    ///
    /// Posts already on disk win over posts from this run with the same ID.
    pub fn persist(
        &self,
        run_posts: Vec<Post>,
        scope: &str,
        now: DateTime<Utc>,
    ) -> Result<PersistedCorpus> {
        let path = self.path_for(scope, now);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let _lock = CorpusLock::acquire(&path)?;

        let previous = self.load_day(scope, now)?.map(|c| c.tweets).unwrap_or_default();
        let previous_count = previous.len();
        let total_crawled = run_posts.len();

        let mut corpus = Corpus::new();
        corpus.extend(previous);
        corpus.extend(run_posts);
        let unique = corpus.len();
        let tweets = corpus.into_sorted(None);

        let snapshot = PersistedCorpus {
            date: now.format(DATE_FORMAT).to_string(),
            timeline_type: scope.to_string(),
            crawl_time: now,
            tweet_count: tweets.len(),
            unique_tweet_count: unique,
            total_crawled,
            duplicates_removed: (previous_count + total_crawled).saturating_sub(unique),
            tweets,
        };

        write_atomic(&path, &serde_json::to_vec_pretty(&snapshot)?)?;

        tracing::info!(
            path = %path.display(),
            previous = previous_count,
            total_crawled,
            unique,
            duplicates_removed = snapshot.duplicates_removed,
            "Persisted corpus"
        );
        CorpusStats::from_posts(&snapshot.tweets).log(scope);

        Ok(snapshot)
    }
}

/// Write via a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Exclusive lock on a corpus file, released on drop.
struct CorpusLock {
    path: PathBuf,
}

impl CorpusLock {
    fn acquire(target: &Path) -> Result<Self> {
        let path = target.with_extension("json.lock");
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(CrawlError::Locked(path)),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for CorpusLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release corpus lock");
        }
    }
}
