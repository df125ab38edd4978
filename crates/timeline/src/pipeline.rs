//! Daily run - orchestrates the crawl-persist-validate-report flow.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::CrawlerConfig;
use crate::crawl::{CrawlEngine, TerminationReason};
use crate::storage::{CorpusStore, DailyReport};
use crate::twitter::{Post, Transport};
use crate::validate::{GoldenBaseline, QualityValidator};

/// Produces a short natural-language digest of a corpus.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, posts: &[Post]) -> Result<String>;
}

/// Result of a single daily run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Why the crawl stopped.
    pub termination: TerminationReason,
    /// Unique posts this run contributed before merging.
    pub posts_crawled: usize,
    /// Pages fetched.
    pub pages_fetched: usize,
    /// Unique posts in the same-day file after merging.
    pub unique_total: usize,
    /// Duplicates dropped across the accumulated day.
    pub duplicates_removed: usize,
    /// Where the corpus was written.
    pub corpus_path: PathBuf,
    /// Where the validation report was written.
    pub report_path: PathBuf,
    /// Where the daily report JSON was written.
    pub daily_report_path: PathBuf,
    /// Markdown rendering of the daily report.
    pub daily_markdown_path: PathBuf,
    /// Composite quality score.
    pub overall_score: f64,
    /// Whether the corpus met the pass threshold.
    pub passed: bool,
    /// Digest from the summarizer, when one is configured and succeeded.
    pub summary: Option<String>,
}

/// Daily run orchestrator.
pub struct DailyRun<T: Transport> {
    transport: T,
    config: CrawlerConfig,
    store: CorpusStore,
    baseline: Option<GoldenBaseline>,
    summarizer: Option<Arc<dyn Summarizer>>,
    cancel: CancellationToken,
}

impl<T: Transport> DailyRun<T> {
    /// Create a run writing under `data_dir`.
    #[must_use]
    pub fn new(transport: T, config: CrawlerConfig, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            config,
            store: CorpusStore::new(data_dir),
            baseline: None,
            summarizer: None,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_baseline(mut self, baseline: GoldenBaseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Crawl, merge into the same-day file, and score the merged corpus.
    pub async fn run(self) -> Result<RunSummary> {
        let scope = self.config.targets.timeline.scope();
        tracing::info!(
            scope,
            target = self.config.targets.daily_tweet_count,
            "Starting daily run"
        );

        let mut engine = CrawlEngine::new(self.transport, &self.config)
            .with_cancellation(self.cancel.clone());
        let outcome = engine.run().await;
        for diagnostic in &outcome.diagnostics {
            tracing::debug!(%diagnostic, "Skipped entry");
        }

        let now = Utc::now();
        let corpus_path = self.store.path_for(scope, now);
        let posts_crawled = outcome.posts.len();
        let snapshot = self
            .store
            .persist(outcome.posts, scope, now)
            .with_context(|| format!("Failed to persist corpus to {}", corpus_path.display()))?;

        let validator = QualityValidator::new(self.config.validation.clone());
        let report = validator
            .validate(&snapshot.tweets, self.baseline.as_ref())
            .await;
        let report_path = report
            .save(self.store.root())
            .context("Failed to write validation report")?;

        let summary = match &self.summarizer {
            Some(summarizer) => match summarizer.summarize(&snapshot.tweets).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(error = %e, "Summarization failed");
                    None
                }
            },
            None => None,
        };

        let (daily_report_path, daily_markdown_path) = DailyReport::new(
            scope,
            &snapshot.tweets,
            report.overall_score,
            report.passed(),
            summary.clone(),
        )
        .save(self.store.root())
        .context("Failed to write daily report")?;

        let summary = RunSummary {
            termination: outcome.termination,
            posts_crawled,
            pages_fetched: outcome.pages_fetched,
            unique_total: snapshot.unique_tweet_count,
            duplicates_removed: snapshot.duplicates_removed,
            corpus_path,
            report_path,
            daily_report_path,
            daily_markdown_path,
            overall_score: report.overall_score,
            passed: report.passed(),
            summary,
        };

        tracing::info!(
            termination = %summary.termination,
            posts_crawled = summary.posts_crawled,
            unique_total = summary.unique_total,
            score = summary.overall_score,
            passed = summary.passed,
            "Daily run complete"
        );

        Ok(summary)
    }
}
