//! Cursor-driven timeline crawl.

use std::fmt;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::rate_limit::{Jitter, RateLimiter};
use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::storage::Corpus;
use crate::twitter::{
    default_features, Cursor, Diagnostic, ExtractedPage, Features, PageExtractor, Post,
    TimelineEndpoint, Transport,
};

/// Crawl lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Fetching,
    Merging,
    Terminated(TerminationReason),
}

/// Why a crawl stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The unique post target was reached.
    TargetReached,
    /// A page yielded no posts.
    EmptyPage,
    /// A page only repeated posts already collected.
    NoNewPosts,
    /// The page carried no bottom cursor.
    NoCursor,
    /// The page ceiling was reached.
    PageLimit,
    /// Upstream throttled the crawl; the cooldown was served.
    RateLimited,
    /// A request failed.
    Transport(String),
    /// The crawl was cancelled.
    Cancelled,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetReached => f.write_str("target reached"),
            Self::EmptyPage => f.write_str("empty page"),
            Self::NoNewPosts => f.write_str("no new posts"),
            Self::NoCursor => f.write_str("no next cursor"),
            Self::PageLimit => f.write_str("page limit reached"),
            Self::RateLimited => f.write_str("rate limited"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of a crawl run.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Unique posts in corpus order, truncated to the target.
    pub posts: Vec<Post>,
    /// Pages fetched and extracted.
    pub pages_fetched: usize,
    /// Requests sent, including failed ones.
    pub requests_made: usize,
    /// Posts seen across all pages, duplicates included.
    pub total_seen: usize,
    /// Posts dropped because their ID was already collected.
    pub duplicates_in_run: usize,
    /// Bottom cursor of the last extracted page.
    pub last_cursor: Option<Cursor>,
    pub termination: TerminationReason,
    /// Entries skipped during extraction.
    pub diagnostics: Vec<Diagnostic>,
}

/// Traverses a timeline page by page until a stop condition holds.
pub struct CrawlEngine<T: Transport> {
    transport: T,
    endpoint: TimelineEndpoint,
    features: Features,
    target: usize,
    max_pages: Option<usize>,
    limiter: RateLimiter,
    jitter: Jitter,
    cooldown: Duration,
    cancel: CancellationToken,
    state: CrawlState,
    requests_made: usize,
}

impl<T: Transport> CrawlEngine<T> {
    /// Create an engine with pacing and targets taken from `config`.
    pub fn new(transport: T, config: &CrawlerConfig) -> Self {
        Self {
            transport,
            endpoint: config.targets.timeline,
            features: default_features(),
            target: config.targets.daily_tweet_count,
            max_pages: config.targets.max_pages,
            limiter: RateLimiter::new(config.settings.requests_per_hour),
            jitter: config.settings.jitter(),
            cooldown: config.settings.cooldown(),
            cancel: CancellationToken::new(),
            state: CrawlState::Idle,
            requests_made: 0,
        }
    }

    /// Stop the crawl when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Crawl until a stop condition holds.
    ///
    /// Never fails: transport errors end the crawl and keep what was merged.
    pub async fn run(&mut self) -> CrawlOutcome {
        self.requests_made = 0;
        let mut corpus = Corpus::new();
        let mut cursor: Option<Cursor> = None;
        let mut last_cursor: Option<Cursor> = None;
        let mut diagnostics = Vec::new();
        let mut pages_fetched = 0;
        let mut total_seen = 0;
        let mut duplicates_in_run = 0;

        tracing::info!(
            endpoint = %self.endpoint,
            target = self.target,
            max_pages = ?self.max_pages,
            "Starting crawl"
        );

        let termination = if self.target == 0 {
            TerminationReason::TargetReached
        } else {
            loop {
                self.state = CrawlState::Fetching;

                let (page, rate_limited) = match self.fetch(cursor.as_ref()).await {
                    Fetched::Page(page) => (page, false),
                    Fetched::RateLimited => (ExtractedPage::default(), true),
                    Fetched::Failed(reason) => break reason,
                };
                if !rate_limited {
                    pages_fetched += 1;
                }

                self.state = CrawlState::Merging;
                let page_posts = page.posts.len();
                let mut new_posts = 0;
                for post in page.posts {
                    total_seen += 1;
                    if corpus.insert(post) {
                        new_posts += 1;
                    } else {
                        duplicates_in_run += 1;
                    }
                }
                diagnostics.extend(page.diagnostics);
                if page.next_cursor.is_some() {
                    last_cursor.clone_from(&page.next_cursor);
                }

                tracing::info!(
                    page = pages_fetched,
                    posts = page_posts,
                    new_posts,
                    unique = corpus.len(),
                    "Merged page"
                );

                if rate_limited {
                    break TerminationReason::RateLimited;
                }
                if corpus.len() >= self.target {
                    break TerminationReason::TargetReached;
                }
                if page_posts == 0 {
                    break TerminationReason::EmptyPage;
                }
                if new_posts == 0 {
                    break TerminationReason::NoNewPosts;
                }
                let Some(next) = page.next_cursor else {
                    break TerminationReason::NoCursor;
                };
                if self.max_pages.is_some_and(|max| pages_fetched >= max) {
                    break TerminationReason::PageLimit;
                }
                cursor = Some(next);
            }
        };

        self.state = CrawlState::Terminated(termination.clone());
        let posts = corpus.into_sorted(Some(self.target));

        tracing::info!(
            reason = %termination,
            posts = posts.len(),
            pages = pages_fetched,
            requests = self.requests_made,
            duplicates = duplicates_in_run,
            skipped_entries = diagnostics.len(),
            "Crawl finished"
        );

        CrawlOutcome {
            posts,
            pages_fetched,
            requests_made: self.requests_made,
            total_seen,
            duplicates_in_run,
            last_cursor,
            termination,
            diagnostics,
        }
    }

    /// Pace, send one request and extract the page.
    async fn fetch(&mut self, cursor: Option<&Cursor>) -> Fetched {
        if self.cancel.is_cancelled() {
            return Fetched::Failed(TerminationReason::Cancelled);
        }

        let wait = self.limiter.reserve(Instant::now()) + self.jitter.sample(&mut rand::thread_rng());
        if !self.pause(wait).await {
            return Fetched::Failed(TerminationReason::Cancelled);
        }

        self.requests_made += 1;
        let result = tokio::select! {
            () = self.cancel.cancelled() => return Fetched::Failed(TerminationReason::Cancelled),
            result = self.transport.fetch_page(self.endpoint, cursor, &self.features) => result,
        };

        match result {
            Ok(raw) => Fetched::Page(PageExtractor::extract(&raw)),
            Err(CrawlError::RateLimited) => {
                tracing::warn!(cooldown_secs = self.cooldown.as_secs(), "Rate limited, cooling down");
                if self.pause(self.cooldown).await {
                    Fetched::RateLimited
                } else {
                    Fetched::Failed(TerminationReason::Cancelled)
                }
            }
            Err(CrawlError::Cancelled) => Fetched::Failed(TerminationReason::Cancelled),
            Err(e) => {
                tracing::error!(error = %e, "Timeline request failed");
                Fetched::Failed(TerminationReason::Transport(e.to_string()))
            }
        }
    }

    /// Sleep for `duration` unless cancelled first. Returns `false` on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}

enum Fetched {
    Page(ExtractedPage),
    RateLimited,
    Failed(TerminationReason),
}
