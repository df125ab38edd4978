//! Extraction fidelity scoring.
//!
//! A resolved corpus is scored on four dimensions (text completeness,
//! reshare integrity, media accessibility, data structure), optionally
//! compared against a golden baseline, and summarized in a report.

mod golden;
mod media;
mod probe;
mod reshare;
mod structure;
mod text;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use golden::{BaselinePost, GoldenBaseline};
pub use probe::{HttpProbe, MediaProbe};

use crate::error::Result;
use crate::twitter::Post;

/// Report key of the text completeness dimension.
pub const TEXT_COMPLETENESS: &str = "text_completeness";
/// Report key of the reshare integrity dimension.
pub const RETWEET_INTEGRITY: &str = "retweet_integrity";
/// Report key of the media accessibility dimension.
pub const MEDIA_ACCESSIBILITY: &str = "media_accessibility";
/// Report key of the data structure dimension.
pub const DATA_STRUCTURE: &str = "data_structure";
/// Report key of the golden baseline comparison.
pub const GOLDEN_COMPARISON: &str = "golden_comparison";

/// Directory under the data root holding validation reports.
pub const REPORTS_DIR: &str = "validation_reports";

/// Tunable thresholds for validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Average text length below which text completeness is penalized.
    pub min_avg_text_length: f64,
    /// Tolerated share of posts with empty text.
    pub empty_text_threshold: f64,
    /// Tolerated share of truncated posts.
    pub truncated_ratio_threshold: f64,
    /// Tolerated share of unparseable timestamps.
    pub invalid_timestamp_threshold: f64,
    /// Hosts (and their subdomains) media URLs may point at.
    pub allowed_media_hosts: Vec<String>,
    /// Maximum number of media URLs probed live.
    pub probe_sample: usize,
    /// Per-probe timeout in seconds.
    pub probe_timeout_secs: u64,
    /// Maximum number of posts compared against the baseline.
    pub golden_sample_size: usize,
    /// Minimum text match ratio against the baseline.
    pub golden_match_threshold: f64,
    /// Composite score needed for `PASS`.
    pub pass_score: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_avg_text_length: 20.0,
            empty_text_threshold: 0.01,
            truncated_ratio_threshold: 0.05,
            invalid_timestamp_threshold: 0.1,
            allowed_media_hosts: vec!["twimg.com".to_string(), "twitter.com".to_string()],
            probe_sample: 3,
            probe_timeout_secs: 5,
            golden_sample_size: 10,
            golden_match_threshold: 0.8,
            pass_score: 80.0,
        }
    }
}

/// Score for one validation dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionResult {
    /// Score in `[0, 100]`.
    pub score: f64,
    /// Whether the dimension raised no issues.
    #[serde(rename = "is_valid")]
    pub passed: bool,
    pub issues: Vec<String>,
    pub details: Map<String, Value>,
}

impl DimensionResult {
    /// Build a result, clamping the score. Passes when there are no issues.
    #[must_use]
    pub fn new(score: f64, issues: Vec<String>, details: Map<String, Value>) -> Self {
        let passed = issues.is_empty();
        Self {
            score: clamp_score(score),
            passed,
            issues,
            details,
        }
    }

    /// A zero score with a single issue.
    #[must_use]
    pub fn failed(issue: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            passed: false,
            issues: vec![issue.into()],
            details: Map::new(),
        }
    }
}

/// Clamp a score into `[0, 100]`; NaN becomes 0.
#[must_use]
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Overall verdict of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Pass,
    Fail,
}

/// Full validation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_time: DateTime<Utc>,
    pub tweet_count: usize,
    /// Mean of the four scored dimensions.
    pub overall_score: f64,
    pub overall_status: OverallStatus,
    pub category_results: BTreeMap<String, DimensionResult>,
    /// Every issue, prefixed with its dimension as `[dimension] issue`.
    pub all_issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    /// Whether the composite score passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.overall_status == OverallStatus::Pass
    }

    /// Result for one dimension.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&DimensionResult> {
        self.category_results.get(name)
    }

    /// Write the report under `root/validation_reports/`.
    pub fn save(&self, root: &Path) -> Result<PathBuf> {
        let dir = root.join(REPORTS_DIR);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!(
            "validation_report_{}.json",
            self.validation_time.format("%Y%m%d_%H%M%S")
        ));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Load a report from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Scores a corpus against structural rules and an optional baseline.
pub struct QualityValidator {
    rules: ValidationRules,
    probe: Option<Box<dyn MediaProbe>>,
}

impl QualityValidator {
    #[must_use]
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules, probe: None }
    }

    /// Enable live reachability checks of media URLs.
    #[must_use]
    pub fn with_probe(mut self, probe: Box<dyn MediaProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    #[must_use]
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Score `posts`, comparing against `baseline` when given.
    ///
    /// Never fails; bad data only lowers scores.
    pub async fn validate(
        &self,
        posts: &[Post],
        baseline: Option<&GoldenBaseline>,
    ) -> ValidationReport {
        let scored = [
            (TEXT_COMPLETENESS, text::check(posts, &self.rules)),
            (RETWEET_INTEGRITY, reshare::check(posts)),
            (
                MEDIA_ACCESSIBILITY,
                media::check(posts, &self.rules, self.probe.as_deref()).await,
            ),
            (DATA_STRUCTURE, structure::check(posts, &self.rules)),
        ];

        let overall_score =
            clamp_score(scored.iter().map(|(_, r)| r.score).sum::<f64>() / scored.len() as f64);
        let overall_status = if overall_score >= self.rules.pass_score {
            OverallStatus::Pass
        } else {
            OverallStatus::Fail
        };

        let recommendations = if overall_status == OverallStatus::Fail {
            scored
                .iter()
                .filter(|(_, result)| result.score < self.rules.pass_score)
                .filter_map(|(name, _)| recommendation(name))
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };

        let golden = baseline.map(|b| golden::compare(posts, b, &self.rules));

        let mut all_issues = Vec::new();
        let mut category_results = BTreeMap::new();
        for (name, result) in scored
            .into_iter()
            .chain(golden.map(|g| (GOLDEN_COMPARISON, g)))
        {
            all_issues.extend(result.issues.iter().map(|issue| format!("[{name}] {issue}")));
            category_results.insert(name.to_string(), result);
        }

        tracing::info!(
            posts = posts.len(),
            overall_score,
            status = ?overall_status,
            issues = all_issues.len(),
            "Validation complete"
        );

        ValidationReport {
            validation_time: Utc::now(),
            tweet_count: posts.len(),
            overall_score,
            overall_status,
            category_results,
            all_issues,
            recommendations,
        }
    }
}

fn recommendation(dimension: &str) -> Option<&'static str> {
    match dimension {
        TEXT_COMPLETENESS => {
            Some("Check text extraction: prefer note_tweet text, fall back to legacy.full_text")
        }
        RETWEET_INTEGRITY => {
            Some("Check reshare resolution: follow legacy.retweeted_status_result.result")
        }
        MEDIA_ACCESSIBILITY => {
            Some("Check media extraction: read legacy.extended_entities.media for URLs")
        }
        DATA_STRUCTURE => Some("Check required field extraction for posts and authors"),
        _ => None,
    }
}

/// Share of `count` in `total`, 0 for an empty total.
pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
