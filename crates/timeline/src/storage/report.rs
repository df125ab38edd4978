//! Daily report files: a JSON record and a readable markdown digest.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::corpus::CorpusStats;
use crate::error::Result;
use crate::twitter::Post;

/// Directory under the data root holding daily reports.
pub const DAILY_REPORTS_DIR: &str = "daily_reports";

/// Posts copied verbatim into the JSON report.
const SAMPLE_POSTS: usize = 10;

/// Summary of one day's corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub generation_time: DateTime<Utc>,
    /// Timeline scope the corpus came from.
    pub timeline_type: String,
    pub tweet_count: usize,
    /// Composite quality score of the corpus.
    pub data_quality_score: f64,
    pub validation_passed: bool,
    pub statistics: CorpusStats,
    /// Digest text, when a summarizer produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Leading posts of the corpus.
    #[serde(default)]
    pub sample_posts: Vec<Post>,
}

impl DailyReport {
    #[must_use]
    pub fn new(
        timeline_type: &str,
        posts: &[Post],
        data_quality_score: f64,
        validation_passed: bool,
        summary: Option<String>,
    ) -> Self {
        Self {
            generation_time: Utc::now(),
            timeline_type: timeline_type.to_string(),
            tweet_count: posts.len(),
            data_quality_score,
            validation_passed,
            statistics: CorpusStats::from_posts(posts),
            summary,
            sample_posts: posts.iter().take(SAMPLE_POSTS).cloned().collect(),
        }
    }

    /// Write `daily_report_{ts}.json` and `.md` under `root/daily_reports/`.
    ///
    /// Returns the JSON path and the markdown path.
    pub fn save(&self, root: &Path) -> Result<(PathBuf, PathBuf)> {
        let dir = root.join(DAILY_REPORTS_DIR);
        std::fs::create_dir_all(&dir)?;

        let stem = format!(
            "daily_report_{}",
            self.generation_time.format("%Y%m%d_%H%M%S")
        );
        let json_path = dir.join(format!("{stem}.json"));
        let md_path = dir.join(format!("{stem}.md"));

        std::fs::write(&json_path, serde_json::to_string_pretty(self)?)?;
        std::fs::write(&md_path, self.render_markdown())?;

        tracing::info!(
            json = %json_path.display(),
            markdown = %md_path.display(),
            "Wrote daily report"
        );
        Ok((json_path, md_path))
    }

    /// Load a report from its JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    #[must_use]
    pub fn render_markdown(&self) -> String {
        let stats = &self.statistics;
        let mut md = String::new();

        let _ = writeln!(md, "# Daily Timeline Report\n");
        let _ = writeln!(
            md,
            "*Generated {}*\n",
            self.generation_time.format("%B %d, %Y at %H:%M UTC")
        );

        md.push_str("## Overview\n\n");
        let _ = writeln!(md, "- **Timeline**: {}", self.timeline_type);
        let _ = writeln!(md, "- **Posts**: {}", self.tweet_count);
        let _ = writeln!(md, "- **Data quality**: {:.1}\n", self.data_quality_score);

        md.push_str("## Content\n\n");
        for (label, count) in [
            ("Original", stats.original),
            ("Reshares", stats.reshares),
            ("Quotes", stats.quoted),
        ] {
            let _ = writeln!(md, "- **{label}**: {count} ({:.1}%)", stats.percent(count));
        }
        let _ = writeln!(md, "- **With media**: {}", stats.with_media);
        let _ = writeln!(
            md,
            "- **Average text length**: {:.0} characters\n",
            stats.avg_text_length
        );

        if !stats.top_users.is_empty() {
            md.push_str("## Most Active Authors\n\n");
            for user in &stats.top_users {
                let _ = writeln!(md, "- @{}: {} posts", user.screen_name, user.posts);
            }
            md.push('\n');
        }

        md.push_str("## Media\n\n");
        let _ = writeln!(md, "- **Photos**: {}", stats.media_types.photo);
        let _ = writeln!(md, "- **Videos**: {}", stats.media_types.video);
        let _ = writeln!(md, "- **GIFs**: {}\n", stats.media_types.animated_gif);

        if let Some(summary) = &self.summary {
            md.push_str("## Summary\n\n");
            let _ = writeln!(md, "{}\n", summary.trim());
        }

        md.push_str("## Data Quality\n\n");
        let _ = writeln!(md, "- **Overall score**: {:.1}/100", self.data_quality_score);
        let _ = writeln!(
            md,
            "- **Status**: {}",
            if self.validation_passed { "PASS" } else { "FAIL" }
        );

        md
    }
}
