//! Golden baseline comparison.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{ratio, DimensionResult, ValidationRules};
use crate::error::Result;
use crate::twitter::{PageExtractor, Post, User};

/// Baseline score lost per unit of text mismatch.
const MISMATCH_WEIGHT: f64 = 50.0;
/// Minimum share of the baseline's size the corpus should reach.
const MIN_VOLUME_RATIO: f64 = 0.8;

/// Expected values for one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselinePost {
    pub tweet_id: String,
    #[serde(default)]
    pub expected_text: String,
    #[serde(default)]
    pub expected_created_at: Option<String>,
    #[serde(default)]
    pub expected_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_user: Option<User>,
    #[serde(default)]
    pub is_retweet: bool,
    #[serde(default)]
    pub is_quoted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_retweet_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_quoted_text: Option<String>,
}

impl BaselinePost {
    fn from_post(post: &Post) -> Self {
        Self {
            tweet_id: post.id.clone(),
            expected_text: post.text.clone(),
            expected_created_at: post.created_at.clone(),
            expected_lang: post.lang.clone(),
            expected_user: post.user.clone(),
            is_retweet: post.is_reshare(),
            is_quoted: post.quoted.is_some(),
            expected_retweet_text: post.reshare_of.as_ref().map(|p| p.text.clone()),
            expected_quoted_text: post.quoted.as_ref().map(|p| p.text.clone()),
        }
    }
}

/// Read-only set of expected post values, keyed by post ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenBaseline {
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub baseline_tweets: Vec<BaselinePost>,
}

impl GoldenBaseline {
    /// Derive a baseline from already resolved posts.
    #[must_use]
    pub fn from_posts(posts: &[Post]) -> Self {
        let mut seen = std::collections::HashSet::new();
        Self {
            creation_time: Utc::now().to_rfc3339(),
            baseline_tweets: posts
                .iter()
                .filter(|p| seen.insert(p.id.clone()))
                .map(BaselinePost::from_post)
                .collect(),
        }
    }

    /// Build a baseline from captured raw timeline pages.
    #[must_use]
    pub fn from_pages(pages: &[Value]) -> Self {
        let posts: Vec<Post> = pages
            .iter()
            .flat_map(|page| PageExtractor::extract(page).posts)
            .collect();
        Self::from_posts(&posts)
    }

    /// Load a baseline from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the baseline to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.baseline_tweets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baseline_tweets.is_empty()
    }
}

/// Text match credit: 1 for exact, 0.5 for containment either way.
fn text_credit(actual: &str, expected: &str) -> f64 {
    let (actual, expected) = (actual.trim(), expected.trim());
    if actual.is_empty() || expected.is_empty() {
        0.0
    } else if actual == expected {
        1.0
    } else if actual.contains(expected) || expected.contains(actual) {
        0.5
    } else {
        0.0
    }
}

/// Compare the leading posts against the baseline by ID.
pub(super) fn compare(
    posts: &[Post],
    baseline: &GoldenBaseline,
    rules: &ValidationRules,
) -> DimensionResult {
    let expected: HashMap<&str, &BaselinePost> = baseline
        .baseline_tweets
        .iter()
        .map(|b| (b.tweet_id.as_str(), b))
        .collect();

    let sample_size = rules
        .golden_sample_size
        .min(posts.len())
        .min(baseline.len());

    let mut matched_ids = 0;
    let mut credit = 0.0;
    for post in &posts[..sample_size] {
        if let Some(entry) = expected.get(post.id.as_str()) {
            matched_ids += 1;
            credit += text_credit(&post.text, &entry.expected_text);
        }
    }
    let match_ratio = if sample_size == 0 {
        0.0
    } else {
        credit / sample_size as f64
    };

    let mut details = Map::new();
    details.insert("golden_posts_count".into(), json!(baseline.len()));
    details.insert("current_posts_count".into(), json!(posts.len()));
    details.insert("sample_size".into(), json!(sample_size));
    details.insert("sample_ids_found".into(), json!(matched_ids));
    details.insert("sample_text_match_ratio".into(), json!(match_ratio));
    details.insert("volume_ratio".into(), json!(ratio(posts.len(), baseline.len())));
    details.insert("informative".into(), json!(true));

    let mut score = 100.0;
    let mut issues = Vec::new();

    if (posts.len() as f64) < baseline.len() as f64 * MIN_VOLUME_RATIO {
        issues.push(format!(
            "post count well below baseline: {} vs {}",
            posts.len(),
            baseline.len()
        ));
    }
    if match_ratio < rules.golden_match_threshold {
        issues.push(format!(
            "text match ratio too low: {:.2}%",
            match_ratio * 100.0
        ));
        score -= (1.0 - match_ratio) * MISMATCH_WEIGHT;
    }

    let mut result = DimensionResult::new(score, issues, details);
    result.passed = match_ratio >= rules.golden_match_threshold;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::test_support::complete_post;
    use serde_json::json;

    fn posts(texts: &[&str]) -> Vec<Post> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| complete_post(&i.to_string(), t))
            .collect()
    }

    #[test]
    fn test_text_credit() {
        assert_eq!(text_credit("same", " same "), 1.0);
        assert_eq!(text_credit("full text here", "full text"), 0.5);
        assert_eq!(text_credit("abc", "xyz"), 0.0);
        assert_eq!(text_credit("", ""), 0.0);
    }

    #[test]
    fn test_identical_corpus_matches() {
        let corpus = posts(&["one", "two", "three"]);
        let baseline = GoldenBaseline::from_posts(&corpus);
        let result = compare(&corpus, &baseline, &ValidationRules::default());

        assert_eq!(result.score, 100.0);
        assert!(result.passed);
        assert_eq!(result.details["sample_text_match_ratio"], 1.0);
    }

    #[test]
    fn test_lookup_is_by_id_not_position() {
        let corpus = posts(&["one", "two"]);
        let mut baseline = GoldenBaseline::from_posts(&corpus);
        baseline.baseline_tweets.reverse();

        let result = compare(&corpus, &baseline, &ValidationRules::default());
        assert_eq!(result.details["sample_ids_found"], 2);
        assert!(result.passed);
    }

    #[test]
    fn test_partial_match_and_missing_ids() {
        let corpus = posts(&["exact", "a longer version of the text", "new", "four"]);
        let mut baseline = GoldenBaseline::from_posts(&corpus);
        baseline.baseline_tweets[1].expected_text = "longer version".to_string();
        baseline.baseline_tweets[2].tweet_id = "not-in-corpus".to_string();
        baseline.baseline_tweets[3].expected_text = "different".to_string();

        let result = compare(&corpus, &baseline, &ValidationRules::default());
        // (1 + 0.5 + 0 + 0) / 4 = 0.375
        assert_eq!(result.details["sample_text_match_ratio"], 0.375);
        assert!((result.score - (100.0 - 0.625 * 50.0)).abs() < 1e-9);
        assert!(!result.passed);
    }

    #[test]
    fn test_volume_drop_is_reported() {
        let full = posts(&["a", "b", "c", "d", "e"]);
        let baseline = GoldenBaseline::from_posts(&full);
        let result = compare(&full[..3], &baseline, &ValidationRules::default());

        assert!(result.passed);
        assert_eq!(result.score, 100.0);
        assert!(result.issues[0].contains("3 vs 5"));
    }

    #[test]
    fn test_sample_is_bounded() {
        let texts: Vec<String> = (0..25).map(|i| format!("post {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let corpus = posts(&refs);
        let baseline = GoldenBaseline::from_posts(&corpus);

        let result = compare(&corpus, &baseline, &ValidationRules::default());
        assert_eq!(result.details["sample_size"], 10);
    }

    #[test]
    fn test_from_pages_and_file_format() {
        let page = json!({
            "data": { "home": { "home_timeline_urt": { "instructions": [{
                "type": "TimelineAddEntries",
                "entries": [{
                    "entryId": "tweet-1",
                    "content": { "itemContent": {
                        "itemType": "TimelineTweet",
                        "tweet_results": { "result": {
                            "__typename": "Tweet",
                            "rest_id": "1",
                            "legacy": { "full_text": "captured", "lang": "en" }
                        }}
                    }}
                }]
            }]}}}
        });

        let baseline = GoldenBaseline::from_pages(&[page.clone(), page]);
        assert_eq!(baseline.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("golden").join("baseline.json");
        baseline.save(&path).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["baseline_tweets"][0]["tweet_id"], "1");
        assert_eq!(raw["baseline_tweets"][0]["expected_text"], "captured");
        assert_eq!(raw["baseline_tweets"][0]["is_retweet"], false);

        assert_eq!(GoldenBaseline::load(&path).unwrap(), baseline);
    }
}
