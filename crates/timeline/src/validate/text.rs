//! Text completeness.

use serde_json::{json, Map};

use super::{ratio, DimensionResult, ValidationRules};
use crate::twitter::Post;

const SHORT_AVERAGE_PENALTY: f64 = 30.0;
const EMPTY_TEXT_PENALTY: f64 = 40.0;
const TRUNCATED_PENALTY: f64 = 25.0;

pub(super) fn check(posts: &[Post], rules: &ValidationRules) -> DimensionResult {
    if posts.is_empty() {
        return DimensionResult::failed("no posts to validate");
    }

    let lengths: Vec<usize> = posts.iter().map(|p| p.text.chars().count()).collect();
    let total = posts.len();
    let avg_length = lengths.iter().sum::<usize>() as f64 / total as f64;
    let empty = lengths.iter().filter(|&&len| len == 0).count();
    let truncated = posts.iter().filter(|p| p.truncated).count();
    let empty_ratio = ratio(empty, total);
    let truncated_ratio = ratio(truncated, total);

    let mut details = Map::new();
    details.insert("total_tweets".into(), json!(total));
    details.insert("avg_text_length".into(), json!(avg_length));
    details.insert("empty_text_count".into(), json!(empty));
    details.insert("empty_text_ratio".into(), json!(empty_ratio));
    details.insert("truncated_count".into(), json!(truncated));
    details.insert("truncated_ratio".into(), json!(truncated_ratio));
    details.insert("min_length".into(), json!(lengths.iter().min().copied().unwrap_or(0)));
    details.insert("max_length".into(), json!(lengths.iter().max().copied().unwrap_or(0)));

    let mut score = 100.0;
    let mut issues = Vec::new();

    if avg_length < rules.min_avg_text_length {
        issues.push(format!("average text length too short: {avg_length:.1}"));
        score -= SHORT_AVERAGE_PENALTY;
    }
    if empty_ratio > rules.empty_text_threshold {
        issues.push(format!("empty text ratio too high: {empty_ratio:.3}"));
        score -= EMPTY_TEXT_PENALTY;
    }
    if truncated_ratio > rules.truncated_ratio_threshold {
        issues.push(format!("truncated text ratio too high: {truncated_ratio:.3}"));
        score -= TRUNCATED_PENALTY;
    }

    DimensionResult::new(score, issues, details)
}
