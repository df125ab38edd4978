//! Data structure completeness.

use serde_json::{json, Map};

use super::{ratio, DimensionResult, ValidationRules};
use crate::twitter::{Post, User};

const MISSING_FIELD_WEIGHT: f64 = 30.0;
const MISSING_USER_FIELD_WEIGHT: f64 = 20.0;
const INVALID_TIMESTAMP_WEIGHT: f64 = 25.0;

type FieldCheck<T> = (&'static str, fn(&T) -> bool);

/// Required post fields and whether each is present.
const POST_FIELDS: &[FieldCheck<Post>] = &[
    ("id", has_id),
    ("created_at", has_created_at),
    ("user", has_user),
];

/// Required author fields: two from the core sub-path, one from the profile.
const USER_FIELDS: &[FieldCheck<User>] = &[
    ("name", has_name),
    ("screen_name", has_screen_name),
    ("followers_count", has_followers_count),
];

fn has_id(post: &Post) -> bool {
    !post.id.is_empty()
}

fn has_created_at(post: &Post) -> bool {
    post.created_at.is_some()
}

fn has_user(post: &Post) -> bool {
    post.user.is_some()
}

fn has_name(user: &User) -> bool {
    user.name.is_some()
}

fn has_screen_name(user: &User) -> bool {
    user.screen_name.is_some()
}

fn has_followers_count(user: &User) -> bool {
    user.followers_count.is_some()
}

pub(super) fn check(posts: &[Post], rules: &ValidationRules) -> DimensionResult {
    if posts.is_empty() {
        return DimensionResult::failed("no posts to validate");
    }
    let total = posts.len();

    let missing_fields: Vec<(&str, usize)> = POST_FIELDS
        .iter()
        .map(|(name, present)| (*name, posts.iter().filter(|p| !present(p)).count()))
        .collect();

    let users: Vec<&User> = posts.iter().filter_map(|p| p.user.as_ref()).collect();
    let missing_user_fields: Vec<(&str, usize)> = USER_FIELDS
        .iter()
        .map(|(name, present)| (*name, users.iter().filter(|u| !present(u)).count()))
        .collect();

    let valid_timestamps = posts.iter().filter(|p| p.created_at_utc().is_some()).count();
    let invalid_timestamp_ratio = 1.0 - ratio(valid_timestamps, total);

    let mut details = Map::new();
    details.insert("total_tweets".into(), json!(total));
    details.insert("missing_fields".into(), counts_json(&missing_fields));
    details.insert("missing_user_fields".into(), counts_json(&missing_user_fields));
    details.insert("valid_timestamps".into(), json!(valid_timestamps));
    details.insert(
        "timestamp_validity_ratio".into(),
        json!(ratio(valid_timestamps, total)),
    );

    let mut score = 100.0;
    let mut issues = Vec::new();

    for (field, count) in missing_fields.iter().filter(|(_, c)| *c > 0) {
        let missing_ratio = ratio(*count, total);
        issues.push(format!(
            "missing {field}: {count} ({:.2}%)",
            missing_ratio * 100.0
        ));
        score -= missing_ratio * MISSING_FIELD_WEIGHT;
    }
    for (field, count) in missing_user_fields.iter().filter(|(_, c)| *c > 0) {
        let missing_ratio = ratio(*count, total);
        issues.push(format!(
            "missing user {field}: {count} ({:.2}%)",
            missing_ratio * 100.0
        ));
        score -= missing_ratio * MISSING_USER_FIELD_WEIGHT;
    }
    if invalid_timestamp_ratio > rules.invalid_timestamp_threshold {
        issues.push(format!(
            "unparseable timestamps: {:.2}%",
            invalid_timestamp_ratio * 100.0
        ));
        score -= invalid_timestamp_ratio * INVALID_TIMESTAMP_WEIGHT;
    }

    DimensionResult::new(score, issues, details)
}

fn counts_json(counts: &[(&str, usize)]) -> serde_json::Value {
    let map: Map<String, serde_json::Value> = counts
        .iter()
        .map(|(name, count)| ((*name).to_string(), json!(count)))
        .collect();
    serde_json::Value::Object(map)
}
