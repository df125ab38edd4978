//! Reshare integrity.

use serde_json::{json, Map};

use super::{ratio, DimensionResult};
use crate::twitter::Post;

const MISSING_TEXT_WEIGHT: f64 = 50.0;
const MISSING_USER_WEIGHT: f64 = 30.0;

pub(super) fn check(posts: &[Post]) -> DimensionResult {
    let reshares: Vec<&Post> = posts.iter().filter_map(|p| p.reshare_of.as_deref()).collect();

    let mut details = Map::new();
    details.insert("total_retweets".into(), json!(reshares.len()));
    details.insert("retweet_ratio".into(), json!(ratio(reshares.len(), posts.len())));

    if reshares.is_empty() {
        return DimensionResult::new(100.0, Vec::new(), details);
    }

    let missing_text = reshares.iter().filter(|o| o.text.is_empty()).count();
    let missing_user = reshares.iter().filter(|o| o.user.is_none()).count();
    let nested = reshares.iter().filter(|o| o.is_reshare()).count();

    details.insert("missing_original_text".into(), json!(missing_text));
    details.insert("missing_original_user".into(), json!(missing_user));
    details.insert("nested_retweets".into(), json!(nested));

    let mut score = 100.0;
    let mut issues = Vec::new();

    if missing_text > 0 {
        issues.push(format!("reshares missing original text: {missing_text}"));
        score -= ratio(missing_text, reshares.len()) * MISSING_TEXT_WEIGHT;
    }
    if missing_user > 0 {
        issues.push(format!("reshares missing original author: {missing_user}"));
        score -= ratio(missing_user, reshares.len()) * MISSING_USER_WEIGHT;
    }

    DimensionResult::new(score, issues, details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::test_support::complete_post;

    fn reshare(id: &str, original: Post) -> Post {
        let mut post = complete_post(id, "RT");
        post.reshare_of = Some(Box::new(original));
        post
    }

    #[test]
    fn test_no_reshares_is_perfect() {
        let result = check(&[complete_post("1", "plain")]);
        assert_eq!(result.score, 100.0);
        assert!(result.passed);
        assert_eq!(result.details["total_retweets"], 0);
    }

    #[test]
    fn test_missing_original_fields() {
        let empty_text = complete_post("10", "");
        let mut no_user = complete_post("11", "original");
        no_user.user = None;

        let posts = vec![
            reshare("1", empty_text),
            reshare("2", no_user),
            reshare("3", complete_post("12", "fine")),
            reshare("4", complete_post("13", "fine")),
        ];
        let result = check(&posts);

        // 100 - 0.25 * 50 - 0.25 * 30
        assert!((result.score - 80.0).abs() < 1e-9);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.details["missing_original_text"], 1);
    }

    #[test]
    fn test_all_broken_reshares() {
        let mut original = Post::new("9", "");
        original.user = None;
        let result = check(&[reshare("1", original)]);
        assert!((result.score - 20.0).abs() < 1e-9);
        assert!(!result.passed);
    }
}
