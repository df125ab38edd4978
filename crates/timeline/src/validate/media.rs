//! Media accessibility.

use serde_json::{json, Map};
use url::Url;

use super::probe::MediaProbe;
use super::{ratio, DimensionResult, ValidationRules};
use crate::twitter::{MediaKind, Post};

const MALFORMED_WEIGHT: f64 = 60.0;

/// Whether `url` is an https URL on one of the allowed hosts or their subdomains.
pub(super) fn is_well_formed(url: &str, allowed_hosts: &[String]) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if parsed.scheme() != "https" {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    allowed_hosts.iter().any(|allowed| {
        host == allowed
            || host
                .strip_suffix(allowed.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

pub(super) async fn check(
    posts: &[Post],
    rules: &ValidationRules,
    probe: Option<&dyn MediaProbe>,
) -> DimensionResult {
    let media: Vec<_> = posts.iter().flat_map(|p| p.media.iter()).collect();
    let media_posts = posts.iter().filter(|p| !p.media.is_empty()).count();

    let mut details = Map::new();
    details.insert("total_media_files".into(), json!(media.len()));
    details.insert("media_tweets".into(), json!(media_posts));

    if media.is_empty() {
        return DimensionResult::new(100.0, Vec::new(), details);
    }

    let video_files = media.iter().filter(|m| m.kind == MediaKind::Video).count();
    let image_files = media.len() - video_files;

    let well_formed: Vec<&str> = media
        .iter()
        .filter_map(|m| m.url.as_deref())
        .filter(|url| is_well_formed(url, &rules.allowed_media_hosts))
        .collect();
    let malformed = media.len() - well_formed.len();

    let mut probed = 0;
    let mut reachable = 0;
    if let Some(probe) = probe {
        for url in well_formed.iter().take(rules.probe_sample) {
            probed += 1;
            if probe.is_reachable(url).await {
                reachable += 1;
            }
        }
    }

    details.insert("valid_urls".into(), json!(well_formed.len()));
    details.insert("invalid_urls".into(), json!(malformed));
    details.insert("probed_urls".into(), json!(probed));
    details.insert("accessible_urls".into(), json!(reachable));
    details.insert("video_files".into(), json!(video_files));
    details.insert("image_files".into(), json!(image_files));

    let mut score = 100.0;
    let mut issues = Vec::new();

    if malformed > 0 {
        let malformed_ratio = ratio(malformed, media.len());
        issues.push(format!(
            "malformed media URLs: {malformed} ({:.2}%)",
            malformed_ratio * 100.0
        ));
        score -= malformed_ratio * MALFORMED_WEIGHT;
    }

    DimensionResult::new(score, issues, details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::MediaAsset;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn hosts() -> Vec<String> {
        ValidationRules::default().allowed_media_hosts
    }

    fn with_media(id: &str, urls: &[Option<&str>]) -> Post {
        let mut post = Post::new(id, "post with attachments");
        post.media = urls
            .iter()
            .map(|url| MediaAsset {
                kind: MediaKind::Photo,
                id: None,
                url: url.map(str::to_string),
                bitrate: None,
            })
            .collect();
        post
    }

    struct CountingProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaProbe for CountingProbe {
        async fn is_reachable(&self, _url: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0
        }
    }

    #[test]
    fn test_well_formed_urls() {
        let hosts = hosts();
        assert!(is_well_formed("https://pbs.twimg.com/media/a.jpg", &hosts));
        assert!(is_well_formed("https://twitter.com/i/videos/1", &hosts));
        assert!(!is_well_formed("http://pbs.twimg.com/media/a.jpg", &hosts));
        assert!(!is_well_formed("https://eviltwimg.com/a.jpg", &hosts));
        assert!(!is_well_formed("https://example.com/twimg.com/a.jpg", &hosts));
        assert!(!is_well_formed("not a url", &hosts));
    }

    #[tokio::test]
    async fn test_no_media_is_perfect() {
        let result = check(&[Post::new("1", "text")], &ValidationRules::default(), None).await;
        assert_eq!(result.score, 100.0);
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_malformed_and_null_urls() {
        let posts = vec![
            with_media("1", &[Some("https://pbs.twimg.com/a.jpg"), None]),
            with_media("2", &[Some("ftp://pbs.twimg.com/b.jpg"), Some("https://pbs.twimg.com/c.jpg")]),
        ];
        let result = check(&posts, &ValidationRules::default(), None).await;

        // half of four URLs malformed: 100 - 0.5 * 60
        assert!((result.score - 70.0).abs() < 1e-9);
        assert_eq!(result.details["invalid_urls"], 2);
        assert_eq!(result.details["probed_urls"], 0);
    }

    #[tokio::test]
    async fn test_probe_sample_is_bounded_and_not_penalized() {
        let urls: Vec<Option<&str>> = vec![Some("https://pbs.twimg.com/x.jpg"); 6];
        let posts = vec![with_media("1", &urls)];
        let probe = CountingProbe {
            calls: AtomicUsize::new(0),
        };

        let result = check(&posts, &ValidationRules::default(), Some(&probe)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.details["accessible_urls"], 2);
        assert_eq!(result.score, 100.0);
    }
}
