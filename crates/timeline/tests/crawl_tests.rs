//! End-to-end crawl tests against a scripted transport.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use timeline::config::CrawlerConfig;
use timeline::crawl::{CrawlEngine, TerminationReason};
use timeline::error::{CrawlError, Result};
use timeline::storage::CorpusStore;
use timeline::twitter::{Cursor, Features, TimelineEndpoint, Transport};

/// Replays canned responses in order and records the cursors it was asked for.
struct ScriptedTransport {
    responses: Mutex<Vec<Result<Value>>>,
    cursors: Mutex<Vec<Option<String>>>,
}

impl ScriptedTransport {
    fn new(mut responses: Vec<Result<Value>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            cursors: Mutex::new(Vec::new()),
        }
    }

    fn requested_cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch_page(
        &self,
        _endpoint: TimelineEndpoint,
        cursor: Option<&Cursor>,
        _features: &Features,
    ) -> Result<Value> {
        self.cursors
            .lock()
            .unwrap()
            .push(cursor.map(|c| c.as_str().to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(json!({})))
    }
}

#[async_trait]
impl<'a> Transport for &'a ScriptedTransport {
    async fn fetch_page(
        &self,
        endpoint: TimelineEndpoint,
        cursor: Option<&Cursor>,
        features: &Features,
    ) -> Result<Value> {
        (**self).fetch_page(endpoint, cursor, features).await
    }
}

fn user(id: &str, handle: &str) -> Value {
    json!({
        "__typename": "User",
        "rest_id": id,
        "core": { "name": handle.to_uppercase(), "screen_name": handle },
        "legacy": { "followers_count": 10 }
    })
}

fn tweet(id: &str, text: &str, created_at: &str) -> Value {
    json!({
        "__typename": "Tweet",
        "rest_id": id,
        "core": { "user_results": { "result": user(&format!("u{id}"), &format!("user{id}")) } },
        "legacy": { "full_text": text, "created_at": created_at, "lang": "en" }
    })
}

fn tweet_entry(result: Value) -> Value {
    let id = result["rest_id"].as_str().unwrap_or_default().to_string();
    json!({
        "entryId": format!("tweet-{id}"),
        "content": { "itemContent": {
            "itemType": "TimelineTweet",
            "tweet_results": { "result": result }
        }}
    })
}

fn cursor_entry(value: &str) -> Value {
    json!({
        "entryId": format!("cursor-bottom-{value}"),
        "content": { "cursorType": "Bottom", "value": value }
    })
}

fn page(entries: Vec<Value>) -> Value {
    json!({ "data": { "home": { "home_timeline_urt": { "instructions": [
        { "type": "TimelineAddEntries", "entries": entries }
    ]}}}})
}

fn simple_page(ids: &[&str], cursor: Option<&str>) -> Value {
    let mut entries: Vec<Value> = ids
        .iter()
        .map(|id| tweet_entry(tweet(id, &format!("post {id}"), "Wed Oct 05 22:34:12 +0000 2011")))
        .collect();
    if let Some(cursor) = cursor {
        entries.push(cursor_entry(cursor));
    }
    page(entries)
}

fn config(target: usize) -> CrawlerConfig {
    let mut config = CrawlerConfig::default();
    config.settings.jitter_min_secs = 0.0;
    config.settings.jitter_max_secs = 0.0;
    config.settings.cooldown_secs = 0;
    config.targets.daily_tweet_count = target;
    config
}

#[tokio::test]
async fn test_mixed_page_then_stall() {
    let mut reshare = tweet("2", "RT @user9: original text", "Thu Oct 06 10:00:00 +0000 2011");
    reshare["legacy"]["retweeted_status_result"] = json!({
        "result": tweet("9", "original text", "Mon Oct 03 10:00:00 +0000 2011")
    });
    let mut quote = tweet("3", "my take", "Fri Oct 07 10:00:00 +0000 2011");
    quote["quoted_status_result"] = json!({
        "result": tweet("8", "quoted text", "Sun Oct 02 10:00:00 +0000 2011")
    });

    let first = page(vec![
        tweet_entry(tweet("1", "plain post", "Wed Oct 05 10:00:00 +0000 2011")),
        tweet_entry(reshare.clone()),
        tweet_entry(quote.clone()),
        cursor_entry("next-1"),
    ]);
    let stall = page(vec![
        tweet_entry(tweet("1", "plain post", "Wed Oct 05 10:00:00 +0000 2011")),
        tweet_entry(reshare),
        tweet_entry(quote),
        cursor_entry("next-2"),
    ]);

    let transport = ScriptedTransport::new(vec![Ok(first), Ok(stall)]);
    let mut engine = CrawlEngine::new(&transport, &config(100));
    let outcome = engine.run().await;

    assert_eq!(outcome.termination, TerminationReason::NoNewPosts);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.requests_made, 2);
    assert_eq!(outcome.duplicates_in_run, 3);
    assert_eq!(
        transport.requested_cursors(),
        vec![None, Some("next-1".to_string())]
    );

    let ids: Vec<&str> = outcome.posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "2", "1"]);

    let reshare = &outcome.posts[1];
    assert_eq!(reshare.reshare_of.as_ref().unwrap().id, "9");
    assert_eq!(reshare.reshare_of.as_ref().unwrap().text, "original text");
    let quote = &outcome.posts[0];
    assert_eq!(quote.quoted.as_ref().unwrap().text, "quoted text");
    assert_eq!(
        quote.user.as_ref().unwrap().screen_name.as_deref(),
        Some("user3")
    );
}

#[tokio::test]
async fn test_quote_behind_visibility_envelope() {
    let mut quote = tweet("3", "my take", "Fri Oct 07 10:00:00 +0000 2011");
    quote["quoted_status_result"] = json!({
        "result": {
            "__typename": "TweetWithVisibilityResults",
            "tweet": tweet("8", "limited quote", "Sun Oct 02 10:00:00 +0000 2011")
        }
    });

    let transport = ScriptedTransport::new(vec![Ok(page(vec![tweet_entry(quote)]))]);
    let outcome = CrawlEngine::new(&transport, &config(100)).run().await;

    assert_eq!(outcome.posts.len(), 1);
    let quoted = outcome.posts[0].quoted.as_ref().unwrap();
    assert_eq!(quoted.id, "8");
    assert_eq!(quoted.text, "limited quote");
}

#[tokio::test]
async fn test_cross_page_duplicate_keeps_first() {
    let first = page(vec![
        tweet_entry(tweet("1", "first version", "Wed Oct 05 10:00:00 +0000 2011")),
        cursor_entry("c1"),
    ]);
    let second = page(vec![
        tweet_entry(tweet("1", "second version", "Wed Oct 05 10:00:00 +0000 2011")),
        tweet_entry(tweet("2", "another", "Wed Oct 05 09:00:00 +0000 2011")),
    ]);

    let transport = ScriptedTransport::new(vec![Ok(first), Ok(second)]);
    let outcome = CrawlEngine::new(&transport, &config(100)).run().await;

    assert_eq!(outcome.posts.len(), 2);
    assert_eq!(outcome.posts[0].text, "first version");
    assert_eq!(outcome.duplicates_in_run, 1);
    assert_eq!(outcome.total_seen, 3);
}

#[tokio::test]
async fn test_output_sorted_newest_first() {
    let first = page(vec![
        tweet_entry(tweet("a", "old", "Mon Oct 03 10:00:00 +0000 2011")),
        tweet_entry(tweet("b", "undated", "not a date")),
        tweet_entry(tweet("c", "new", "Fri Oct 07 10:00:00 +0000 2011")),
        tweet_entry(tweet("d", "mid", "Wed Oct 05 10:00:00 +0000 2011")),
    ]);

    let transport = ScriptedTransport::new(vec![Ok(first)]);
    let outcome = CrawlEngine::new(&transport, &config(100)).run().await;

    let ids: Vec<&str> = outcome.posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "d", "a", "b"]);
}

#[tokio::test]
async fn test_transport_error_keeps_collected_posts() {
    let transport = ScriptedTransport::new(vec![
        Ok(simple_page(&["1", "2"], Some("c1"))),
        Err(CrawlError::Status {
            status: 500,
            body: "internal".to_string(),
        }),
    ]);
    let outcome = CrawlEngine::new(&transport, &config(100)).run().await;

    assert!(matches!(outcome.termination, TerminationReason::Transport(_)));
    assert_eq!(outcome.posts.len(), 2);
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.requests_made, 2);
    assert_eq!(outcome.last_cursor, Some(Cursor::new("c1")));
}

#[tokio::test]
async fn test_rate_limited_after_cooldown() {
    let transport = ScriptedTransport::new(vec![
        Ok(simple_page(&["1"], Some("c1"))),
        Err(CrawlError::RateLimited),
    ]);
    let outcome = CrawlEngine::new(&transport, &config(100)).run().await;

    assert_eq!(outcome.termination, TerminationReason::RateLimited);
    assert_eq!(outcome.posts.len(), 1);
    assert_eq!(outcome.pages_fetched, 1);
}

#[tokio::test]
async fn test_target_truncates_corpus() {
    let transport = ScriptedTransport::new(vec![Ok(simple_page(&["1", "2", "3", "4"], Some("c1")))]);
    let outcome = CrawlEngine::new(&transport, &config(3)).run().await;

    assert_eq!(outcome.termination, TerminationReason::TargetReached);
    assert_eq!(outcome.posts.len(), 3);
    assert_eq!(outcome.requests_made, 1);
}

#[tokio::test]
async fn test_page_ceiling() {
    let transport = ScriptedTransport::new(vec![
        Ok(simple_page(&["1"], Some("c1"))),
        Ok(simple_page(&["2"], Some("c2"))),
        Ok(simple_page(&["3"], Some("c3"))),
    ]);
    let mut config = config(100);
    config.targets.max_pages = Some(2);
    let outcome = CrawlEngine::new(&transport, &config).run().await;

    assert_eq!(outcome.termination, TerminationReason::PageLimit);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.posts.len(), 2);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();

    let transport = ScriptedTransport::new(vec![Ok(simple_page(&["1"], Some("c1")))]);
    let outcome = CrawlEngine::new(&transport, &config(100))
        .with_cancellation(token)
        .run()
        .await;

    assert_eq!(outcome.termination, TerminationReason::Cancelled);
    assert_eq!(outcome.requests_made, 0);
    assert!(outcome.posts.is_empty());
}

#[tokio::test]
async fn test_empty_first_page() {
    let transport = ScriptedTransport::new(vec![Ok(page(vec![cursor_entry("c1")]))]);
    let outcome = CrawlEngine::new(&transport, &config(100)).run().await;

    assert_eq!(outcome.termination, TerminationReason::EmptyPage);
    assert!(outcome.posts.is_empty());
}

#[tokio::test]
async fn test_two_runs_merge_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = CorpusStore::new(dir.path());
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let morning = ScriptedTransport::new(vec![Ok(simple_page(&["1", "2", "3"], None))]);
    let first = CrawlEngine::new(&morning, &config(100)).run().await;
    store.persist(first.posts, "recommended", now).unwrap();

    let evening = ScriptedTransport::new(vec![Ok(simple_page(&["3", "4"], None))]);
    let second = CrawlEngine::new(&evening, &config(100)).run().await;
    let snapshot = store.persist(second.posts, "recommended", now).unwrap();

    assert_eq!(snapshot.unique_tweet_count, 4);
    assert_eq!(snapshot.total_crawled, 2);
    assert_eq!(snapshot.duplicates_removed, 1);
    assert!(store
        .path_for("recommended", now)
        .ends_with("daily_posts/20240301_recommended_posts.json"));
}
