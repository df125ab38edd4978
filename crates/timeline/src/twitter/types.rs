//! Canonical timeline data types.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Timestamp format used by the upstream `legacy.created_at` field,
/// e.g. `Wed Oct 05 22:34:12 +0000 2011`.
pub const UPSTREAM_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parse an upstream timestamp string.
pub fn parse_upstream_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw.trim(), UPSTREAM_TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Deserialize a missing or `null` field as its default value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A canonical timeline post.
///
/// Every field may be absent or `null` when read back from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique post ID (`rest_id`). Empty when the source had none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Post text content.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Upstream creation timestamp, kept verbatim.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Language tag.
    #[serde(default)]
    pub lang: Option<String>,
    /// Post author.
    #[serde(default)]
    pub user: Option<User>,
    /// Engagement counters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: Stats,
    /// Attached media, in upstream order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub media: Vec<MediaAsset>,
    /// The original post if this is a reshare.
    #[serde(rename = "retweet", alias = "reshare_of", default)]
    pub reshare_of: Option<Box<Post>>,
    /// The quoted post if this quotes another.
    #[serde(default)]
    pub quoted: Option<Box<Post>>,
    /// Upstream truncation flag.
    #[serde(default, deserialize_with = "null_as_default")]
    pub truncated: bool,
}

impl Post {
    /// Create a post with only an ID and text.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            created_at: None,
            lang: None,
            user: None,
            stats: Stats::default(),
            media: Vec::new(),
            reshare_of: None,
            quoted: None,
            truncated: false,
        }
    }

    /// Parsed creation time, if the upstream value is well-formed.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_upstream_timestamp)
    }

    /// Whether this post reshares another.
    #[must_use]
    pub fn is_reshare(&self) -> bool {
        self.reshare_of.is_some()
    }

    /// Whether any attached media is of the given kind.
    #[must_use]
    pub fn has_media_kind(&self, kind: MediaKind) -> bool {
        self.media.iter().any(|m| m.kind == kind)
    }

    /// Corpus ordering: newest first, then ID ascending.
    ///
    /// Posts without a parseable timestamp sort after all dated posts.
    #[must_use]
    pub fn corpus_order(a: &Post, b: &Post) -> Ordering {
        match (a.created_at_utc(), b.created_at_utc()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.id.cmp(&b.id))
    }
}

/// Post author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID (`rest_id`).
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Handle (without @).
    #[serde(default)]
    pub screen_name: Option<String>,
    /// Profile bio.
    #[serde(default)]
    pub description: Option<String>,
    /// Follower count.
    #[serde(default)]
    pub followers_count: Option<u64>,
    /// Following count.
    #[serde(default)]
    pub friends_count: Option<u64>,
    /// Legacy verification badge.
    #[serde(default)]
    pub verified: bool,
    /// Paid verification badge.
    #[serde(default)]
    pub is_blue_verified: bool,
}

/// Engagement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Times the post was reshared.
    #[serde(default)]
    pub retweet_count: u64,
    /// Like count.
    #[serde(default)]
    pub favorite_count: u64,
    /// Reply count.
    #[serde(default)]
    pub reply_count: u64,
    /// Times the post was quoted.
    #[serde(default)]
    pub quote_count: u64,
}

/// Media attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Media type.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Media ID (`id_str`).
    #[serde(default)]
    pub id: Option<String>,
    /// Resolved URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Chosen bitrate for video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
}

/// Type of media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Image attachment.
    Photo,
    /// Video attachment.
    Video,
    /// Looping GIF attachment.
    AnimatedGif,
}

/// Opaque, server-issued pagination token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(id: &str, created_at: Option<&str>) -> Post {
        let mut post = Post::new(id, "text");
        post.created_at = created_at.map(str::to_string);
        post
    }

    #[test]
    fn test_parse_upstream_timestamp() {
        let parsed = parse_upstream_timestamp("Wed Oct 05 22:34:12 +0000 2011").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2011-10-05T22:34:12+00:00");
        assert!(parse_upstream_timestamp("2011-10-05").is_none());
    }

    #[test]
    fn test_corpus_order() {
        let mut posts = vec![
            dated("3", Some("Wed Oct 05 22:34:12 +0000 2011")),
            dated("2", None),
            dated("1", Some("Thu Oct 06 08:00:00 +0000 2011")),
            dated("0", Some("Wed Oct 05 22:34:12 +0000 2011")),
        ];
        posts.sort_by(Post::corpus_order);

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "0", "3", "2"]);
    }

    #[test]
    fn test_reshare_serializes_as_retweet() {
        let mut post = Post::new("1", "RT");
        post.reshare_of = Some(Box::new(Post::new("2", "original")));

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["retweet"]["id"], "2");

        let back: Post = serde_json::from_value(value).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn test_missing_and_null_fields_default() {
        let post: Post = serde_json::from_value(serde_json::json!({
            "text": null,
            "media": null,
            "created_at": "Wed Oct 05 22:34:12 +0000 2011"
        }))
        .unwrap();
        assert!(post.id.is_empty());
        assert!(post.text.is_empty());
        assert!(post.media.is_empty());
        assert!(post.user.is_none());
    }

    #[test]
    fn test_media_kind_wire_names() {
        let json = serde_json::to_string(&MediaKind::AnimatedGif).unwrap();
        assert_eq!(json, "\"animated_gif\"");
    }

    #[test]
    fn test_cursor_is_transparent() {
        let cursor = Cursor::new("DAABCgABF");
        assert_eq!(serde_json::to_string(&cursor).unwrap(), "\"DAABCgABF\"");
        assert_eq!(cursor.to_string(), "DAABCgABF");
    }
}
