//! Raw GraphQL timeline payload shapes.
//!
//! Variant nodes are tagged unions keyed by their upstream discriminant
//! (`__typename`, `type`). Links to nested nodes stay as [`Value`] so a
//! malformed child never poisons its parent; each child is decoded on its own
//! when the resolver reaches it.

use serde::Deserialize;
use serde_json::Value;

/// A `*_results.result` node.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum RawTweetResult {
    Tweet(RawTweet),
    /// Visibility-limited envelope around the actual post.
    TweetWithVisibilityResults { tweet: RawTweet },
    #[serde(other)]
    Unsupported,
}

impl RawTweetResult {
    /// Unwrap at most one visibility envelope.
    pub fn into_tweet(self) -> Option<RawTweet> {
        match self {
            Self::Tweet(tweet) | Self::TweetWithVisibilityResults { tweet } => Some(tweet),
            Self::Unsupported => None,
        }
    }
}

/// Wrapper object holding a `result` node.
#[derive(Debug, Default, Deserialize)]
pub struct RawResultRef {
    #[serde(default)]
    pub result: Option<Value>,
}

/// A post node.
#[derive(Debug, Default, Deserialize)]
pub struct RawTweet {
    #[serde(default)]
    pub rest_id: Option<String>,
    #[serde(default)]
    pub core: Option<RawTweetCore>,
    #[serde(default)]
    pub legacy: Option<RawTweetLegacy>,
    #[serde(default)]
    pub note_tweet: Option<RawNoteTweet>,
    #[serde(default)]
    pub quoted_status_result: Option<RawResultRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTweetCore {
    #[serde(default)]
    pub user_results: Option<RawResultRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTweetLegacy {
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub extended_entities: Option<RawExtendedEntities>,
    #[serde(default)]
    pub retweeted_status_result: Option<RawResultRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawExtendedEntities {
    #[serde(default)]
    pub media: Vec<Value>,
}

/// Long-form text container: `note_tweet.note_tweet_results.result.text`.
#[derive(Debug, Default, Deserialize)]
pub struct RawNoteTweet {
    #[serde(default)]
    pub note_tweet_results: Option<RawNoteTweetResults>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawNoteTweetResults {
    #[serde(default)]
    pub result: Option<RawNoteTweetResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawNoteTweetResult {
    #[serde(default)]
    pub text: Option<String>,
}

/// An author node: `core.user_results.result`.
#[derive(Debug, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub rest_id: Option<String>,
    #[serde(default)]
    pub is_blue_verified: Option<bool>,
    #[serde(default)]
    pub core: Option<RawUserCore>,
    #[serde(default)]
    pub legacy: Option<RawUserLegacy>,
    #[serde(default)]
    pub verification: Option<RawUserVerification>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawUserCore {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub screen_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawUserLegacy {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub friends_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawUserVerification {
    #[serde(default)]
    pub verified: bool,
}

/// A media attachment from `legacy.extended_entities.media[]`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawMedia {
    Photo(RawImage),
    Video(RawVideo),
    AnimatedGif(RawImage),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default)]
    pub media_url_https: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVideo {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default)]
    pub video_info: Option<RawVideoInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVideoInfo {
    #[serde(default)]
    pub variants: Vec<RawVariant>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVariant {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A timeline instruction.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum RawInstruction {
    TimelineAddEntries {
        #[serde(default)]
        entries: Vec<Value>,
    },
    #[serde(other)]
    Other,
}

/// A timeline entry before classification.
#[derive(Debug, Deserialize)]
pub struct RawEntry {
    #[serde(rename = "entryId")]
    pub entry_id: String,
    #[serde(default)]
    pub content: Value,
}

/// `content` of a `tweet-` entry.
#[derive(Debug, Default, Deserialize)]
pub struct RawTweetEntryContent {
    #[serde(rename = "itemContent", default)]
    pub item_content: Option<RawItemContent>,
}

/// `itemContent` of a post entry or module item.
#[derive(Debug, Default, Deserialize)]
pub struct RawItemContent {
    #[serde(rename = "itemType", default)]
    pub item_type: Option<String>,
    #[serde(rename = "__typename", default)]
    pub typename: Option<String>,
    #[serde(default)]
    pub tweet_results: Option<RawResultRef>,
}

impl RawItemContent {
    /// Whether the item carries a post (`TimelineTweet`).
    pub fn is_timeline_tweet(&self) -> bool {
        self.item_type.as_deref() == Some("TimelineTweet")
            || self.typename.as_deref() == Some("TimelineTweet")
    }
}

/// `content` of a `home-conversation-` entry.
#[derive(Debug, Default, Deserialize)]
pub struct RawModuleContent {
    #[serde(rename = "entryType", default)]
    pub entry_type: Option<String>,
    #[serde(rename = "__typename", default)]
    pub typename: Option<String>,
    #[serde(default)]
    pub items: Vec<Value>,
}

impl RawModuleContent {
    pub fn is_module(&self) -> bool {
        self.entry_type.as_deref() == Some("TimelineTimelineModule")
            || self.typename.as_deref() == Some("TimelineTimelineModule")
    }
}

/// One element of a module's `items[]`.
#[derive(Debug, Default, Deserialize)]
pub struct RawModuleItem {
    #[serde(default)]
    pub item: Option<RawModuleItemBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawModuleItemBody {
    #[serde(rename = "itemContent", default)]
    pub item_content: Option<RawItemContent>,
}

/// `content` of a cursor entry.
#[derive(Debug, Default, Deserialize)]
pub struct RawCursorContent {
    #[serde(rename = "cursorType", default)]
    pub cursor_type: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}
