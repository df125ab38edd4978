//! Home timeline GraphQL transport.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::codec;
use super::types::Cursor;
use crate::auth::Session;
use crate::error::{CrawlError, Result};

/// GraphQL API base URL.
pub const API_BASE_URL: &str = "https://x.com/i/api/graphql";

/// Posts requested per page.
pub const PAGE_SIZE: u32 = 20;

/// Browser user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Maximum body length kept in a status error.
const ERROR_BODY_LIMIT: usize = 200;

/// GraphQL feature flags sent with a timeline request.
pub type Features = BTreeMap<String, bool>;

/// Which home timeline to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineEndpoint {
    /// Algorithmic "For you" timeline.
    #[default]
    Recommended,
    /// Chronological "Following" timeline.
    Following,
}

impl TimelineEndpoint {
    /// `{query_id}/{operation}` path segment.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Recommended => "xNGIIoXaz9DyeBXBfn3AjA/HomeLatestTimeline",
            Self::Following => "1_nms9JVtHQxTw8VwZJciQ/HomeTimeline",
        }
    }

    /// Scope name used in corpus file names.
    #[must_use]
    pub fn scope(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Following => "following",
        }
    }
}

impl fmt::Display for TimelineEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scope())
    }
}

impl FromStr for TimelineEndpoint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommended" | "for-you" | "foryou" => Ok(Self::Recommended),
            "following" => Ok(Self::Following),
            other => Err(format!("unknown timeline: {other}")),
        }
    }
}

/// Feature flags the web client sends with home timeline requests.
#[must_use]
pub fn default_features() -> Features {
    [
        ("rweb_video_screen_enabled", false),
        ("payments_enabled", false),
        ("profile_label_improvements_pcf_label_in_post_enabled", true),
        ("rweb_tipjar_consumption_enabled", true),
        ("verified_phone_label_enabled", false),
        ("creator_subscriptions_tweet_preview_api_enabled", true),
        ("responsive_web_graphql_timeline_navigation_enabled", true),
        ("responsive_web_graphql_skip_user_profile_image_extensions_enabled", false),
        ("premium_content_api_read_enabled", false),
        ("communities_web_enable_tweet_community_results_fetch", true),
        ("c9s_tweet_anatomy_moderator_badge_enabled", true),
        ("responsive_web_grok_analyze_button_fetch_trends_enabled", false),
        ("responsive_web_grok_analyze_post_followups_enabled", true),
        ("responsive_web_jetfuel_frame", true),
        ("responsive_web_grok_share_attachment_enabled", true),
        ("articles_preview_enabled", true),
        ("responsive_web_edit_tweet_api_enabled", true),
        ("graphql_is_translatable_rweb_tweet_is_translatable_enabled", true),
        ("view_counts_everywhere_api_enabled", true),
        ("longform_notetweets_consumption_enabled", true),
        ("responsive_web_twitter_article_tweet_consumption_enabled", true),
        ("tweet_awards_web_tipping_enabled", false),
        ("responsive_web_grok_show_grok_translated_post", false),
        ("responsive_web_grok_analysis_button_from_backend", true),
        ("creator_subscriptions_quote_tweet_preview_enabled", false),
        ("freedom_of_speech_not_reach_fetch_enabled", true),
        ("standardized_nudges_misinfo", true),
        ("tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled", true),
        ("longform_notetweets_rich_text_read_enabled", true),
        ("longform_notetweets_inline_media_enabled", true),
        ("responsive_web_grok_image_annotation_enabled", true),
        ("responsive_web_grok_imagine_annotation_enabled", true),
        ("responsive_web_grok_community_note_auto_translation_is_enabled", false),
        ("responsive_web_enhance_cards_enabled", false),
    ]
    .into_iter()
    .map(|(name, enabled)| (name.to_string(), enabled))
    .collect()
}

/// `variables` object for a timeline request.
#[must_use]
pub fn timeline_variables(cursor: Option<&Cursor>) -> Value {
    let mut variables = json!({
        "count": PAGE_SIZE,
        "includePromotedContent": true,
        "latestControlAvailable": true,
        "requestContext": "launch",
        "withCommunity": true,
    });
    if let Some(cursor) = cursor {
        variables["cursor"] = Value::String(cursor.as_str().to_string());
    }
    variables
}

/// Fetches raw timeline pages.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch one page, starting after `cursor` when given.
    async fn fetch_page(
        &self,
        endpoint: TimelineEndpoint,
        cursor: Option<&Cursor>,
        features: &Features,
    ) -> Result<Value>;
}

/// Transport over the GraphQL web API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport authenticated with `session`.
    pub fn new(session: &Session, timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(Self::headers(session)?)
            .timeout(timeout);

        if let Some(proxy) = proxy.filter(|p| !p.is_empty()) {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Point the transport at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn headers(session: &Session) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut insert = |name: &'static str, value: &str| -> Result<()> {
            let value = HeaderValue::from_str(value)
                .map_err(|e| CrawlError::config(format!("invalid {name} header: {e}")))?;
            headers.insert(HeaderName::from_static(name), value);
            Ok(())
        };

        insert("accept", "*/*")?;
        insert("accept-language", "en-US,en;q=0.9")?;
        insert("referer", "https://x.com/home")?;
        insert("origin", "https://x.com")?;
        insert("x-requested-with", "XMLHttpRequest")?;
        insert("sec-fetch-dest", "empty")?;
        insert("sec-fetch-mode", "cors")?;
        insert("sec-fetch-site", "same-origin")?;
        insert("x-twitter-active-user", "yes")?;
        insert("x-twitter-auth-type", "OAuth2Session")?;
        insert("cookie", &session.cookie_string())?;
        if let Some(authorization) = session.authorization() {
            insert("authorization", &authorization)?;
        }
        if let Some(csrf) = session.csrf() {
            insert("x-csrf-token", csrf)?;
        }

        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_page(
        &self,
        endpoint: TimelineEndpoint,
        cursor: Option<&Cursor>,
        features: &Features,
    ) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let variables = timeline_variables(cursor).to_string();
        let features = serde_json::to_string(features)?;

        tracing::debug!(%endpoint, has_cursor = cursor.is_some(), "Requesting timeline page");

        let response = self
            .client
            .get(&url)
            .query(&[("variables", variables), ("features", features)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(%endpoint, "Upstream rate limit hit");
            return Err(CrawlError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(CrawlError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        codec::decode_json(&bytes)
    }
}
