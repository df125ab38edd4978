//! Post resolution.
//!
//! Collapses the upstream post shapes (plain, reshare, quote, long-form note,
//! visibility-wrapped) into a single [`Post`].

use serde::Deserialize;
use serde_json::Value;

use super::diagnostic::Diagnostic;
use super::media::MediaResolver;
use super::raw::{RawTweet, RawTweetResult, RawUser};
use super::types::{Post, Stats, User};

/// Deepest nesting level that is still resolved.
///
/// The top post is depth 0, its reshare or quote depth 1, and a quote inside
/// a reshare depth 2.
pub const MAX_DEPTH: usize = 2;

/// Resolves raw post nodes into canonical posts.
pub struct PostResolver;

impl PostResolver {
    /// Resolve a `tweet_results.result` node.
    ///
    /// Returns `None` when the node is not a recognizable post.
    #[must_use]
    pub fn resolve(node: &Value) -> Option<Post> {
        let mut diagnostics = Vec::new();
        Self::resolve_with_diagnostics(node, &mut diagnostics)
    }

    /// Like [`PostResolver::resolve`], appending findings to `diagnostics`.
    pub fn resolve_with_diagnostics(
        node: &Value,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Post> {
        Self::resolve_at(node, 0, "post", diagnostics)
    }

    fn resolve_at(
        node: &Value,
        depth: usize,
        context: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Post> {
        let tweet = match RawTweetResult::deserialize(node) {
            Ok(result) => match result.into_tweet() {
                Some(tweet) => tweet,
                None => {
                    let typename = node
                        .get("__typename")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    diagnostics.push(Diagnostic::UnresolvedNode {
                        context: context.to_string(),
                        reason: format!("unsupported __typename {typename}"),
                    });
                    return None;
                }
            },
            Err(e) => {
                diagnostics.push(Diagnostic::UnresolvedNode {
                    context: context.to_string(),
                    reason: e.to_string(),
                });
                return None;
            }
        };

        Self::resolve_tweet(tweet, depth, context, diagnostics)
    }

    fn resolve_tweet(
        tweet: RawTweet,
        depth: usize,
        context: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Post> {
        let Some(id) = tweet.rest_id.filter(|id| !id.is_empty()) else {
            diagnostics.push(Diagnostic::MissingId {
                context: context.to_string(),
            });
            return None;
        };

        let legacy = tweet.legacy.unwrap_or_default();

        let note_text = tweet
            .note_tweet
            .and_then(|n| n.note_tweet_results)
            .and_then(|r| r.result)
            .and_then(|r| r.text)
            .filter(|t| !t.is_empty());
        let text = note_text.or(legacy.full_text).unwrap_or_default();

        let user = tweet
            .core
            .and_then(|c| c.user_results)
            .and_then(|r| r.result)
            .and_then(|node| Self::resolve_user(&node, &id, diagnostics));

        let media = legacy
            .extended_entities
            .map(|e| e.media)
            .unwrap_or_default()
            .iter()
            .filter_map(MediaResolver::resolve)
            .collect();

        let reshare_node = legacy.retweeted_status_result.and_then(|r| r.result);
        let quote_node = tweet.quoted_status_result.and_then(|r| r.result);

        let (reshare_of, quoted) = if depth < MAX_DEPTH {
            let reshare = reshare_node.and_then(|node| {
                Self::resolve_at(&node, depth + 1, &format!("retweet of {id}"), diagnostics)
            });
            let quote = quote_node.and_then(|node| {
                Self::resolve_at(&node, depth + 1, &format!("quote of {id}"), diagnostics)
            });
            (reshare, quote)
        } else {
            if reshare_node.is_some() || quote_node.is_some() {
                diagnostics.push(Diagnostic::NestingTruncated {
                    post_id: id.clone(),
                    depth,
                });
            }
            (None, None)
        };

        Some(Post {
            id,
            text,
            created_at: legacy.created_at,
            lang: legacy.lang,
            user,
            stats: Stats {
                retweet_count: legacy.retweet_count,
                favorite_count: legacy.favorite_count,
                reply_count: legacy.reply_count,
                quote_count: legacy.quote_count,
            },
            media,
            reshare_of: reshare_of.map(Box::new),
            quoted: quoted.map(Box::new),
            truncated: legacy.truncated,
        })
    }

    fn resolve_user(
        node: &Value,
        post_id: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<User> {
        if let Some(typename) = node.get("__typename").and_then(Value::as_str) {
            if typename != "User" {
                diagnostics.push(Diagnostic::UnresolvedUser {
                    post_id: post_id.to_string(),
                    reason: format!("unsupported __typename {typename}"),
                });
                return None;
            }
        }

        let raw = match RawUser::deserialize(node) {
            Ok(raw) => raw,
            Err(e) => {
                diagnostics.push(Diagnostic::UnresolvedUser {
                    post_id: post_id.to_string(),
                    reason: e.to_string(),
                });
                return None;
            }
        };

        let core = raw.core.unwrap_or_default();
        let legacy = raw.legacy.unwrap_or_default();

        Some(User {
            id: raw.rest_id,
            name: core.name,
            screen_name: core.screen_name,
            description: legacy.description,
            followers_count: legacy.followers_count,
            friends_count: legacy.friends_count,
            verified: raw.verification.is_some_and(|v| v.verified),
            is_blue_verified: raw.is_blue_verified.unwrap_or(false),
        })
    }
}
