//! Timeline page extraction.

use serde::Deserialize;
use serde_json::Value;

use super::diagnostic::Diagnostic;
use super::raw::{
    RawCursorContent, RawEntry, RawInstruction, RawItemContent, RawModuleContent, RawModuleItem,
    RawTweetEntryContent,
};
use super::resolver::PostResolver;
use super::types::{Cursor, Post};

/// JSON pointer to the instruction list of a home timeline response.
pub const INSTRUCTIONS_POINTER: &str = "/data/home/home_timeline_urt/instructions";

const TWEET_ENTRY_PREFIX: &str = "tweet-";
const CONVERSATION_ENTRY_PREFIX: &str = "home-conversation-";
const CURSOR_ENTRY_MARKER: &str = "cursor-";
const BOTTOM_CURSOR: &str = "Bottom";

/// Posts and pagination state pulled from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Resolved posts, in entry order.
    pub posts: Vec<Post>,
    /// Bottom cursor for the next page, if the page carried one.
    pub next_cursor: Option<Cursor>,
    /// Everything that was skipped along the way.
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns a raw timeline page into posts and a cursor.
pub struct PageExtractor;

impl PageExtractor {
    /// Extract posts and the bottom cursor from a page.
    ///
    /// Keeps no state between calls; the cursor is handed back to the caller.
    #[must_use]
    pub fn extract(page: &Value) -> ExtractedPage {
        let mut out = ExtractedPage::default();

        let Some(instructions) = page.pointer(INSTRUCTIONS_POINTER).and_then(Value::as_array)
        else {
            out.diagnostics.push(Diagnostic::MalformedEntry {
                entry_id: INSTRUCTIONS_POINTER.to_string(),
                reason: "instruction list missing".to_string(),
            });
            return out;
        };

        for instruction in instructions {
            match RawInstruction::deserialize(instruction) {
                Ok(RawInstruction::TimelineAddEntries { entries }) => {
                    for entry in &entries {
                        Self::extract_entry(entry, &mut out);
                    }
                }
                Ok(RawInstruction::Other) => {}
                Err(e) => out.diagnostics.push(Diagnostic::MalformedEntry {
                    entry_id: "instruction".to_string(),
                    reason: e.to_string(),
                }),
            }
        }

        out
    }

    fn extract_entry(entry: &Value, out: &mut ExtractedPage) {
        let entry = match RawEntry::deserialize(entry) {
            Ok(entry) => entry,
            Err(e) => {
                out.diagnostics.push(Diagnostic::MalformedEntry {
                    entry_id: "unknown".to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        if entry.entry_id.starts_with(TWEET_ENTRY_PREFIX) {
            Self::extract_tweet_entry(&entry, out);
        } else if entry.entry_id.starts_with(CONVERSATION_ENTRY_PREFIX) {
            Self::extract_conversation(&entry, out);
        } else if entry.entry_id.contains(CURSOR_ENTRY_MARKER) {
            Self::extract_cursor(&entry, out);
        }
    }

    fn extract_tweet_entry(entry: &RawEntry, out: &mut ExtractedPage) {
        let content = match RawTweetEntryContent::deserialize(&entry.content) {
            Ok(content) => content,
            Err(e) => {
                out.diagnostics.push(Diagnostic::MalformedEntry {
                    entry_id: entry.entry_id.clone(),
                    reason: e.to_string(),
                });
                return;
            }
        };
        let Some(result) = content
            .item_content
            .and_then(|item| item.tweet_results)
            .and_then(|r| r.result)
        else {
            out.diagnostics.push(Diagnostic::MalformedEntry {
                entry_id: entry.entry_id.clone(),
                reason: "no tweet_results.result".to_string(),
            });
            return;
        };

        // Entry-level results must be bare `Tweet` nodes.
        if result.get("__typename").and_then(Value::as_str) != Some("Tweet") {
            return;
        }

        Self::push_post(&result, &entry.entry_id, out);
    }

    fn extract_conversation(entry: &RawEntry, out: &mut ExtractedPage) {
        let module = match RawModuleContent::deserialize(&entry.content) {
            Ok(module) if module.is_module() => module,
            Ok(_) => return,
            Err(e) => {
                out.diagnostics.push(Diagnostic::MalformedEntry {
                    entry_id: entry.entry_id.clone(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        for item in &module.items {
            let item_content = match RawModuleItem::deserialize(item) {
                Ok(item) => item.item.and_then(|body| body.item_content),
                Err(e) => {
                    out.diagnostics.push(Diagnostic::MalformedEntry {
                        entry_id: entry.entry_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let Some(result) = item_content
                .filter(RawItemContent::is_timeline_tweet)
                .and_then(|content| content.tweet_results)
                .and_then(|r| r.result)
            else {
                continue;
            };
            Self::push_post(&result, &entry.entry_id, out);
        }
    }

    fn extract_cursor(entry: &RawEntry, out: &mut ExtractedPage) {
        let Ok(cursor) = RawCursorContent::deserialize(&entry.content) else {
            return;
        };
        if cursor.cursor_type.as_deref() != Some(BOTTOM_CURSOR) {
            return;
        }
        if let Some(value) = cursor.value.filter(|v| !v.is_empty()) {
            out.next_cursor = Some(Cursor::new(value));
        }
    }

    fn push_post(result: &Value, entry_id: &str, out: &mut ExtractedPage) {
        let before = out.diagnostics.len();
        match PostResolver::resolve_with_diagnostics(result, &mut out.diagnostics) {
            Some(post) => out.posts.push(post),
            None if out.diagnostics.len() == before => {
                out.diagnostics.push(Diagnostic::MalformedEntry {
                    entry_id: entry_id.to_string(),
                    reason: "unresolvable post".to_string(),
                });
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tweet(id: &str, text: &str) -> Value {
        json!({
            "__typename": "Tweet",
            "rest_id": id,
            "core": { "user_results": { "result": {
                "__typename": "User",
                "rest_id": "u1",
                "core": { "name": "Ada", "screen_name": "ada" },
                "legacy": { "followers_count": 10 }
            }}},
            "legacy": {
                "full_text": text,
                "created_at": "Wed Oct 05 22:34:12 +0000 2011"
            }
        })
    }

    fn tweet_entry(id: &str, result: Value) -> Value {
        json!({
            "entryId": format!("tweet-{id}"),
            "content": {
                "entryType": "TimelineTimelineItem",
                "itemContent": {
                    "itemType": "TimelineTweet",
                    "tweet_results": { "result": result }
                }
            }
        })
    }

    fn cursor_entry(kind: &str, value: &str) -> Value {
        json!({
            "entryId": format!("cursor-{}-123", kind.to_lowercase()),
            "content": {
                "entryType": "TimelineTimelineCursor",
                "cursorType": kind,
                "value": value
            }
        })
    }

    fn page(entries: Vec<Value>) -> Value {
        json!({
            "data": { "home": { "home_timeline_urt": { "instructions": [
                { "type": "TimelineClearCache" },
                { "type": "TimelineAddEntries", "entries": entries }
            ]}}}
        })
    }

    #[test]
    fn test_plain_reshare_and_quote_with_cursor() {
        let mut reshare = tweet("2", "RT @ada: original");
        reshare["legacy"]["retweeted_status_result"] = json!({ "result": tweet("20", "original") });
        let mut quote = tweet("3", "look at this");
        quote["quoted_status_result"] = json!({ "result": tweet("30", "quoted") });

        let page = page(vec![
            tweet_entry("1", tweet("1", "plain")),
            tweet_entry("2", reshare),
            tweet_entry("3", quote),
            cursor_entry("Top", "TOP"),
            cursor_entry("Bottom", "NEXT"),
        ]);

        let extracted = PageExtractor::extract(&page);
        let ids: Vec<&str> = extracted.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(extracted.posts[1].reshare_of.as_ref().unwrap().id, "20");
        assert_eq!(extracted.posts[2].quoted.as_ref().unwrap().id, "30");
        assert_eq!(extracted.next_cursor, Some(Cursor::new("NEXT")));
        assert!(extracted.diagnostics.is_empty());
    }

    #[test]
    fn test_conversation_module_is_flattened() {
        let module = json!({
            "entryId": "home-conversation-555",
            "content": {
                "entryType": "TimelineTimelineModule",
                "items": [
                    { "item": { "itemContent": {
                        "itemType": "TimelineTweet",
                        "tweet_results": { "result": tweet("10", "first") }
                    }}},
                    { "item": { "itemContent": {
                        "itemType": "TimelineTimelineCursor"
                    }}},
                    { "item": { "itemContent": {
                        "__typename": "TimelineTweet",
                        "tweet_results": { "result": tweet("11", "second") }
                    }}}
                ]
            }
        });

        let extracted = PageExtractor::extract(&page(vec![module]));
        let ids: Vec<&str> = extracted.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "11"]);
        assert!(extracted.next_cursor.is_none());
    }

    #[test]
    fn test_unknown_entries_are_skipped() {
        let page = page(vec![
            json!({ "entryId": "who-to-follow-1", "content": {} }),
            json!({ "entryId": "promoted-tweet-9", "content": {} }),
            tweet_entry("1", tweet("1", "kept")),
        ]);
        let extracted = PageExtractor::extract(&page);
        assert_eq!(extracted.posts.len(), 1);
        assert!(extracted.diagnostics.is_empty());
    }

    #[test]
    fn test_non_tweet_result_is_ignored() {
        let wrapped = json!({
            "__typename": "TweetWithVisibilityResults",
            "tweet": tweet("7", "limited")
        });
        let extracted = PageExtractor::extract(&page(vec![
            tweet_entry("7", wrapped),
            tweet_entry("8", json!({"__typename": "TweetTombstone"})),
        ]));
        assert!(extracted.posts.is_empty());
    }

    #[test]
    fn test_failed_entry_does_not_stop_page() {
        let mut broken = tweet("1", "no id");
        broken.as_object_mut().unwrap().remove("rest_id");

        let extracted = PageExtractor::extract(&page(vec![
            tweet_entry("1", broken),
            json!({ "content": {} }),
            tweet_entry("2", tweet("2", "fine")),
        ]));
        assert_eq!(extracted.posts.len(), 1);
        assert_eq!(extracted.posts[0].id, "2");
        assert_eq!(extracted.diagnostics.len(), 2);
    }

    #[test]
    fn test_missing_instructions() {
        let extracted = PageExtractor::extract(&json!({ "errors": [] }));
        assert!(extracted.posts.is_empty());
        assert!(extracted.next_cursor.is_none());
        assert_eq!(extracted.diagnostics.len(), 1);
    }
}
