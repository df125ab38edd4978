//! Non-fatal findings recorded while resolving a page.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Something in the payload that was skipped or cut short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A node did not match any known post shape.
    UnresolvedNode { context: String, reason: String },
    /// A post node had no `rest_id`.
    MissingId { context: String },
    /// Nested reshare/quote links below the depth bound were not followed.
    NestingTruncated { post_id: String, depth: usize },
    /// The author sub-object could not be decoded.
    UnresolvedUser { post_id: String, reason: String },
    /// An entry or instruction could not be decoded.
    MalformedEntry { entry_id: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedNode { context, reason } => {
                write!(f, "unresolved node at {context}: {reason}")
            }
            Self::MissingId { context } => write!(f, "post without rest_id at {context}"),
            Self::NestingTruncated { post_id, depth } => {
                write!(f, "nesting truncated below post {post_id} at depth {depth}")
            }
            Self::UnresolvedUser { post_id, reason } => {
                write!(f, "author of {post_id} unresolved: {reason}")
            }
            Self::MalformedEntry { entry_id, reason } => {
                write!(f, "malformed entry {entry_id}: {reason}")
            }
        }
    }
}
