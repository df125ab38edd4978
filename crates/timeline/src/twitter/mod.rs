//! X/Twitter home timeline access.
//!
//! Fetches GraphQL timeline pages and resolves their entries into canonical
//! posts.

mod client;
mod codec;
mod diagnostic;
mod media;
mod page;
mod raw;
mod resolver;
mod types;

pub use client::{
    default_features, timeline_variables, Features, HttpTransport, TimelineEndpoint, Transport,
    API_BASE_URL, PAGE_SIZE,
};
pub use codec::decode_json;
pub use diagnostic::Diagnostic;
pub use media::{MediaResolver, VIDEO_CONTAINER};
pub use page::{ExtractedPage, PageExtractor, INSTRUCTIONS_POINTER};
pub use resolver::{PostResolver, MAX_DEPTH};
pub use types::{parse_upstream_timestamp, Cursor, MediaAsset, MediaKind, Post, Stats, User};
