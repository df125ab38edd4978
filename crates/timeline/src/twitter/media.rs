//! Media attachment resolution.

use serde::Deserialize;
use serde_json::Value;

use super::raw::{RawMedia, RawVariant};
use super::types::{MediaAsset, MediaKind};

/// Content type of the canonical video container.
pub const VIDEO_CONTAINER: &str = "video/mp4";

/// Picks the representative URL for a media attachment.
pub struct MediaResolver;

impl MediaResolver {
    /// Resolve one raw `extended_entities.media[]` node.
    ///
    /// Returns `None` when the node has an unsupported type or no resolvable
    /// URL, so callers never hold a half-populated asset.
    pub fn resolve(node: &Value) -> Option<MediaAsset> {
        let raw = RawMedia::deserialize(node).ok()?;
        Self::resolve_raw(raw)
    }

    fn resolve_raw(raw: RawMedia) -> Option<MediaAsset> {
        match raw {
            RawMedia::Photo(image) => Some(MediaAsset {
                kind: MediaKind::Photo,
                id: image.id_str,
                url: Some(image.media_url_https?),
                bitrate: None,
            }),
            RawMedia::AnimatedGif(image) => Some(MediaAsset {
                kind: MediaKind::AnimatedGif,
                id: image.id_str,
                url: Some(image.media_url_https?),
                bitrate: None,
            }),
            RawMedia::Video(video) => {
                let variants = video.video_info.map(|info| info.variants).unwrap_or_default();
                let best = Self::best_variant(&variants)?;
                Some(MediaAsset {
                    kind: MediaKind::Video,
                    id: video.id_str,
                    url: best.url.clone(),
                    bitrate: Some(best.bitrate.unwrap_or(0)),
                })
            }
            RawMedia::Unsupported => None,
        }
    }

    /// Highest-bitrate mp4 variant with a URL; the first one wins on ties.
    /// A missing bitrate counts as 0.
    pub fn best_variant(variants: &[RawVariant]) -> Option<&RawVariant> {
        let mut best: Option<&RawVariant> = None;
        for variant in variants {
            if variant.content_type.as_deref() != Some(VIDEO_CONTAINER) || variant.url.is_none() {
                continue;
            }
            let bitrate = variant.bitrate.unwrap_or(0);
            match best {
                Some(current) if current.bitrate.unwrap_or(0) >= bitrate => {}
                _ => best = Some(variant),
            }
        }
        best
    }
}
