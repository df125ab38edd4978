//! Fallback body decoding.
//!
//! `reqwest` already handles the advertised `Content-Encoding`. Upstream
//! occasionally sends a compressed body without the header, so the raw bytes
//! are run through a fixed list of decoders until one yields JSON.

use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use serde_json::Value;

use crate::error::{CrawlError, Result};

/// A single decoding strategy.
pub type Codec = fn(&[u8]) -> std::io::Result<Vec<u8>>;

/// Decoders in the order they are tried.
pub const CODECS: &[(&str, Codec)] = &[
    ("identity", identity),
    ("gzip", gzip),
    ("zlib", zlib),
    ("deflate", deflate),
    ("zstd", zstd_frame),
];

fn identity(body: &[u8]) -> std::io::Result<Vec<u8>> {
    Ok(body.to_vec())
}

fn gzip(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(body).read_to_end(&mut out)?;
    Ok(out)
}

fn zlib(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(body).read_to_end(&mut out)?;
    Ok(out)
}

fn deflate(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    DeflateDecoder::new(body).read_to_end(&mut out)?;
    Ok(out)
}

fn zstd_frame(body: &[u8]) -> std::io::Result<Vec<u8>> {
    zstd::stream::decode_all(body)
}

/// Decode a response body into JSON using the first codec that succeeds.
pub fn decode_json(body: &[u8]) -> Result<Value> {
    for (name, codec) in CODECS {
        let Ok(decoded) = codec(body) else {
            continue;
        };
        if let Ok(value) = serde_json::from_slice::<Value>(&decoded) {
            if *name != "identity" {
                tracing::debug!(codec = *name, bytes = body.len(), "Decoded body via fallback codec");
            }
            return Ok(value);
        }
    }

    let preview: String = String::from_utf8_lossy(&body[..body.len().min(120)]).into_owned();
    Err(CrawlError::Parse(format!(
        "{} bytes matched no codec (starts with {preview:?})",
        body.len()
    )))
}
