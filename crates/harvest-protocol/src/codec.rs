//! Payload codecs and content negotiation
//!
//! Request bodies are decoded by the codec named in `Content-Type`;
//! responses are encoded by the registered codec that best matches the
//! client's `Accept` header.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_MSGPACK: &str = "application/msgpack";

/// Container nesting accepted by a registry unless configured otherwise
pub const DEFAULT_MAX_NESTING: usize = 128;

/// Codec failures, all of them transport-level
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Nesting exceeds limit of {0}")]
    NestingLimit(usize),
}

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// A wire encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Json,
    MessagePack,
}

impl Codec {
    /// Canonical media type
    pub fn media_type(&self) -> &'static str {
        match self {
            Codec::Json => APPLICATION_JSON,
            Codec::MessagePack => APPLICATION_MSGPACK,
        }
    }

    /// Returns true if `media_type` (without parameters) names this codec
    pub fn handles(&self, media_type: &str) -> bool {
        match self {
            Codec::Json => media_type == APPLICATION_JSON,
            Codec::MessagePack => {
                media_type == APPLICATION_MSGPACK || media_type == "application/x-msgpack"
            }
        }
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Json => serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string())),
            Codec::MessagePack => {
                rmp_serde::to_vec_named(value).map_err(|e| CodecError::Encode(e.to_string()))
            }
        }
    }

    /// Decode a body, rejecting input with more than `max_nesting` levels
    /// of arrays and maps before anything deeper is built.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8], max_nesting: usize) -> Result<T> {
        match self {
            Codec::Json => {
                if json_nesting_exceeds(bytes, max_nesting) {
                    return Err(CodecError::NestingLimit(max_nesting));
                }

                // Nesting is already bounded above.
                let mut de = serde_json::Deserializer::from_slice(bytes);
                de.disable_recursion_limit();
                let value = T::deserialize(&mut de).map_err(|e| CodecError::Decode(e.to_string()))?;
                de.end().map_err(|e| CodecError::Decode(e.to_string()))?;
                Ok(value)
            }
            Codec::MessagePack => {
                let mut de = rmp_serde::Deserializer::new(bytes);
                // The counter includes the container being entered.
                de.set_max_depth(max_nesting.saturating_add(1));
                T::deserialize(&mut de).map_err(|e| match e {
                    rmp_serde::decode::Error::DepthLimitExceeded => {
                        CodecError::NestingLimit(max_nesting)
                    }
                    e => CodecError::Decode(e.to_string()),
                })
            }
        }
    }
}

/// Immutable set of codecs, in order of server preference
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: Vec<Codec>,
    max_nesting: usize,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new(vec![Codec::Json, Codec::MessagePack])
    }
}

impl CodecRegistry {
    /// Create a registry; the first codec is the default
    pub fn new(codecs: Vec<Codec>) -> Self {
        Self {
            codecs,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// Builder: bound the nesting of decoded bodies
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Decode a request body with the codec named by its `Content-Type`
    pub fn decode<T: DeserializeOwned>(&self, content_type: Option<&str>, bytes: &[u8]) -> Result<T> {
        self.for_content_type(content_type)?
            .decode(bytes, self.max_nesting)
    }

    fn default_codec(&self, header: &str) -> Result<Codec> {
        self.codecs
            .first()
            .copied()
            .ok_or_else(|| CodecError::NotAcceptable(header.to_string()))
    }

    /// Codec for a request's `Content-Type`. A missing header means the
    /// default codec.
    pub fn for_content_type(&self, content_type: Option<&str>) -> Result<Codec> {
        let media_type = content_type.map(essence).unwrap_or_default();
        if media_type.is_empty() {
            return self
                .default_codec("")
                .map_err(|_| CodecError::UnsupportedMediaType(String::new()));
        }

        self.codecs
            .iter()
            .copied()
            .find(|codec| codec.handles(&media_type))
            .ok_or(CodecError::UnsupportedMediaType(media_type))
    }

    /// Best registered codec for an `Accept` header.
    ///
    /// Each codec is scored by the quality of the most specific range that
    /// matches it; the highest score wins and ties go to the earlier codec.
    pub fn best_match(&self, accept: Option<&str>) -> Result<Codec> {
        let header = accept.unwrap_or_default().trim();
        if header.is_empty() {
            return self.default_codec(header);
        }

        let ranges = parse_accept(header);
        let mut best: Option<(Codec, f32)> = None;

        for codec in &self.codecs {
            let quality = ranges
                .iter()
                .filter_map(|range| range.specificity(*codec).map(|s| (s, range.quality)))
                .max_by_key(|(specificity, _)| *specificity)
                .map(|(_, quality)| quality)
                .unwrap_or(0.0);

            if quality > 0.0 && best.is_none_or(|(_, q)| quality > q) {
                best = Some((*codec, quality));
            }
        }

        best.map(|(codec, _)| codec)
            .ok_or_else(|| CodecError::NotAcceptable(header.to_string()))
    }
}

/// Returns true once `{`/`[` nesting goes past `limit`. Brackets inside
/// strings are skipped; malformed input is left to the parser.
fn json_nesting_exceeds(bytes: &[u8], limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in bytes {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

/// Media type without parameters, lowercased
fn essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
struct MediaRange {
    media_type: String,
    quality: f32,
}

impl MediaRange {
    /// How specifically this range matches a codec: 2 exact, 1 `type/*`,
    /// 0 `*/*`, `None` for no match
    fn specificity(&self, codec: Codec) -> Option<u8> {
        if codec.handles(&self.media_type) {
            return Some(2);
        }

        match self.media_type.split_once('/') {
            Some(("*", "*")) => Some(0),
            Some((kind, "*")) if codec.media_type().starts_with(&format!("{}/", kind)) => Some(1),
            _ => None,
        }
    }
}

fn parse_accept(header: &str) -> Vec<MediaRange> {
    header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let media_type = pieces.next()?.trim().to_ascii_lowercase();
            if media_type.is_empty() {
                return None;
            }

            // A q value that does not parse refuses the range.
            let quality = pieces
                .find_map(|param| param.trim().strip_prefix("q="))
                .map_or(1.0, |q| q.trim().parse::<f32>().unwrap_or(0.0))
                .clamp(0.0, 1.0);

            Some(MediaRange {
                media_type,
                quality,
            })
        })
        .collect()
}
