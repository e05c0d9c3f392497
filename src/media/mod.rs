//! Media collaborators.
//!
//! The editor core never talks to the network itself. It depends on two
//! host-provided capabilities:
//!
//! - [`MediaResolver`]: turns a user-entered source reference into an
//!   accessible location, a content type and attribution metadata.
//! - [`MediaCache`]: fetches and decodes an accessible location, typically
//!   deduplicating identical concurrent requests.
//!
//! Both return boxed `'static` futures so loads can be spawned onto the
//! editor runtime and outlive the setter call that started them.

pub mod texture_cache;

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::errors::{FetchError, ResolutionError};

pub use texture_cache::TextureCache;

/// What a node expects a source to decode into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// Attribution metadata reported by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaMeta {
    pub name: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub accessible_url: String,
    pub content_type: Option<String>,
    pub meta: Option<MediaMeta>,
}

impl ResolvedMedia {
    pub fn new(accessible_url: impl Into<String>) -> Self {
        Self {
            accessible_url: accessible_url.into(),
            content_type: None,
            meta: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: MediaMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// How a video stream is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Progressive,
    /// HTTP Live Streaming (adaptive).
    Hls,
}

const HLS_CONTENT_TYPES: [&str; 3] = [
    "application/x-mpegurl",
    "application/vnd.apple.mpegurl",
    "audio/mpegurl",
];

/// Whether `source` should be played through the adaptive streaming transport.
#[must_use]
pub fn is_hls(source: &str, content_type: Option<&str>) -> bool {
    if let Some(content_type) = content_type {
        let content_type = content_type.to_ascii_lowercase();
        if HLS_CONTENT_TYPES.iter().any(|t| content_type.starts_with(t)) {
            return true;
        }
    }

    let path = match url::Url::parse(source) {
        Ok(url) => url.path().to_ascii_lowercase(),
        Err(_) => source
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase(),
    };
    path.ends_with(".m3u8")
}

/// One fetch handed to the [`MediaCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    /// The user-facing reference the location was resolved from.
    pub source: String,
    pub url: String,
    pub kind: MediaKind,
    pub transport: Transport,
}

/// Decoded RGBA8 texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
    /// Encoded size as transferred, when known.
    pub byte_size: Option<u64>,
}

impl Texture {
    pub fn new(label: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            pixels: pixels.into(),
            byte_size: None,
        }
    }

    #[must_use]
    pub fn with_byte_size(mut self, byte_size: u64) -> Self {
        self.byte_size = Some(byte_size);
        self
    }
}

/// An attached video element source.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStream {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Seconds; `None` for live or not-yet-known durations.
    pub duration: Option<f64>,
    pub transport: Transport,
    pub byte_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMedia {
    Texture(Texture),
    Video(VideoStream),
}

impl DecodedMedia {
    #[must_use]
    pub fn byte_size(&self) -> Option<u64> {
        match self {
            DecodedMedia::Texture(texture) => texture.byte_size,
            DecodedMedia::Video(video) => video.byte_size,
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            DecodedMedia::Texture(texture) => (texture.width, texture.height),
            DecodedMedia::Video(video) => (video.width, video.height),
        }
    }

    #[must_use]
    pub fn as_texture(&self) -> Option<&Texture> {
        match self {
            DecodedMedia::Texture(texture) => Some(texture),
            DecodedMedia::Video(_) => None,
        }
    }

    #[must_use]
    pub fn as_video(&self) -> Option<&VideoStream> {
        match self {
            DecodedMedia::Video(video) => Some(video),
            DecodedMedia::Texture(_) => None,
        }
    }
}

/// Resolves a source reference. Fails with [`ResolutionError`] for
/// unreachable or invalid sources.
pub trait MediaResolver: Send + Sync {
    fn resolve(&self, source: &str) -> BoxFuture<'static, Result<ResolvedMedia, ResolutionError>>;
}

/// Fetches and decodes a resolved location.
pub trait MediaCache: Send + Sync {
    fn get(&self, request: MediaRequest) -> BoxFuture<'static, Result<Arc<DecodedMedia>, FetchError>>;
}
