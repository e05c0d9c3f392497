//! Image texture cache.
//!
//! A [`MediaCache`] that reads bytes through an [`AssetReader`], decodes them
//! on the blocking pool and keeps the result keyed by accessible URL.
//! Identical concurrent requests share one read + decode.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::assets::in_flight::InFlightMap;
use crate::assets::io::AssetReader;
use crate::errors::FetchError;
use crate::media::{DecodedMedia, MediaCache, MediaKind, MediaRequest, Texture};

pub struct TextureCache<R> {
    reader: Arc<R>,
    textures: Arc<InFlightMap<String, DecodedMedia, FetchError>>,
}

impl<R> Clone for TextureCache<R> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            textures: Arc::clone(&self.textures),
        }
    }
}

impl<R: AssetReader + 'static> TextureCache<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(reader),
            textures: Arc::new(InFlightMap::new()),
        }
    }

    /// Number of decoded textures currently cached.
    pub fn len(&self) -> usize {
        self.textures.ready_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn load_texture(reader: Arc<R>, url: String) -> Result<DecodedMedia, FetchError> {
        let bytes = reader.read_bytes(&url).await?;
        tokio::task::spawn_blocking(move || decode_texture(&bytes, &url)).await?
    }
}

impl<R: AssetReader + 'static> MediaCache for TextureCache<R> {
    fn get(&self, request: MediaRequest) -> BoxFuture<'static, Result<Arc<DecodedMedia>, FetchError>> {
        if request.kind != MediaKind::Image {
            return future::ready(Err(FetchError::Unsupported(format!(
                "{} '{}' cannot be decoded as a texture",
                request.kind, request.url
            ))))
            .boxed();
        }

        let reader = Arc::clone(&self.reader);
        let textures = Arc::clone(&self.textures);
        async move {
            let url = request.url;
            textures
                .get_or_load(url.clone(), move || Self::load_texture(reader, url).boxed())
                .await
        }
        .boxed()
    }
}

/// CPU image decoding into an RGBA8 texture.
fn decode_texture(bytes: &[u8], label: &str) -> Result<DecodedMedia, FetchError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| FetchError::Decode(format!("Failed to decode image {label}: {e}")))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedMedia::Texture(
        Texture::new(label, width, height, rgba.into_raw()).with_byte_size(bytes.len() as u64),
    ))
}
