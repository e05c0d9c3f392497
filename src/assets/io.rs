//! Asset byte sources.
//!
//! [`AssetReader`] is the byte-level seam underneath
//! [`TextureCache`](crate::media::TextureCache). The editor host decides
//! where accessible URLs point; the readers here cover local files and
//! in-memory fixtures.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::FetchError;

/// Asynchronous byte reader keyed by an accessible location.
pub trait AssetReader: Send + Sync {
    fn read_bytes(
        &self,
        uri: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Reads files relative to a root directory.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root_path.join(uri.trim_start_matches("file://"));
        Ok(tokio::fs::read(&path).await?)
    }
}

/// In-memory reader, useful for embedded assets and tests.
#[derive(Clone, Default)]
pub struct MemoryAssetReader {
    files: Arc<RwLock<FxHashMap<String, Arc<Vec<u8>>>>>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uri: impl Into<String>, bytes: Vec<u8>) {
        self.files.write().insert(uri.into(), Arc::new(bytes));
    }
}

impl AssetReader for MemoryAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self.files.read().get(uri).cloned();
        bytes
            .map(|bytes| bytes.as_ref().clone())
            .ok_or_else(|| FetchError::NotFound(uri.to_string()))
    }
}
