//! Shared Model Cache
//!
//! Large reusable models (the time capsule body, the video screen, ...) are
//! loaded once per editor and shared by every node that needs them.
//!
//! # Contract
//!
//! - [`SharedModelCache::ensure_loaded`] is idempotent and concurrency-safe:
//!   callers arriving before the first load completes join that load.
//! - A failed load is not cached; the next call retries.
//! - Shared models are read-only. Nodes take their own copy through
//!   [`SharedModelCache::instantiate`].
//! - Node constructors call [`SharedModelCache::require`] and fail with
//!   [`Error::Configuration`] while a model is missing.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::assets::in_flight::InFlightMap;
use crate::assets::prefab::{Prefab, SharedPrefab};
use crate::errors::{Error, FetchError, Result};

/// Logical identifier of a shared model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelKey(Cow<'static, str>);

impl ModelKey {
    #[must_use]
    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    pub fn new(key: impl Into<String>) -> Self {
        Self(Cow::Owned(key.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fetches and parses one model. Implemented by the host (e.g. a glTF loader).
pub trait ModelLoader: Send + Sync {
    fn load(&self, key: &ModelKey) -> BoxFuture<'static, std::result::Result<Prefab, FetchError>>;
}

pub struct SharedModelCache {
    loader: Arc<dyn ModelLoader>,
    models: InFlightMap<ModelKey, Prefab, FetchError>,
}

impl SharedModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            models: InFlightMap::new(),
        }
    }

    /// Loads `key` unless it is already cached or being loaded.
    pub async fn ensure_loaded(&self, key: &ModelKey) -> std::result::Result<SharedPrefab, FetchError> {
        if let Some(model) = self.models.get(key) {
            return Ok(model);
        }

        let loader = Arc::clone(&self.loader);
        let result = self
            .models
            .get_or_load(key.clone(), || loader.load(key))
            .await;

        match &result {
            Ok(_) => log::info!("Shared model '{key}' ready"),
            Err(err) => log::warn!("Shared model '{key}' failed to load: {err}"),
        }
        result
    }

    /// Loads every key concurrently; fails on the first error.
    pub async fn ensure_all(&self, keys: &[ModelKey]) -> std::result::Result<Vec<SharedPrefab>, FetchError> {
        futures::future::try_join_all(keys.iter().map(|key| self.ensure_loaded(key))).await
    }

    #[must_use]
    pub fn get(&self, key: &ModelKey) -> Option<SharedPrefab> {
        self.models.get(key)
    }

    #[must_use]
    pub fn is_loaded(&self, key: &ModelKey) -> bool {
        self.models.get(key).is_some()
    }

    /// Returns the shared model or a configuration error naming the missing key.
    pub fn require(&self, key: &ModelKey) -> Result<SharedPrefab> {
        self.get(key).ok_or_else(|| {
            Error::Configuration(format!(
                "Model '{key}' must be loaded before it can be used. Await ensure_loaded() first"
            ))
        })
    }

    /// Independent, mutable copy of a loaded model.
    pub fn instantiate(&self, key: &ModelKey) -> Result<Prefab> {
        Ok(self.require(key)?.as_ref().clone())
    }
}
