//! Editor Context
//!
//! [`Editor`] is the service handle every node holds. It is cheap to clone
//! (one `Arc`) and bundles:
//!
//! - the host collaborators ([`MediaResolver`], [`MediaCache`], [`ModelLoader`])
//! - the [`SharedModelCache`] owned by this editor instance
//! - the [`IssueScanner`], [`EventBus`] and background [`LoadTracker`]
//! - the tokio runtime handle property setters spawn their loads onto
//!
//! ```rust,ignore
//! let editor = Editor::builder()
//!     .resolver(Arc::new(MyResolver))
//!     .media_cache(Arc::new(TextureCache::new(FileAssetReader::new("assets"))))
//!     .model_loader(Arc::new(MyGltfLoader))
//!     .build()?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::assets::model_cache::{ModelKey, ModelLoader, SharedModelCache};
use crate::assets::prefab::Prefab;
use crate::config::EditorConfig;
use crate::errors::{Error, FetchError, Result};
use crate::events::EventBus;
use crate::issues::{IssueScanner, PerfIssueScanner};
use crate::media::{DecodedMedia, MediaCache, MediaResolver};
use crate::tracker::LoadTracker;

struct EditorInner {
    config: EditorConfig,
    resolver: Arc<dyn MediaResolver>,
    media_cache: Arc<dyn MediaCache>,
    scanner: Arc<dyn IssueScanner>,
    models: SharedModelCache,
    events: EventBus,
    loads: LoadTracker,
    runtime: Handle,
    playing: AtomicBool,
    environment_map: RwLock<Option<Arc<DecodedMedia>>>,
}

#[derive(Clone)]
pub struct Editor {
    inner: Arc<EditorInner>,
}

impl Editor {
    #[must_use]
    pub fn builder() -> EditorBuilder {
        EditorBuilder::default()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.inner.config
    }

    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn MediaResolver> {
        &self.inner.resolver
    }

    #[inline]
    #[must_use]
    pub fn media_cache(&self) -> &Arc<dyn MediaCache> {
        &self.inner.media_cache
    }

    #[inline]
    #[must_use]
    pub fn scanner(&self) -> &Arc<dyn IssueScanner> {
        &self.inner.scanner
    }

    #[inline]
    #[must_use]
    pub fn models(&self) -> &SharedModelCache {
        &self.inner.models
    }

    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Tracker for loads started by property setters.
    #[inline]
    #[must_use]
    pub fn loads(&self) -> &LoadTracker {
        &self.inner.loads
    }

    /// Whether the editor is in play mode.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.inner.playing.load(Ordering::Acquire)
    }

    pub fn set_playing(&self, playing: bool) {
        self.inner.playing.store(playing, Ordering::Release);
    }

    #[must_use]
    pub fn environment_map(&self) -> Option<Arc<DecodedMedia>> {
        self.inner.environment_map.read().clone()
    }

    pub fn set_environment_map(&self, env_map: Option<Arc<DecodedMedia>>) {
        *self.inner.environment_map.write() = env_map;
    }

    /// Spawns a background task on the editor runtime.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.runtime.spawn(task)
    }

    /// Spawns a load and registers it with [`Editor::loads`].
    pub fn spawn_load<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.loads.track(self.spawn(task));
    }
}

/// Model loader used when the host did not provide one.
struct MissingModelLoader;

impl ModelLoader for MissingModelLoader {
    fn load(&self, key: &ModelKey) -> BoxFuture<'static, std::result::Result<Prefab, FetchError>> {
        future::ready(Err(FetchError::Unsupported(format!(
            "no model loader configured for '{key}'"
        ))))
        .boxed()
    }
}

#[derive(Default)]
pub struct EditorBuilder {
    config: EditorConfig,
    resolver: Option<Arc<dyn MediaResolver>>,
    media_cache: Option<Arc<dyn MediaCache>>,
    model_loader: Option<Arc<dyn ModelLoader>>,
    scanner: Option<Arc<dyn IssueScanner>>,
    runtime: Option<Handle>,
}

impl EditorBuilder {
    #[must_use]
    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn MediaResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn media_cache(mut self, media_cache: Arc<dyn MediaCache>) -> Self {
        self.media_cache = Some(media_cache);
        self
    }

    #[must_use]
    pub fn model_loader(mut self, model_loader: Arc<dyn ModelLoader>) -> Self {
        self.model_loader = Some(model_loader);
        self
    }

    /// Replaces the default [`PerfIssueScanner`].
    #[must_use]
    pub fn scanner(mut self, scanner: Arc<dyn IssueScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Runtime for background loads. Defaults to the current tokio runtime.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<Editor> {
        let resolver = self
            .resolver
            .ok_or_else(|| Error::Configuration("Editor requires a media resolver".into()))?;
        let media_cache = self
            .media_cache
            .ok_or_else(|| Error::Configuration("Editor requires a media cache".into()))?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| Error::NoRuntime(e.to_string()))?,
        };
        let scanner = self
            .scanner
            .unwrap_or_else(|| Arc::new(PerfIssueScanner::new(self.config.limits.clone())));
        let model_loader = self
            .model_loader
            .unwrap_or_else(|| Arc::new(MissingModelLoader));

        Ok(Editor {
            inner: Arc::new(EditorInner {
                config: self.config,
                resolver,
                media_cache,
                scanner,
                models: SharedModelCache::new(model_loader),
                events: EventBus::new(),
                loads: LoadTracker::new(),
                runtime,
                playing: AtomicBool::new(false),
                environment_map: RwLock::new(None),
            }),
        })
    }
}
