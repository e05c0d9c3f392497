//! Shared test collaborators.
//!
//! - `MockResolver`: records calls, can fail or hold back individual sources
//! - `MockMediaCache`: produces textures / video streams without I/O
//! - `MockModelLoader`: builds the capsule and screen models, counts loads

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::{BoxFuture, FutureExt};
use myth_editor::assets::{GeometryDesc, ModelKey, ModelLoader, Prefab, PrefabNode, StandardMaterial};
use myth_editor::errors::{FetchError, ResolutionError};
use myth_editor::media::{
    DecodedMedia, MediaCache, MediaKind, MediaMeta, MediaRequest, MediaResolver, ResolvedMedia,
    Texture, VideoStream,
};
use myth_editor::{Editor, EditorConfig, EditorEvent};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

// ============================================================================
// Resolver
// ============================================================================

#[derive(Default)]
pub struct MockResolver {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl MockResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every later resolve of `source` fail.
    pub fn fail(&self, source: &str) {
        self.failing.lock().insert(source.to_string());
    }

    pub fn recover(&self, source: &str) {
        self.failing.lock().remove(source);
    }

    /// Holds resolves of `source` until a permit is added to the returned gate.
    /// Each resolve consumes one permit.
    pub fn gate(&self, source: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().insert(source.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, source: &str) -> usize {
        self.calls.lock().iter().filter(|s| *s == source).count()
    }
}

impl MediaResolver for MockResolver {
    fn resolve(&self, source: &str) -> BoxFuture<'static, Result<ResolvedMedia, ResolutionError>> {
        self.calls.lock().push(source.to_string());
        let gate = self.gates.lock().get(source).cloned();
        let fails = self.failing.lock().contains(source);
        let source = source.to_string();

        async move {
            if let Some(gate) = gate {
                gate.acquire()
                    .await
                    .map_err(|e| ResolutionError::new(source.clone(), e.to_string()))?
                    .forget();
            }
            if fails {
                return Err(ResolutionError::new(source, "host unreachable"));
            }

            let mut resolved = ResolvedMedia::new(format!("https://cdn.test/{source}")).with_meta(
                MediaMeta {
                    name: Some(source.clone()),
                    author: Some("Tester".into()),
                    ..MediaMeta::default()
                },
            );
            if source.contains("live") {
                resolved = resolved.with_content_type("application/vnd.apple.mpegurl");
            }
            Ok(resolved)
        }
        .boxed()
    }
}

// ============================================================================
// Media cache
// ============================================================================

#[derive(Default)]
pub struct MockMediaCache {
    requests: Mutex<Vec<MediaRequest>>,
    byte_size: Mutex<Option<u64>>,
}

impl MockMediaCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Encoded size reported for every later fetch.
    pub fn set_byte_size(&self, byte_size: u64) {
        *self.byte_size.lock() = Some(byte_size);
    }

    pub fn requests(&self) -> Vec<MediaRequest> {
        self.requests.lock().clone()
    }
}

impl MediaCache for MockMediaCache {
    fn get(&self, request: MediaRequest) -> BoxFuture<'static, Result<Arc<DecodedMedia>, FetchError>> {
        self.requests.lock().push(request.clone());
        let byte_size = *self.byte_size.lock();

        async move {
            let media = match request.kind {
                MediaKind::Image => {
                    let mut texture = Texture::new(request.source, 4, 2, vec![255; 32]);
                    texture.byte_size = byte_size;
                    DecodedMedia::Texture(texture)
                }
                MediaKind::Video => DecodedMedia::Video(VideoStream {
                    url: request.url,
                    width: 640,
                    height: 360,
                    duration: Some(10.0),
                    transport: request.transport,
                    byte_size,
                }),
            };
            Ok(Arc::new(media))
        }
        .boxed()
    }
}

// ============================================================================
// Model loader
// ============================================================================

#[derive(Default)]
pub struct MockModelLoader {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockModelLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

pub fn capsule_prefab() -> Prefab {
    let mut prefab = Prefab::new();
    let root = prefab.push_root(PrefabNode::new().with_name("TimeCapsule"));
    prefab.push_child(
        root,
        PrefabNode::new()
            .with_name("Body")
            .with_mesh(GeometryDesc::new("body", 1200), Some(StandardMaterial::default())),
    );
    prefab.push_child(
        root,
        PrefabNode::new()
            .with_name("Lid")
            .with_mesh(GeometryDesc::new("lid", 400), Some(StandardMaterial::default())),
    );
    prefab
}

pub fn screen_prefab() -> Prefab {
    let mut prefab = Prefab::new();
    let root = prefab.push_root(PrefabNode::new().with_name("Screen"));
    prefab.push_child(root, PrefabNode::new().with_mesh(GeometryDesc::new("screen", 2), None));
    prefab
}

impl ModelLoader for MockModelLoader {
    fn load(&self, key: &ModelKey) -> BoxFuture<'static, Result<Prefab, FetchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail.load(Ordering::SeqCst);
        let key = key.clone();

        async move {
            tokio::task::yield_now().await;
            if fail {
                return Err(FetchError::Transport(format!("{key}: connection reset")));
            }
            match key.as_str() {
                "time-capsule" => Ok(capsule_prefab()),
                "screen" => Ok(screen_prefab()),
                other => Err(FetchError::NotFound(other.to_string())),
            }
        }
        .boxed()
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub struct Fixture {
    pub editor: Editor,
    pub resolver: Arc<MockResolver>,
    pub cache: Arc<MockMediaCache>,
    pub models: Arc<MockModelLoader>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let resolver = MockResolver::new();
        let cache = MockMediaCache::new();
        let models = MockModelLoader::new();
        let editor = Editor::builder()
            .config(config)
            .resolver(resolver.clone())
            .media_cache(cache.clone())
            .model_loader(models.clone())
            .build()
            .expect("editor builds inside a tokio runtime");
        Self {
            editor,
            resolver,
            cache,
            models,
        }
    }
}

/// Drains every event emitted so far.
pub fn drain(rx: &flume::Receiver<EditorEvent>) -> Vec<EditorEvent> {
    rx.try_iter().collect()
}

/// Yields to spawned tasks until `done` holds.
pub async fn until(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached after 200 yields");
}
