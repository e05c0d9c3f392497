use std::sync::Arc;

use futures::future;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::editor::Editor;
use crate::errors::{LoadFailure, MediaLoadError};
use crate::events::EditorEvent;
use crate::issues::{Issue, maybe_add_large_file_issue};
use crate::load::state::{
    Affordances, AttachContext, LoadOutcome, LoadPhase, LoadState, MediaContent, MediaSlot,
};
use crate::media::{DecodedMedia, MediaKind, MediaMeta, MediaRequest, Transport, is_hls};
use crate::nodes::NodeId;

/// Optional sink for load failures, used for aggregate reporting during
/// bulk deserialization.
pub type ErrorCallback = Arc<dyn Fn(NodeId, &MediaLoadError) + Send + Sync>;

struct LoadedSlot {
    media: Arc<DecodedMedia>,
    meta: Option<MediaMeta>,
}

enum Begin {
    Unchanged { restored: bool },
    Started(u64),
}

/// Per-node media load state machine.
///
/// Owns the node's [`MediaSlot`]s and renderable content `C`. All slots of a
/// request load concurrently and are committed together, only if the request
/// is still the newest one when it completes.
///
/// Cloning yields another handle to the same state; background loads hold
/// such a clone.
pub struct LoadController<C> {
    id: NodeId,
    editor: Editor,
    state: Arc<Mutex<LoadState<C>>>,
}

impl<C> Clone for LoadController<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            editor: self.editor.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: MediaContent> LoadController<C> {
    pub fn new(editor: Editor, id: NodeId, slot_count: usize, content: C) -> Self {
        Self {
            id,
            editor,
            state: Arc::new(Mutex::new(LoadState::new(slot_count, content))),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.state.lock().phase
    }

    #[must_use]
    pub fn affordances(&self) -> Affordances {
        self.state.lock().affordances
    }

    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        self.state.lock().issues.clone()
    }

    /// Committed value of `slot`; empty when out of range.
    #[must_use]
    pub fn committed(&self, slot: usize) -> String {
        self.state
            .lock()
            .slots
            .get(slot)
            .map(|s| s.committed.clone())
            .unwrap_or_default()
    }

    /// Pending target of `slot`, falling back to its committed value.
    #[must_use]
    pub fn target(&self, slot: usize) -> String {
        self.state
            .lock()
            .slots
            .get(slot)
            .map(|s| s.target().to_string())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn targets(&self) -> Vec<String> {
        self.state
            .lock()
            .slots
            .iter()
            .map(|s| s.target().to_string())
            .collect()
    }

    #[must_use]
    pub fn resource(&self, slot: usize) -> Option<Arc<DecodedMedia>> {
        self.state.lock().slots.get(slot).and_then(|s| s.resource.clone())
    }

    /// Attribution of the first slot that reported any.
    #[must_use]
    pub fn attribution(&self) -> Option<MediaMeta> {
        self.state.lock().slots.iter().find_map(|s| s.meta.clone())
    }

    pub fn content<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.state.lock().content)
    }

    pub fn content_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.state.lock().content)
    }

    /// Records `targets` as the pending request and fetches them in the
    /// background. Returns immediately.
    ///
    /// Failures never surface here; they end up in the node's issues, the
    /// optional callback and the log.
    pub fn request(&self, targets: Vec<String>, on_error: Option<ErrorCallback>) {
        if let Some(generation) = self.start(&targets) {
            let controller = self.clone();
            self.editor.spawn_load(async move {
                controller.fetch(generation, targets, on_error).await;
            });
        }
    }

    /// Loads `targets` (one per slot) and settles the node's state.
    ///
    /// The fetch runs as a background load. Dropping the returned future
    /// stops waiting, not the load.
    pub async fn load(&self, targets: Vec<String>, on_error: Option<ErrorCallback>) -> LoadOutcome {
        let Some(generation) = self.start(&targets) else {
            return LoadOutcome::Unchanged;
        };

        let (tx, rx) = oneshot::channel();
        let controller = self.clone();
        self.editor.spawn_load(async move {
            let outcome = controller.fetch(generation, targets, on_error).await;
            let _ = tx.send(outcome);
        });

        rx.await.unwrap_or_else(|_| {
            log::warn!("Load task of node {} ended before settling", self.id);
            LoadOutcome::Superseded
        })
    }

    /// Returns the generation of the new load, or `None` when nothing has to
    /// be fetched.
    fn start(&self, targets: &[String]) -> Option<u64> {
        match self.begin(targets) {
            Begin::Unchanged { restored } => {
                if restored {
                    self.notify();
                }
                None
            }
            Begin::Started(generation) => Some(generation),
        }
    }

    async fn fetch(
        &self,
        generation: u64,
        targets: Vec<String>,
        on_error: Option<ErrorCallback>,
    ) -> LoadOutcome {
        let timeout = self.editor.config().load_timeout();
        let fetches = targets
            .iter()
            .map(|target| fetch_slot(&self.editor, target.clone(), C::KIND));

        let result = match tokio::time::timeout(timeout, future::join_all(fetches)).await {
            Ok(slots) => slots.into_iter().collect::<Result<Vec<_>, _>>(),
            Err(_) => Err(LoadFailure::Timeout(timeout)),
        };

        self.settle(generation, &targets, result, on_error.as_ref())
    }

    fn begin(&self, targets: &[String]) -> Begin {
        let ctx = self.attach_context();
        let mut state = self.state.lock();
        debug_assert_eq!(targets.len(), state.slots.len(), "one target per slot");

        let unchanged = targets.len() == state.slots.len()
            && targets.iter().any(|t| !t.is_empty())
            && state.slots.iter().zip(targets).all(|(slot, t)| slot.committed == *t);

        if unchanged {
            // Going back to the committed value cancels whatever was pending.
            let restored = matches!(state.phase, LoadPhase::Loading | LoadPhase::Failed);
            if restored {
                state.generation += 1;
                for slot in &mut state.slots {
                    slot.requested = None;
                }
                let resources = state.resources();
                state.content.attach(&resources, &ctx);
                state.issues = self.scan(&state);
                state.affordances = Affordances::empty();
                state.phase = LoadPhase::Ready;
            }
            return Begin::Unchanged { restored };
        }

        state.generation += 1;
        for (slot, target) in state.slots.iter_mut().zip(targets) {
            slot.requested = Some(target.clone());
        }
        state.phase = LoadPhase::Loading;
        state.issues.clear();
        state.affordances.remove(Affordances::ERROR);
        state.affordances.insert(Affordances::LOADING);
        state.content.begin(&ctx);

        Begin::Started(state.generation)
    }

    fn settle(
        &self,
        generation: u64,
        targets: &[String],
        result: Result<Vec<Option<LoadedSlot>>, LoadFailure>,
        on_error: Option<&ErrorCallback>,
    ) -> LoadOutcome {
        let ctx = self.attach_context();
        let mut state = self.state.lock();

        if state.generation != generation {
            log::debug!("Discarding stale load of {targets:?} for node {}", self.id);
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(loaded) => {
                for ((slot, target), loaded) in state.slots.iter_mut().zip(targets).zip(loaded) {
                    slot.committed.clone_from(target);
                    slot.requested = None;
                    (slot.resource, slot.meta) = match loaded {
                        Some(loaded) => (Some(loaded.media), loaded.meta),
                        None => (None, None),
                    };
                }
                let resources = state.resources();
                state.content.attach(&resources, &ctx);
                state.issues = self.scan(&state);
                state.affordances = Affordances::empty();
                state.phase = LoadPhase::Ready;
                drop(state);

                self.notify();
                LoadOutcome::Committed
            }
            Err(cause) => {
                for slot in &mut state.slots {
                    slot.requested = None;
                }
                // Committed resources stay bound.
                let resources = state.resources();
                state.content.attach(&resources, &ctx);
                state.phase = LoadPhase::Failed;
                state.affordances = Affordances::ERROR;
                state
                    .issues
                    .push(Issue::error(format!("Error loading {}.", C::KIND)));
                drop(state);

                let error = MediaLoadError::new(C::error_message(targets), cause);
                log::error!("{error}: {}", error.cause);
                if let Some(on_error) = on_error {
                    on_error(self.id, &error);
                }
                self.notify();
                LoadOutcome::Failed(error)
            }
        }
    }

    /// Replaces this controller's state with the committed state of `source`.
    /// No network activity; pending loads on either side are ignored.
    pub fn copy_from(&self, source: &Self)
    where
        C: Clone,
    {
        if Arc::ptr_eq(&self.state, &source.state) {
            return;
        }

        let (slots, content) = {
            let src = source.state.lock();
            let slots: Vec<MediaSlot> = src.slots.iter().map(MediaSlot::committed_copy).collect();
            (slots, src.content.clone())
        };

        let ctx = self.attach_context();
        let mut state = self.state.lock();
        state.generation += 1;
        state.slots = slots.into_iter().collect();
        state.content = content;
        let resources = state.resources();
        state.content.attach(&resources, &ctx);
        state.affordances = Affordances::empty();
        if state.has_committed() {
            state.phase = LoadPhase::Ready;
            state.issues = self.scan(&state);
        } else {
            state.phase = LoadPhase::Idle;
            state.issues.clear();
        }
    }

    /// Makes every in-flight load of this controller stale.
    pub fn invalidate(&self) {
        self.state.lock().generation += 1;
    }

    /// Releases resources and pending loads. Committed values are kept.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        for slot in &mut state.slots {
            slot.requested = None;
            slot.resource = None;
        }
        state.content.release();
        state.issues.clear();
        state.affordances = Affordances::empty();
        state.phase = LoadPhase::Idle;
    }

    fn attach_context(&self) -> AttachContext {
        AttachContext {
            playing: self.editor.is_playing(),
        }
    }

    fn scan(&self, state: &LoadState<C>) -> Vec<Issue> {
        let mut issues = self.editor.scanner().scan(&state.content.stats());
        let limits = &self.editor.config().limits;
        for size in state
            .slots
            .iter()
            .filter_map(|slot| slot.resource.as_ref()?.byte_size())
        {
            maybe_add_large_file_issue(C::KIND, size, limits, &mut issues);
        }
        issues
    }

    fn notify(&self) {
        let events = self.editor.events();
        events.emit(EditorEvent::ObjectsChanged(vec![self.id]));
        events.emit(EditorEvent::SelectionChanged);
    }
}

/// Resolves and fetches one slot. Empty targets load nothing.
async fn fetch_slot(
    editor: &Editor,
    target: String,
    kind: MediaKind,
) -> Result<Option<LoadedSlot>, LoadFailure> {
    if target.is_empty() {
        return Ok(None);
    }

    let resolved = editor.resolver().resolve(&target).await?;

    let transport = if kind == MediaKind::Video && is_hls(&target, resolved.content_type.as_deref()) {
        Transport::Hls
    } else {
        Transport::Progressive
    };

    let media = editor
        .media_cache()
        .get(MediaRequest {
            source: target,
            url: resolved.accessible_url,
            kind,
            transport,
        })
        .await?;

    Ok(Some(LoadedSlot {
        media,
        meta: resolved.meta,
    }))
}
