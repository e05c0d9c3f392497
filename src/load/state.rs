use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::errors::MediaLoadError;
use crate::issues::{Issue, RenderableStats};
use crate::media::{DecodedMedia, MediaKind, MediaMeta};

/// Lifecycle of a node's media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

bitflags! {
    /// Visual indicators driven by the load state machine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Affordances: u8 {
        /// Placeholder geometry shown while a load is pending.
        const LOADING = 1 << 0;
        /// Error icon shown after a failed load.
        const ERROR   = 1 << 1;
    }
}

/// One bound media source of a node.
///
/// `committed` only ever holds a value whose load fully succeeded;
/// `requested` is the in-flight target, if any.
#[derive(Debug, Clone, Default)]
pub struct MediaSlot {
    pub committed: String,
    pub requested: Option<String>,
    pub resource: Option<Arc<DecodedMedia>>,
    pub meta: Option<MediaMeta>,
}

impl MediaSlot {
    /// The newest value asked for: the pending target, else the committed one.
    #[must_use]
    pub fn target(&self) -> &str {
        self.requested.as_deref().unwrap_or(&self.committed)
    }

    /// Copy of the committed half of this slot.
    #[must_use]
    pub fn committed_copy(&self) -> Self {
        Self {
            committed: self.committed.clone(),
            requested: None,
            resource: self.resource.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// Result of one `load` call.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The targets equal the committed values; nothing was fetched.
    Unchanged,
    /// Every slot loaded and the targets are now committed.
    Committed,
    /// A newer request replaced this one; its result was discarded.
    Superseded,
    Failed(MediaLoadError),
}

impl LoadOutcome {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, LoadOutcome::Committed)
    }
}

/// Editor state visible to content while attaching media.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachContext {
    pub playing: bool,
}

/// Renderable content a node binds its media slots to.
pub trait MediaContent: Send + 'static {
    const KIND: MediaKind;

    /// Called when a new load starts.
    fn begin(&mut self, _ctx: &AttachContext) {}

    /// Binds committed resources, one entry per slot (`None` for empty slots).
    fn attach(&mut self, resources: &[Option<Arc<DecodedMedia>>], ctx: &AttachContext);

    /// Drops every resource held by the content.
    fn release(&mut self) {
        self.attach(&[], &AttachContext::default());
    }

    fn stats(&self) -> RenderableStats;

    /// Message of the [`MediaLoadError`] reported when loading `targets` fails.
    fn error_message(targets: &[String]) -> String {
        format!("Error loading {} {}", Self::KIND, targets.join(", "))
    }
}

pub(crate) struct LoadState<C> {
    pub(crate) slots: SmallVec<[MediaSlot; 2]>,
    /// Bumped by every request; a load may only settle while it still owns it.
    pub(crate) generation: u64,
    pub(crate) phase: LoadPhase,
    pub(crate) issues: Vec<Issue>,
    pub(crate) affordances: Affordances,
    pub(crate) content: C,
}

impl<C> LoadState<C> {
    pub(crate) fn new(slot_count: usize, content: C) -> Self {
        Self {
            slots: (0..slot_count).map(|_| MediaSlot::default()).collect(),
            generation: 0,
            phase: LoadPhase::Idle,
            issues: Vec::new(),
            affordances: Affordances::empty(),
            content,
        }
    }

    pub(crate) fn resources(&self) -> Vec<Option<Arc<DecodedMedia>>> {
        self.slots.iter().map(|slot| slot.resource.clone()).collect()
    }

    pub(crate) fn has_committed(&self) -> bool {
        self.slots.iter().any(|slot| !slot.committed.is_empty())
    }
}
