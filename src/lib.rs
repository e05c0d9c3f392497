#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod assets;
pub mod config;
pub mod editor;
pub mod errors;
pub mod events;
pub mod issues;
pub mod load;
pub mod media;
pub mod nodes;
pub mod record;
pub mod scene;
pub mod tracker;
pub mod utils;

pub use assets::{ModelKey, ModelLoader, Prefab, SharedModelCache};
pub use config::EditorConfig;
pub use editor::{Editor, EditorBuilder};
pub use errors::{Error, FetchError, LoadFailure, MediaLoadError, ResolutionError, Result};
pub use events::{EditorEvent, EventBus};
pub use issues::{Issue, IssueScanner, PerfIssueScanner, Severity};
pub use load::{Affordances, ErrorCallback, LoadOutcome, LoadPhase};
pub use media::{DecodedMedia, MediaCache, MediaKind, MediaRequest, MediaResolver, ResolvedMedia};
pub use nodes::{EarthGlobeNode, EditorNode, NodeId, TimeCapsuleNode};
pub use record::{ComponentRecord, ExportComponents, NodeRecord, SceneRecord};
pub use scene::{EditorScene, NodeKey, SceneNode};
pub use tracker::LoadTracker;
pub use utils::init_logging;
