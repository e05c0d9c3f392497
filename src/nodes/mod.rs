//! Editor Node Types
//!
//! - [`EarthGlobeNode`]: textured sphere with a colour map and a bump map
//! - [`TimeCapsuleNode`]: video screen embedded in a shared capsule model
//!
//! Both own a [`LoadController`](crate::load::LoadController) for their media and expose
//! property accessors: getters return committed values, setters start a
//! background load and return immediately.

pub mod audio;
pub mod earth_globe;
pub mod time_capsule;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Result;
use crate::issues::Issue;
use crate::load::{Affordances, LoadPhase};
use crate::media::MediaMeta;
use crate::record::{ExportComponents, NodeRecord};

pub use audio::{AudioElementType, AudioParams, AudioType, DistanceModel};
pub use earth_globe::{EarthGlobeNode, EarthGlobeProps, Globe, GlobeMaterial, SphereGeometry};
pub use time_capsule::{
    Projection, RuntimeResources, TimeCapsuleNode, TimeCapsuleProps, VideoScreen, VideoSettings,
};

/// Unique identity of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Behaviour shared by every editor node.
pub trait EditorNode {
    fn id(&self) -> NodeId;
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
    /// Name of the component this node type persists under.
    fn component_name(&self) -> &'static str;
    /// Display name of the node type.
    fn node_name(&self) -> &'static str;
    fn phase(&self) -> LoadPhase;
    fn affordances(&self) -> Affordances;
    fn issues(&self) -> Vec<Issue>;
    fn attribution(&self) -> Option<MediaMeta>;
    /// Committed property values only; pending values are never persisted.
    fn serialize(&self) -> Result<NodeRecord>;
    /// Export components derived from committed state.
    fn prepare_for_export(&self) -> Result<ExportComponents>;
    /// Drops pending loads and renderable resources.
    fn dispose(&self);
}
