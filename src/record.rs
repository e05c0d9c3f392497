//! Persisted records and export components.
//!
//! A node persists as a list of named components, each a `{ name, props }`
//! object. Export produces the same shape, appended to the node's component
//! list in the exported scene. Everything here is a pure mapping; no loads.
//!
//! ```json
//! {
//!   "id": "4f8c…",
//!   "name": "Globe",
//!   "components": [
//!     { "name": "earth-globe", "props": { "globeTexture": "a.jpg", "bumpMap": "", "jsonUrl": "" } }
//!   ]
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Error, Result};
use crate::nodes::NodeId;

pub const SCENE_RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl ComponentRecord {
    /// Builds a record from a typed props struct that serializes to an object.
    pub fn new<P: Serialize>(name: impl Into<String>, props: &P) -> Result<Self> {
        let props = match serde_json::to_value(props)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::Json(serde::ser::Error::custom(format!(
                    "component props must be an object, got {other}"
                ))));
            }
        };
        Ok(Self {
            name: name.into(),
            props,
        })
    }

    pub fn props<P: DeserializeOwned>(&self) -> Result<P> {
        Ok(serde_json::from_value(Value::Object(self.props.clone()))?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

impl NodeRecord {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            components: Vec::new(),
        }
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentRecord> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&ComponentRecord> {
        self.component(name)
            .ok_or_else(|| Error::MissingComponent(name.to_string()))
    }

    pub fn push<P: Serialize>(&mut self, name: &str, props: &P) -> Result<()> {
        self.components.push(ComponentRecord::new(name, props)?);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub version: u32,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

impl Default for SceneRecord {
    fn default() -> Self {
        Self {
            version: SCENE_RECORD_VERSION,
            nodes: Vec::new(),
        }
    }
}

impl SceneRecord {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Export-time components of one node. Names are unique per node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExportComponents {
    components: Vec<ComponentRecord>,
}

impl ExportComponents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<P: Serialize>(&mut self, name: &str, props: &P) -> Result<()> {
        if self.get(name).is_some() {
            log::warn!("Export component '{name}' added twice");
            return Err(Error::DuplicateComponent(name.to_string()));
        }
        self.components.push(ComponentRecord::new(name, props)?);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ComponentRecord> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.components.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
