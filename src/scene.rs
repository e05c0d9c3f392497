//! Editor Scene
//!
//! Owns the editor nodes of one document. Nodes live in a [`SlotMap`] so
//! handles stay valid while other nodes are removed.
//!
//! Loading a saved scene is a bulk operation: shared models are ensured
//! first, every node is rebuilt with its plain fields, and the media loads
//! run in the background. [`EditorScene::settled`] waits for all of them.

use slotmap::{SlotMap, new_key_type};

use crate::editor::Editor;
use crate::errors::{Error, Result};
use crate::issues::Issue;
use crate::load::{Affordances, ErrorCallback, LoadPhase};
use crate::media::MediaMeta;
use crate::nodes::{EarthGlobeNode, EditorNode, NodeId, TimeCapsuleNode};
use crate::record::{ExportComponents, NodeRecord, SceneRecord};
use crate::tracker::LoadTracker;

new_key_type! {
    pub struct NodeKey;
}

pub enum SceneNode {
    EarthGlobe(EarthGlobeNode),
    TimeCapsule(TimeCapsuleNode),
}

impl SceneNode {
    fn inner(&self) -> &dyn EditorNode {
        match self {
            SceneNode::EarthGlobe(node) => node,
            SceneNode::TimeCapsule(node) => node,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn EditorNode {
        match self {
            SceneNode::EarthGlobe(node) => node,
            SceneNode::TimeCapsule(node) => node,
        }
    }

    #[must_use]
    pub fn as_earth_globe(&self) -> Option<&EarthGlobeNode> {
        match self {
            SceneNode::EarthGlobe(node) => Some(node),
            SceneNode::TimeCapsule(_) => None,
        }
    }

    #[must_use]
    pub fn as_time_capsule(&self) -> Option<&TimeCapsuleNode> {
        match self {
            SceneNode::TimeCapsule(node) => Some(node),
            SceneNode::EarthGlobe(_) => None,
        }
    }

    /// Picks the node type from the record's components.
    fn deserialize(
        editor: &Editor,
        record: &NodeRecord,
        tracker: &LoadTracker,
        on_error: Option<ErrorCallback>,
    ) -> Result<Self> {
        if record.component(EarthGlobeNode::COMPONENT_NAME).is_some() {
            EarthGlobeNode::deserialize(editor, record, tracker, on_error).map(SceneNode::EarthGlobe)
        } else if record.component(TimeCapsuleNode::COMPONENT_NAME).is_some() {
            TimeCapsuleNode::deserialize(editor, record, tracker, on_error).map(SceneNode::TimeCapsule)
        } else {
            Err(Error::UnknownNodeType(record.id.to_string()))
        }
    }
}

impl EditorNode for SceneNode {
    fn id(&self) -> NodeId {
        self.inner().id()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn set_name(&mut self, name: String) {
        self.inner_mut().set_name(name);
    }

    fn component_name(&self) -> &'static str {
        self.inner().component_name()
    }

    fn node_name(&self) -> &'static str {
        self.inner().node_name()
    }

    fn phase(&self) -> LoadPhase {
        self.inner().phase()
    }

    fn affordances(&self) -> Affordances {
        self.inner().affordances()
    }

    fn issues(&self) -> Vec<Issue> {
        self.inner().issues()
    }

    fn attribution(&self) -> Option<MediaMeta> {
        self.inner().attribution()
    }

    fn serialize(&self) -> Result<NodeRecord> {
        self.inner().serialize()
    }

    fn prepare_for_export(&self) -> Result<ExportComponents> {
        self.inner().prepare_for_export()
    }

    fn dispose(&self) {
        self.inner().dispose();
    }
}

impl From<EarthGlobeNode> for SceneNode {
    fn from(node: EarthGlobeNode) -> Self {
        SceneNode::EarthGlobe(node)
    }
}

impl From<TimeCapsuleNode> for SceneNode {
    fn from(node: TimeCapsuleNode) -> Self {
        SceneNode::TimeCapsule(node)
    }
}

pub struct EditorScene {
    editor: Editor,
    nodes: SlotMap<NodeKey, SceneNode>,
    tracker: LoadTracker,
}

impl EditorScene {
    #[must_use]
    pub fn new(editor: Editor) -> Self {
        Self {
            editor,
            nodes: SlotMap::with_key(),
            tracker: LoadTracker::new(),
        }
    }

    /// Rebuilds a saved scene. Returns once every node exists; media keeps
    /// loading in the background (see [`EditorScene::settled`]).
    ///
    /// Load failures do not fail the scene. They are reported per node
    /// through `on_error`.
    pub async fn from_record(
        editor: &Editor,
        record: &SceneRecord,
        on_error: Option<ErrorCallback>,
    ) -> Result<Self> {
        let needs_models = record
            .nodes
            .iter()
            .any(|node| node.component(TimeCapsuleNode::COMPONENT_NAME).is_some());
        if needs_models {
            TimeCapsuleNode::load_models(editor).await?;
        }

        let mut scene = Self::new(editor.clone());
        for node_record in &record.nodes {
            let node =
                SceneNode::deserialize(editor, node_record, &scene.tracker, on_error.clone())?;
            scene.nodes.insert(node);
        }

        log::info!(
            "Scene loaded with {} nodes, {} media loads pending",
            scene.nodes.len(),
            scene.tracker.pending()
        );
        Ok(scene)
    }

    #[inline]
    #[must_use]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn add(&mut self, node: impl Into<SceneNode>) -> NodeKey {
        self.nodes.insert(node.into())
    }

    #[must_use]
    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<NodeKey> {
        self.nodes
            .iter()
            .find_map(|(key, node)| (node.id() == id).then_some(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &SceneNode)> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes and disposes a node. In-flight loads of the node are dropped.
    pub fn remove(&mut self, key: NodeKey) -> Option<SceneNode> {
        let node = self.nodes.remove(key)?;
        node.dispose();
        Some(node)
    }

    /// Committed state of every node.
    pub fn to_record(&self) -> Result<SceneRecord> {
        let nodes = self
            .nodes
            .values()
            .map(EditorNode::serialize)
            .collect::<Result<Vec<_>>>()?;
        Ok(SceneRecord {
            nodes,
            ..SceneRecord::default()
        })
    }

    /// Waits for the scene's bulk loads and every load started by setters.
    pub async fn settled(&self) {
        self.tracker.settled().await;
        self.editor.loads().settled().await;
    }

    /// Export components of every node, taken once all loads settled.
    pub async fn export(&self) -> Result<Vec<(NodeId, ExportComponents)>> {
        self.settled().await;
        self.nodes
            .values()
            .map(|node| Ok((node.id(), node.prepare_for_export()?)))
            .collect()
    }
}
