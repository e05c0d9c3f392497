//! Earth Globe Node
//!
//! A unit sphere whose phong material takes a colour map (`globeTexture`)
//! and a bump map (`bumpMap`). Both textures load together and are committed
//! together, so the material never shows a new colour map over an old bump
//! map.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::errors::Result;
use crate::issues::{Issue, RenderableStats};
use crate::load::{
    Affordances, AttachContext, ErrorCallback, LoadController, LoadOutcome, LoadPhase, MediaContent,
};
use crate::media::{DecodedMedia, MediaKind, MediaMeta};
use crate::nodes::{EditorNode, NodeId};
use crate::record::{ExportComponents, NodeRecord};
use crate::tracker::LoadTracker;

const GLOBE_TEXTURE_SLOT: usize = 0;
const BUMP_MAP_SLOT: usize = 1;

pub const BUMP_SCALE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl SphereGeometry {
    #[must_use]
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments,
            height_segments,
        }
    }

    /// Pole rows contribute one triangle per segment, every other row two.
    #[must_use]
    pub fn triangle_count(&self) -> u32 {
        2 * self.width_segments * self.height_segments.saturating_sub(1)
    }
}

impl Default for SphereGeometry {
    fn default() -> Self {
        Self::new(1.0, 32, 32)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GlobeMaterial {
    pub map: Option<Arc<DecodedMedia>>,
    pub bump_map: Option<Arc<DecodedMedia>>,
    pub bump_scale: f32,
    /// Bumped on every change the renderer has to pick up.
    pub version: u64,
}

/// Renderable content of an [`EarthGlobeNode`].
#[derive(Debug, Clone, Default)]
pub struct Globe {
    pub geometry: SphereGeometry,
    pub material: GlobeMaterial,
}

impl MediaContent for Globe {
    const KIND: MediaKind = MediaKind::Image;

    fn attach(&mut self, resources: &[Option<Arc<DecodedMedia>>], _ctx: &AttachContext) {
        self.material.map = resources.get(GLOBE_TEXTURE_SLOT).cloned().flatten();
        self.material.bump_map = resources.get(BUMP_MAP_SLOT).cloned().flatten();
        self.material.bump_scale = BUMP_SCALE;
        self.material.version += 1;
    }

    fn stats(&self) -> RenderableStats {
        let mut stats = RenderableStats {
            triangles: self.geometry.triangle_count(),
            materials: 1,
            textures: Vec::new(),
        };
        for texture in [&self.material.map, &self.material.bump_map].into_iter().flatten() {
            stats.add_media(texture);
        }
        stats
    }

    fn error_message(_targets: &[String]) -> String {
        "Error loading image textures".to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EarthGlobeProps {
    pub globe_texture: String,
    pub bump_map: String,
    pub json_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EarthGlobeExport<'a> {
    bump_map: &'a str,
    json_url: &'a str,
}

pub struct EarthGlobeNode {
    id: NodeId,
    name: String,
    json_url: String,
    loader: LoadController<Globe>,
}

impl EarthGlobeNode {
    pub const COMPONENT_NAME: &'static str = "earth-globe";
    pub const NODE_NAME: &'static str = "Earth Globe";

    /// Creates a globe with no textures.
    #[must_use]
    pub fn new(editor: &Editor) -> Self {
        Self::with_id(editor, NodeId::new(), Self::NODE_NAME)
    }

    fn with_id(editor: &Editor, id: NodeId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            json_url: String::new(),
            loader: LoadController::new(editor.clone(), id, 2, Globe::default()),
        }
    }

    /// Properties a freshly inserted globe starts with.
    #[must_use]
    pub fn initial_props(config: &EditorConfig) -> EarthGlobeProps {
        EarthGlobeProps {
            globe_texture: config.defaults.globe_texture.clone(),
            bump_map: config.defaults.bump_map.clone(),
            json_url: String::new(),
        }
    }

    /// Creates a globe and starts loading the default textures.
    #[must_use]
    pub fn insert(editor: &Editor) -> Self {
        let node = Self::new(editor);
        let props = Self::initial_props(editor.config());
        node.loader
            .request(vec![props.globe_texture, props.bump_map], None);
        node
    }

    #[must_use]
    pub fn globe_texture(&self) -> String {
        self.loader.committed(GLOBE_TEXTURE_SLOT)
    }

    /// Loads a new colour map, keeping the newest requested bump map.
    pub fn set_globe_texture(&self, value: impl Into<String>) {
        let bump_map = self.loader.target(BUMP_MAP_SLOT);
        self.loader.request(vec![value.into(), bump_map], None);
    }

    #[must_use]
    pub fn bump_map(&self) -> String {
        self.loader.committed(BUMP_MAP_SLOT)
    }

    /// Loads a new bump map, keeping the newest requested colour map.
    pub fn set_bump_map(&self, value: impl Into<String>) {
        let globe_texture = self.loader.target(GLOBE_TEXTURE_SLOT);
        self.loader.request(vec![globe_texture, value.into()], None);
    }

    #[must_use]
    pub fn json_url(&self) -> &str {
        &self.json_url
    }

    pub fn set_json_url(&mut self, json_url: impl Into<String>) {
        self.json_url = json_url.into();
    }

    /// Loads both textures and waits for the result.
    pub async fn load_textures(
        &self,
        globe_texture: impl Into<String>,
        bump_map: impl Into<String>,
        on_error: Option<ErrorCallback>,
    ) -> LoadOutcome {
        self.loader
            .load(vec![globe_texture.into(), bump_map.into()], on_error)
            .await
    }

    /// Snapshot of the current material.
    #[must_use]
    pub fn material(&self) -> GlobeMaterial {
        self.loader.content(|globe| globe.material.clone())
    }

    #[must_use]
    pub fn geometry(&self) -> SphereGeometry {
        self.loader.content(|globe| globe.geometry)
    }

    /// Rebuilds a globe from its record. Plain fields are applied right away;
    /// the texture load runs in the background and is registered with `tracker`.
    pub fn deserialize(
        editor: &Editor,
        record: &NodeRecord,
        tracker: &LoadTracker,
        on_error: Option<ErrorCallback>,
    ) -> Result<Self> {
        let props: EarthGlobeProps = record.require(Self::COMPONENT_NAME)?.props()?;

        let mut node = Self::with_id(editor, record.id, &record.name);
        node.json_url = props.json_url;

        let loader = node.loader.clone();
        let targets = vec![props.globe_texture, props.bump_map];
        tracker.track(editor.spawn(async move {
            loader.load(targets, on_error).await;
        }));

        Ok(node)
    }

    /// Copies committed state from `source`, including loaded textures.
    pub fn copy_from(&mut self, source: &Self) {
        self.name.clone_from(&source.name);
        self.json_url.clone_from(&source.json_url);
        self.loader.copy_from(&source.loader);
    }

    /// Copy of this node under a new id.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut node = Self::new(self.loader.editor());
        node.copy_from(self);
        node
    }
}

impl EditorNode for EarthGlobeNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn component_name(&self) -> &'static str {
        Self::COMPONENT_NAME
    }

    fn node_name(&self) -> &'static str {
        Self::NODE_NAME
    }

    fn phase(&self) -> LoadPhase {
        self.loader.phase()
    }

    fn affordances(&self) -> Affordances {
        self.loader.affordances()
    }

    fn issues(&self) -> Vec<Issue> {
        self.loader.issues()
    }

    fn attribution(&self) -> Option<MediaMeta> {
        self.loader.attribution()
    }

    fn serialize(&self) -> Result<NodeRecord> {
        let mut record = NodeRecord::new(self.id, self.name.clone());
        record.push(
            Self::COMPONENT_NAME,
            &EarthGlobeProps {
                globe_texture: self.globe_texture(),
                bump_map: self.bump_map(),
                json_url: self.json_url.clone(),
            },
        )?;
        Ok(record)
    }

    fn prepare_for_export(&self) -> Result<ExportComponents> {
        let bump_map = self.bump_map();
        let mut export = ExportComponents::new();
        // The colour map travels with the exported mesh material.
        export.add(
            Self::COMPONENT_NAME,
            &EarthGlobeExport {
                bump_map: &bump_map,
                json_url: &self.json_url,
            },
        )?;
        Ok(export)
    }

    fn dispose(&self) {
        self.loader.dispose();
    }
}

impl Drop for EarthGlobeNode {
    fn drop(&mut self) {
        self.loader.invalidate();
    }
}
