//! Time Capsule Node
//!
//! A video screen mounted inside a shared capsule model. The capsule and the
//! screen geometry come from the editor's [`SharedModelCache`]; call
//! [`TimeCapsuleNode::load_models`] once before creating nodes.
//!
//! [`SharedModelCache`]: crate::assets::SharedModelCache

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::assets::model_cache::ModelKey;
use crate::assets::prefab::{GeometryDesc, Prefab};
use crate::editor::Editor;
use crate::errors::{Error, Result};
use crate::issues::{Issue, RenderableStats};
use crate::load::{
    Affordances, AttachContext, ErrorCallback, LoadController, LoadOutcome, LoadPhase, MediaContent,
};
use crate::media::{DecodedMedia, MediaKind, MediaMeta, Transport};
use crate::nodes::audio::{AUDIO_PARAMS_COMPONENT, AudioElementType, AudioParams};
use crate::nodes::{EditorNode, NodeId};
use crate::record::{ExportComponents, NodeRecord};
use crate::tracker::LoadTracker;

pub const TIME_CAPSULE_MODEL: ModelKey = ModelKey::from_static("time-capsule");
pub const SCREEN_MODEL: ModelKey = ModelKey::from_static("screen");

const SRC_SLOT: usize = 0;

/// Seconds into a progressive video shown as the editor preview frame.
const PREVIEW_TIME: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Projection {
    #[serde(rename = "flat")]
    Flat,
    #[serde(rename = "360-equirectangular")]
    Equirectangular360,
    #[default]
    #[serde(rename = "custom")]
    Custom,
}

/// Playback settings exported with the `video` component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoSettings {
    pub controls: bool,
    pub auto_play: bool,
    pub loop_playback: bool,
    pub projection: Projection,
}

/// Renderable content of a [`TimeCapsuleNode`]: the screen mesh and its
/// video element.
#[derive(Debug, Clone)]
pub struct VideoScreen {
    pub geometry: Arc<GeometryDesc>,
    pub position: Vec3,
    pub visible: bool,
    pub stream: Option<Arc<DecodedMedia>>,
    /// Playback position in seconds.
    pub current_time: f64,
    pub paused: bool,
    pub settings: VideoSettings,
}

impl VideoScreen {
    #[must_use]
    pub fn new(geometry: Arc<GeometryDesc>) -> Self {
        Self {
            geometry,
            position: Vec3::new(0.0, 0.5, -0.5),
            visible: false,
            stream: None,
            current_time: 0.0,
            paused: true,
            settings: VideoSettings::default(),
        }
    }
}

impl MediaContent for VideoScreen {
    const KIND: MediaKind = MediaKind::Video;

    fn begin(&mut self, ctx: &AttachContext) {
        self.visible = false;
        if ctx.playing {
            self.paused = true;
        }
    }

    fn attach(&mut self, resources: &[Option<Arc<DecodedMedia>>], ctx: &AttachContext) {
        self.stream = resources.get(SRC_SLOT).cloned().flatten();
        self.visible = self.stream.is_some();

        // HLS streams stay at the start; fetching stops once the first
        // segments are in.
        self.current_time = match self.stream.as_deref().and_then(DecodedMedia::as_video) {
            Some(video) if video.transport == Transport::Progressive => match video.duration {
                Some(duration) if duration > 0.0 => PREVIEW_TIME,
                _ => 0.0,
            },
            _ => 0.0,
        };

        self.paused = !(self.stream.is_some() && ctx.playing && self.settings.auto_play);
    }

    fn stats(&self) -> RenderableStats {
        let mut stats = RenderableStats {
            triangles: self.geometry.triangle_count,
            materials: 1,
            textures: Vec::new(),
        };
        if let Some(stream) = &self.stream {
            stats.add_media(stream);
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeCapsuleProps {
    pub src: String,
    pub json_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeCapsuleExport<'a> {
    json_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoExport<'a> {
    src: &'a str,
    controls: bool,
    auto_play: bool,
    #[serde(rename = "loop")]
    loop_playback: bool,
    projection: Projection,
}

#[derive(Serialize)]
struct NetworkedExport {
    id: NodeId,
}

/// Resources the stats panel counts for this node.
#[derive(Debug, Clone)]
pub struct RuntimeResources {
    pub textures: Vec<Arc<DecodedMedia>>,
    pub meshes: Vec<Arc<GeometryDesc>>,
    pub materials: u32,
}

pub struct TimeCapsuleNode {
    id: NodeId,
    name: String,
    json_url: String,
    audio: AudioParams,
    capsule: Prefab,
    loader: LoadController<VideoScreen>,
}

impl TimeCapsuleNode {
    pub const COMPONENT_NAME: &'static str = "time-capsule";
    pub const NODE_NAME: &'static str = "TimeCapsule";

    /// Loads the capsule and screen models into the editor's shared cache.
    pub async fn load_models(editor: &Editor) -> Result<()> {
        editor
            .models()
            .ensure_all(&[TIME_CAPSULE_MODEL, SCREEN_MODEL])
            .await?;
        Ok(())
    }

    /// Creates a node without a video. Fails while the shared models are
    /// not loaded.
    pub fn new(editor: &Editor) -> Result<Self> {
        Self::with_id(editor, NodeId::new(), Self::NODE_NAME)
    }

    fn with_id(editor: &Editor, id: NodeId, name: &str) -> Result<Self> {
        let models = editor.models();
        let screen = models.require(&SCREEN_MODEL)?;
        let mut capsule = models.instantiate(&TIME_CAPSULE_MODEL)?;

        let geometry = screen.first_geometry().ok_or_else(|| {
            Error::Configuration(format!("Model '{SCREEN_MODEL}' contains no mesh"))
        })?;

        let env_map = editor.environment_map();
        capsule.for_each_material_mut(|material| material.set_env_map(env_map.clone()));

        Ok(Self {
            id,
            name: name.to_string(),
            json_url: String::new(),
            audio: AudioParams::default(),
            capsule,
            loader: LoadController::new(editor.clone(), id, 1, VideoScreen::new(geometry)),
        })
    }

    /// Creates a node and starts loading the default video.
    pub fn insert(editor: &Editor) -> Result<Self> {
        let node = Self::new(editor)?;
        node.set_src(editor.config().defaults.video_src.clone());
        Ok(node)
    }

    #[must_use]
    pub fn src(&self) -> String {
        self.loader.committed(SRC_SLOT)
    }

    pub fn set_src(&self, src: impl Into<String>) {
        self.loader.request(vec![src.into()], None);
    }

    /// Loads `src` and waits for the result.
    pub async fn load(&self, src: impl Into<String>, on_error: Option<ErrorCallback>) -> LoadOutcome {
        self.loader.load(vec![src.into()], on_error).await
    }

    #[must_use]
    pub fn json_url(&self) -> &str {
        &self.json_url
    }

    pub fn set_json_url(&mut self, json_url: impl Into<String>) {
        self.json_url = json_url.into();
    }

    #[must_use]
    pub fn video_settings(&self) -> VideoSettings {
        self.loader.content(|screen| screen.settings)
    }

    pub fn set_video_settings(&self, settings: VideoSettings) {
        self.loader.content_mut(|screen| screen.settings = settings);
    }

    #[must_use]
    pub fn audio(&self) -> &AudioParams {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioParams {
        &mut self.audio
    }

    #[must_use]
    pub fn audio_element_type(&self) -> AudioElementType {
        AudioElementType::Video
    }

    /// This node's own copy of the capsule model.
    #[must_use]
    pub fn capsule(&self) -> &Prefab {
        &self.capsule
    }

    /// Snapshot of the screen and its playback state.
    #[must_use]
    pub fn screen(&self) -> VideoScreen {
        self.loader.content(VideoScreen::clone)
    }

    /// Called when the editor leaves play mode.
    pub fn on_pause(&self) {
        self.loader.content_mut(|screen| {
            screen.paused = true;
            screen.current_time = 0.0;
        });
    }

    /// `None` until a video is attached.
    #[must_use]
    pub fn runtime_resources(&self) -> Option<RuntimeResources> {
        self.loader.content(|screen| {
            let stream = screen.stream.clone()?;
            Some(RuntimeResources {
                textures: vec![stream],
                meshes: vec![Arc::clone(&screen.geometry)],
                materials: 1,
            })
        })
    }

    /// Rebuilds a node from its record. Plain fields are applied right away;
    /// the video load runs in the background and is registered with `tracker`.
    /// Playback settings are reset once that load finishes.
    pub fn deserialize(
        editor: &Editor,
        record: &NodeRecord,
        tracker: &LoadTracker,
        on_error: Option<ErrorCallback>,
    ) -> Result<Self> {
        let props: TimeCapsuleProps = record.require(Self::COMPONENT_NAME)?.props()?;
        let audio = match record.component(AUDIO_PARAMS_COMPONENT) {
            Some(component) => component.props()?,
            None => AudioParams::default(),
        };

        let mut node = Self::with_id(editor, record.id, &record.name)?;
        node.json_url = props.json_url;
        node.audio = audio;

        let loader = node.loader.clone();
        tracker.track(editor.spawn(async move {
            loader.load(vec![props.src], on_error).await;
            loader.content_mut(|screen| screen.settings = VideoSettings::default());
        }));

        Ok(node)
    }

    /// Copies committed state from `source`, including the attached video.
    pub fn copy_from(&mut self, source: &Self) {
        self.name.clone_from(&source.name);
        self.json_url.clone_from(&source.json_url);
        self.audio = source.audio.clone();
        self.loader.copy_from(&source.loader);
    }

    /// Copy of this node under a new id.
    pub fn duplicate(&self) -> Result<Self> {
        let mut node = Self::new(self.loader.editor())?;
        node.copy_from(self);
        Ok(node)
    }
}

impl EditorNode for TimeCapsuleNode {
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
            &TimeCapsuleProps {
                src: self.src(),
                json_url: self.json_url.clone(),
            },
        )?;
        record.push(AUDIO_PARAMS_COMPONENT, &self.audio)?;
        Ok(record)
    }

    fn prepare_for_export(&self) -> Result<ExportComponents> {
        let src = self.src();
        let settings = self.video_settings();

        let mut export = ExportComponents::new();
        export.add(AUDIO_PARAMS_COMPONENT, &self.audio)?;
        export.add(
            Self::COMPONENT_NAME,
            &TimeCapsuleExport {
                json_url: &self.json_url,
            },
        )?;
        export.add(
            "video",
            &VideoExport {
                src: &src,
                controls: settings.controls,
                auto_play: settings.auto_play,
                loop_playback: settings.loop_playback,
                projection: settings.projection,
            },
        )?;
        export.add("networked", &NetworkedExport { id: self.id })?;
        Ok(export)
    }

    fn dispose(&self) {
        self.loader.dispose();
    }
}

impl Drop for TimeCapsuleNode {
    fn drop(&mut self) {
        self.loader.invalidate();
    }
}
