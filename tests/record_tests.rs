//! Record Tests
//!
//! Tests for:
//! - serialize → deserialize round trip of committed values
//! - record JSON layout (`{ name, props }` components)
//! - pending values are never persisted
//! - playback settings reset after deserialization

mod common;

use common::Fixture;
use myth_editor::nodes::time_capsule::{Projection, VideoSettings};
use myth_editor::nodes::{AudioType, TimeCapsuleNode};
use myth_editor::record::NodeRecord;
use myth_editor::{EarthGlobeNode, EditorNode, Error, LoadPhase, LoadTracker, NodeId, SceneRecord};
use serde_json::json;

// ============================================================================
// Round trip
// ============================================================================

#[tokio::test]
async fn globe_round_trip_keeps_committed_values() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let mut node = EarthGlobeNode::new(&fx.editor);
    node.set_json_url("globe.json");
    assert!(node.load_textures("earth.jpg", "bump.jpg", None).await.is_committed());

    let record = node.serialize()?;
    let tracker = LoadTracker::new();
    let restored = EarthGlobeNode::deserialize(&fx.editor, &record, &tracker, None)?;

    // Plain fields are applied before the load finishes.
    assert_eq!(restored.id(), node.id());
    assert_eq!(restored.json_url(), "globe.json");

    tracker.settled().await;

    assert_eq!(restored.phase(), LoadPhase::Ready);
    assert_eq!(restored.globe_texture(), node.globe_texture());
    assert_eq!(restored.bump_map(), node.bump_map());
    assert_eq!(restored.serialize()?, record);
    Ok(())
}

#[tokio::test]
async fn time_capsule_round_trip_keeps_audio_and_resets_playback() -> anyhow::Result<()> {
    let fx = Fixture::new();
    TimeCapsuleNode::load_models(&fx.editor).await?;
    let mut node = TimeCapsuleNode::new(&fx.editor)?;
    node.set_json_url("capsule.json");
    node.audio_mut().audio_type = AudioType::Stereo;
    node.audio_mut().set_volume(0.25);
    assert!(node.load("clip.mp4", None).await.is_committed());

    let record = node.serialize()?;
    let tracker = LoadTracker::new();
    let restored = TimeCapsuleNode::deserialize(&fx.editor, &record, &tracker, None)?;
    restored.set_video_settings(VideoSettings {
        controls: true,
        auto_play: true,
        loop_playback: true,
        projection: Projection::Equirectangular360,
    });
    tracker.settled().await;

    assert_eq!(restored.src(), "clip.mp4");
    assert_eq!(restored.json_url(), "capsule.json");
    assert_eq!(restored.audio(), node.audio());
    assert_eq!(restored.video_settings(), VideoSettings::default());
    assert_eq!(restored.serialize()?, record);
    Ok(())
}

#[tokio::test]
async fn pending_values_are_not_persisted() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);
    assert!(node.load_textures("earth.jpg", "", None).await.is_committed());

    let _gate = fx.resolver.gate("next.jpg");
    node.set_globe_texture("next.jpg");
    assert_eq!(node.phase(), LoadPhase::Loading);

    let record = node.serialize()?;
    let props = &record.require("earth-globe")?.props;
    assert_eq!(props["globeTexture"], json!("earth.jpg"));
    Ok(())
}

#[tokio::test]
async fn failed_load_does_not_persist_unreachable_source() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);
    assert!(node.load_textures("earth.jpg", "", None).await.is_committed());

    fx.resolver.fail("broken.jpg");
    node.set_globe_texture("broken.jpg");
    fx.editor.loads().settled().await;

    let record = node.serialize()?;
    let props = &record.require("earth-globe")?.props;
    assert_eq!(props["globeTexture"], json!("earth.jpg"));
    Ok(())
}

// ============================================================================
// Layout
// ============================================================================

#[tokio::test]
async fn node_record_json_layout() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let mut node = EarthGlobeNode::new(&fx.editor);
    node.set_name("Globe".into());
    assert!(node.load_textures("a.jpg", "", None).await.is_committed());

    let value = serde_json::to_value(node.serialize()?)?;

    assert_eq!(
        value,
        json!({
            "id": node.id().to_string(),
            "name": "Globe",
            "components": [
                { "name": "earth-globe", "props": { "globeTexture": "a.jpg", "bumpMap": "", "jsonUrl": "" } }
            ]
        })
    );
    Ok(())
}

#[test]
fn scene_record_json_round_trip() -> anyhow::Result<()> {
    let mut node = NodeRecord::new(NodeId::new(), "Capsule");
    node.push("time-capsule", &json!({ "src": "clip.mp4", "jsonUrl": "" }))?;
    let scene = SceneRecord {
        nodes: vec![node],
        ..SceneRecord::default()
    };

    let parsed = SceneRecord::from_json(&scene.to_json()?)?;
    assert_eq!(parsed, scene);
    assert_eq!(parsed.version, 1);
    Ok(())
}

#[tokio::test]
async fn deserialize_requires_own_component() {
    let fx = Fixture::new();
    let record = NodeRecord::new(NodeId::new(), "Empty");
    let tracker = LoadTracker::new();

    let err = EarthGlobeNode::deserialize(&fx.editor, &record, &tracker, None).err().unwrap();
    assert!(matches!(err, Error::MissingComponent(name) if name == "earth-globe"));
}

#[tokio::test]
async fn missing_props_fall_back_to_defaults() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let mut record = NodeRecord::new(NodeId::new(), "Sparse");
    record.push("earth-globe", &json!({ "jsonUrl": "x.json" }))?;
    let tracker = LoadTracker::new();

    let node = EarthGlobeNode::deserialize(&fx.editor, &record, &tracker, None)?;
    tracker.settled().await;

    assert_eq!(node.json_url(), "x.json");
    assert_eq!(node.globe_texture(), "");
    assert!(fx.resolver.calls().is_empty());
    Ok(())
}
