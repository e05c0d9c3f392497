//! Load State Machine Tests
//!
//! Tests for:
//! - Same-value requests: no network round trip
//! - Supersession: only the newest request commits, in any completion order
//! - Failure: one error issue, error affordance, previous value kept
//! - Success: affordances cleared, one notification per load
//! - Timeout, dispose and drop behaviour

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Fixture, drain, until};
use myth_editor::errors::LoadFailure;
use myth_editor::issues::Severity;
use myth_editor::media::Texture;
use myth_editor::{
    Affordances, EarthGlobeNode, EditorConfig, EditorEvent, EditorNode, ErrorCallback, LoadOutcome,
    LoadPhase, MediaLoadError, NodeId,
};
use parking_lot::Mutex;

fn texture_label(media: Option<&Arc<myth_editor::DecodedMedia>>) -> Option<String> {
    media
        .and_then(|m| m.as_texture())
        .map(|t: &Texture| t.label.clone())
}

// ============================================================================
// Same-value requests
// ============================================================================

#[tokio::test]
async fn same_committed_value_does_not_fetch_again() {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);

    let outcome = node.load_textures("a.jpg", "bump.jpg", None).await;
    assert!(outcome.is_committed());
    assert_eq!(fx.resolver.calls().len(), 2);

    let outcome = node.load_textures("a.jpg", "bump.jpg", None).await;
    assert!(matches!(outcome, LoadOutcome::Unchanged));

    node.set_globe_texture("a.jpg");
    node.set_bump_map("bump.jpg");
    fx.editor.loads().settled().await;

    assert_eq!(fx.resolver.calls().len(), 2);
    assert_eq!(fx.cache.requests().len(), 2);
    assert_eq!(node.phase(), LoadPhase::Ready);
}

#[tokio::test]
async fn empty_values_load_without_network() {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);

    let outcome = node.load_textures("", "", None).await;

    assert!(outcome.is_committed());
    assert!(fx.resolver.calls().is_empty());
    assert_eq!(node.phase(), LoadPhase::Ready);
    assert!(node.material().map.is_none());
}

// ============================================================================
// Supersession
// ============================================================================

#[tokio::test]
async fn last_request_wins_when_results_arrive_in_reverse() {
    let fx = Fixture::new();
    let gate_a = fx.resolver.gate("a.jpg");
    let gate_b = fx.resolver.gate("b.jpg");
    let node = EarthGlobeNode::new(&fx.editor);

    node.set_globe_texture("a.jpg");
    node.set_globe_texture("b.jpg");
    until(|| fx.resolver.calls().len() == 2).await;
    assert_eq!(node.phase(), LoadPhase::Loading);
    assert!(node.affordances().contains(Affordances::LOADING));

    gate_b.add_permits(1);
    until(|| node.phase() == LoadPhase::Ready).await;
    assert_eq!(node.globe_texture(), "b.jpg");

    gate_a.add_permits(1);
    fx.editor.loads().settled().await;

    assert_eq!(node.globe_texture(), "b.jpg");
    assert_eq!(texture_label(node.material().map.as_ref()).as_deref(), Some("b.jpg"));
    assert_eq!(node.phase(), LoadPhase::Ready);
    assert!(node.affordances().is_empty());
}

#[tokio::test]
async fn last_request_wins_when_results_arrive_in_order() {
    let fx = Fixture::new();
    let gate_a = fx.resolver.gate("a.jpg");
    let gate_b = fx.resolver.gate("b.jpg");
    let node = EarthGlobeNode::new(&fx.editor);
    let events = fx.editor.events().subscribe();

    node.set_globe_texture("a.jpg");
    node.set_globe_texture("b.jpg");
    until(|| fx.resolver.calls().len() == 2).await;

    gate_a.add_permits(1);
    gate_b.add_permits(1);
    fx.editor.loads().settled().await;

    assert_eq!(node.globe_texture(), "b.jpg");
    assert_eq!(texture_label(node.material().map.as_ref()).as_deref(), Some("b.jpg"));
    // The stale result never notifies.
    assert_eq!(
        drain(&events),
        vec![
            EditorEvent::ObjectsChanged(vec![node.id()]),
            EditorEvent::SelectionChanged
        ]
    );
}

#[tokio::test]
async fn returning_to_committed_value_cancels_pending_load() {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);
    assert!(node.load_textures("a.jpg", "", None).await.is_committed());

    let gate_b = fx.resolver.gate("b.jpg");
    node.set_globe_texture("b.jpg");
    until(|| node.phase() == LoadPhase::Loading).await;

    node.set_globe_texture("a.jpg");
    until(|| node.phase() == LoadPhase::Ready).await;

    gate_b.add_permits(1);
    fx.editor.loads().settled().await;

    assert_eq!(node.globe_texture(), "a.jpg");
    assert_eq!(texture_label(node.material().map.as_ref()).as_deref(), Some("a.jpg"));
    assert_eq!(fx.resolver.call_count("a.jpg"), 1);
    assert!(node.affordances().is_empty());
}

#[tokio::test]
async fn setters_keep_the_other_slots_pending_value() {
    let fx = Fixture::new();
    let gate = fx.resolver.gate("earth.jpg");
    let node = EarthGlobeNode::new(&fx.editor);

    node.set_globe_texture("earth.jpg");
    node.set_bump_map("bump.jpg");
    until(|| fx.resolver.call_count("earth.jpg") == 2).await;

    gate.add_permits(2);
    fx.editor.loads().settled().await;

    assert_eq!(node.globe_texture(), "earth.jpg");
    assert_eq!(node.bump_map(), "bump.jpg");
    let material = node.material();
    assert_eq!(texture_label(material.map.as_ref()).as_deref(), Some("earth.jpg"));
    assert_eq!(texture_label(material.bump_map.as_ref()).as_deref(), Some("bump.jpg"));
}

// ============================================================================
// Failure
// ============================================================================

#[tokio::test]
async fn failed_load_reports_once_and_keeps_committed_value() {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);
    assert!(node.load_textures("a.jpg", "", None).await.is_committed());

    let reported: Arc<Mutex<Vec<(NodeId, String)>>> = Arc::default();
    let sink = Arc::clone(&reported);
    let on_error: ErrorCallback = Arc::new(move |id: NodeId, err: &MediaLoadError| {
        sink.lock().push((id, err.to_string()));
    });

    fx.resolver.fail("missing.jpg");
    let events = fx.editor.events().subscribe();
    let outcome = node.load_textures("missing.jpg", "", Some(on_error)).await;

    let LoadOutcome::Failed(err) = outcome else {
        panic!("expected a failed load");
    };
    assert!(matches!(err.cause, LoadFailure::Resolution(_)));
    assert_eq!(err.message, "Error loading image textures");

    let issues = node.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Error);
    assert_eq!(issues[0].message, "Error loading image.");

    assert_eq!(node.phase(), LoadPhase::Failed);
    assert_eq!(node.affordances(), Affordances::ERROR);
    assert_eq!(node.globe_texture(), "a.jpg");
    assert_eq!(texture_label(node.material().map.as_ref()).as_deref(), Some("a.jpg"));

    assert_eq!(
        reported.lock().as_slice(),
        &[(node.id(), "Error loading image textures".to_string())]
    );
    assert_eq!(drain(&events).len(), 2);
}

#[tokio::test]
async fn retry_after_failure_commits() {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);

    fx.resolver.fail("flaky.jpg");
    node.set_globe_texture("flaky.jpg");
    fx.editor.loads().settled().await;
    assert_eq!(node.phase(), LoadPhase::Failed);
    assert_eq!(node.globe_texture(), "");

    fx.resolver.recover("flaky.jpg");
    node.set_globe_texture("flaky.jpg");
    fx.editor.loads().settled().await;

    assert_eq!(node.phase(), LoadPhase::Ready);
    assert_eq!(node.globe_texture(), "flaky.jpg");
    assert!(node.issues().is_empty());
    assert!(node.affordances().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_load_times_out() {
    let fx = Fixture::with_config(EditorConfig::default().with_load_timeout(Duration::from_secs(5)));
    let _gate = fx.resolver.gate("slow.jpg");
    let node = EarthGlobeNode::new(&fx.editor);

    let outcome = node.load_textures("slow.jpg", "", None).await;

    let LoadOutcome::Failed(err) = outcome else {
        panic!("expected a timeout");
    };
    assert!(matches!(err.cause, LoadFailure::Timeout(d) if d == Duration::from_secs(5)));
    assert_eq!(node.phase(), LoadPhase::Failed);
    assert!(!node.affordances().contains(Affordances::LOADING));
}

#[tokio::test(start_paused = true)]
async fn abandoned_load_still_settles() {
    let fx = Fixture::new();
    let gate = fx.resolver.gate("a.jpg");
    let node = EarthGlobeNode::new(&fx.editor);

    let waited = tokio::time::timeout(
        Duration::from_millis(20),
        node.load_textures("a.jpg", "", None),
    )
    .await;
    assert!(waited.is_err());
    assert_eq!(node.phase(), LoadPhase::Loading);

    gate.add_permits(1);
    fx.editor.loads().settled().await;

    assert_eq!(node.phase(), LoadPhase::Ready);
    assert!(node.affordances().is_empty());
    assert_eq!(node.globe_texture(), "a.jpg");
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn multi_slot_load_notifies_once() {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);
    let events = fx.editor.events().subscribe();

    assert!(node.load_textures("earth.jpg", "bump.jpg", None).await.is_committed());

    assert_eq!(
        drain(&events),
        vec![
            EditorEvent::ObjectsChanged(vec![node.id()]),
            EditorEvent::SelectionChanged
        ]
    );
    assert!(node.affordances().is_empty());
    assert!(node.issues().is_empty());
    assert_eq!(
        node.attribution().and_then(|m| m.name).as_deref(),
        Some("earth.jpg")
    );
}

#[tokio::test]
async fn large_files_raise_a_warning() {
    let fx = Fixture::new();
    fx.cache.set_byte_size(3 * 1024 * 1024);
    let node = EarthGlobeNode::new(&fx.editor);

    assert!(node.load_textures("huge.jpg", "", None).await.is_committed());

    let issues = node.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Warning);
    assert!(issues[0].message.starts_with("Large image file (3.0 MB)"));
}

// ============================================================================
// Dispose / drop
// ============================================================================

#[tokio::test]
async fn dispose_releases_resources_and_keeps_values() {
    let fx = Fixture::new();
    let node = EarthGlobeNode::new(&fx.editor);
    assert!(node.load_textures("a.jpg", "b.jpg", None).await.is_committed());

    node.dispose();

    assert_eq!(node.phase(), LoadPhase::Idle);
    assert_eq!(node.globe_texture(), "a.jpg");
    assert!(node.material().map.is_none());
    assert!(node.material().bump_map.is_none());
}

#[tokio::test]
async fn dropped_node_ignores_late_results() {
    let fx = Fixture::new();
    let gate = fx.resolver.gate("late.jpg");
    let node = EarthGlobeNode::new(&fx.editor);
    let events = fx.editor.events().subscribe();

    node.set_globe_texture("late.jpg");
    until(|| fx.resolver.call_count("late.jpg") == 1).await;
    drop(node);

    gate.add_permits(1);
    fx.editor.loads().settled().await;

    assert!(drain(&events).is_empty());
}
