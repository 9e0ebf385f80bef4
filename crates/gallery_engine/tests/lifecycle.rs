//! End-to-end scene transitions against the headless backend

use gallery_engine::analytics::{AnalyticsEvent, MemoryAnalytics};
use gallery_engine::content::{ContentSnapshot, MediaItem, MediaKind, Portfolio, Room};
use gallery_engine::core::config::{BindConfig, GalleryConfig};
use gallery_engine::render::{
    CreationPath, ElementRole, EntityHandle, HeadlessBackend, HeadlessConfig, InteractAction, TextMechanism,
};
use gallery_engine::scene::{EntityRole, LoadOutcome, SceneContext, SceneDescriptor, SceneLifecycleManager};
use gallery_engine::TransitionError;

const FRAME: f32 = 1.0 / 60.0;

type Manager = SceneLifecycleManager<HeadlessBackend>;

fn image(id: &str) -> MediaItem {
    MediaItem::new(id, MediaKind::Image, format!("https://cdn.example.com/{}.jpg", id))
}

fn video(id: &str) -> MediaItem {
    MediaItem::new(id, MediaKind::Video, format!("https://cdn.example.com/{}.mp4", id))
}

fn context() -> SceneContext {
    let rooms = vec![
        Room::new("lobby", "Lobby", 0).with_media(vec![image("welcome"), video("reel")]),
        Room::new("print", "Print", 1).with_media(vec![image("poster"), image("book")]),
        Room::new("motion", "Motion", 2).with_media(vec![video("titles")]),
        Room::new("archive", "Archive", 3),
    ];
    SceneContext::new(ContentSnapshot::new(Portfolio::new("demo", "Demo", "gallery"), rooms))
}

fn manager(backend: HeadlessBackend) -> Manager {
    SceneLifecycleManager::new(backend, &GalleryConfig::default())
}

/// Run frames until no transition holds the lock
fn settle(manager: &mut Manager) {
    for _ in 0..600 {
        manager.update(FRAME);
        if !manager.is_loading() {
            return;
        }
    }
    panic!("manager did not settle");
}

fn active(manager: &Manager) -> Option<SceneDescriptor> {
    manager.active_scene().map(|scene| scene.descriptor().clone())
}

fn navigation_handle(manager: &Manager, target: &SceneDescriptor) -> Option<EntityHandle> {
    manager.active_scene()?.entities().iter().find_map(|entity| match &entity.role {
        EntityRole::Navigation { target: t } if t == target => Some(entity.handle),
        _ => None,
    })
}

/// Trigger the navigation entity for `target` and let the transition finish
fn click_through(manager: &mut Manager, target: &SceneDescriptor) {
    let handle = navigation_handle(manager, target).expect("navigation entity");
    assert_eq!(manager.backend_mut().simulate_interaction(handle, ElementRole::Interact), 1);
    manager.update(FRAME);
    settle(manager);
}

#[test]
fn test_second_load_is_dropped_while_building() {
    let mut manager = manager(HeadlessBackend::default());

    assert_eq!(manager.load_scene(SceneDescriptor::Hub, context()), LoadOutcome::Started);
    assert!(manager.is_loading());
    assert_eq!(
        manager.load_scene(SceneDescriptor::room("print"), context()),
        LoadOutcome::Dropped
    );

    settle(&mut manager);
    assert_eq!(active(&manager), Some(SceneDescriptor::Hub));
    assert_eq!(manager.last_outcome(), Some(LoadOutcome::Dropped));
}

#[test]
fn test_load_is_dropped_while_creation_is_deferred() {
    let mut manager = manager(HeadlessBackend::immediate());
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    assert_eq!(
        manager.load_scene(SceneDescriptor::room("print"), context()),
        LoadOutcome::Deferred
    );
    assert_eq!(
        manager.load_scene(SceneDescriptor::room("motion"), context()),
        LoadOutcome::Dropped
    );

    settle(&mut manager);
    assert_eq!(active(&manager), Some(SceneDescriptor::room("print")));
}

#[test]
fn test_new_scene_created_on_frame_after_removal() {
    let mut manager = manager(HeadlessBackend::immediate());
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    let created_before = manager.backend().creation_log().len();
    let removal_frame = manager.backend().frame();

    assert_eq!(
        manager.load_scene(SceneDescriptor::room("print"), context()),
        LoadOutcome::Deferred
    );
    assert!(active(&manager).is_none());
    assert_eq!(manager.backend().attached_count(), 0);
    assert!(manager
        .backend()
        .removal_log()
        .iter()
        .all(|(_, frame)| *frame == removal_frame));
    assert_eq!(manager.backend().creation_log().len(), created_before);

    manager.update(FRAME);
    let created = &manager.backend().creation_log()[created_before..];
    assert!(!created.is_empty());
    assert!(created.iter().all(|(_, frame)| *frame == removal_frame + 1));
}

#[test]
fn test_one_handler_per_interactive_element() {
    let mut manager = manager(HeadlessBackend::new(HeadlessConfig::default()));
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    click_through(&mut manager, &SceneDescriptor::room("print"));
    click_through(&mut manager, &SceneDescriptor::Hub);

    let scene = manager.active_scene().expect("hub");
    assert_eq!(scene.entities().len(), 5);
    for entity in scene.entities() {
        let document = manager.backend().document(entity.handle).expect("document");
        assert_eq!(document.handler_count(ElementRole::Interact), 1, "entity {}", entity.id);
    }
}

#[test]
fn test_empty_room_redirects_to_hub() {
    let mut manager = manager(HeadlessBackend::immediate());
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    click_through(&mut manager, &SceneDescriptor::room("archive"));

    assert_eq!(active(&manager), Some(SceneDescriptor::Hub));
    assert!(manager.last_error().is_none());
    assert_eq!(manager.active_scene().map(|s| s.entities().len()), Some(5));
}

#[test]
fn test_rooms_link_directly_to_each_other() {
    let mut manager = manager(HeadlessBackend::immediate());
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    click_through(&mut manager, &SceneDescriptor::room("print"));
    click_through(&mut manager, &SceneDescriptor::room("motion"));
    assert_eq!(active(&manager), Some(SceneDescriptor::room("motion")));

    let edges: Vec<SceneDescriptor> = manager
        .active_scene()
        .map(|scene| scene.edges().iter().map(|e| e.target.clone()).collect())
        .unwrap_or_default();
    assert_eq!(edges[0], SceneDescriptor::Hub);
    assert!(edges.contains(&SceneDescriptor::room("print")));
}

#[test]
fn test_stalled_panel_uses_fallback() {
    let mut backend = HeadlessBackend::new(HeadlessConfig::default());
    backend.stall_transform_for("panel-lobby-1");
    let mut manager = manager(backend);

    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    let scene = manager.active_scene().expect("hub");
    assert_eq!(scene.diagnostics().provision_failures, 0);
    let entity = scene
        .entities()
        .iter()
        .find(|entity| entity.id == "panel-lobby-1")
        .expect("fallback entity");
    let state = manager.backend().entity(entity.handle).expect("alive");
    assert_eq!(state.path, CreationPath::Direct);
    assert!(state.visible);
    assert_eq!(scene.entities()[1].id, "panel-lobby-1");
}

#[test]
fn test_bind_exhaustion_keeps_scene_usable() {
    let backend = HeadlessBackend::new(HeadlessConfig {
        text_mechanisms: vec![TextMechanism::Alternate],
        unverified_text_mechanisms: vec![TextMechanism::Alternate],
        ..HeadlessConfig::immediate()
    });
    let config = GalleryConfig {
        bind: BindConfig {
            max_attempts: 4,
            ..BindConfig::default()
        },
        ..GalleryConfig::default()
    };
    let mut manager = SceneLifecycleManager::new(backend, &config);

    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    let scene = manager.active_scene().expect("hub");
    assert!(manager.last_error().is_none());
    assert_eq!(scene.diagnostics().bind_failures, 0);
    assert!(scene.diagnostics().text_warnings >= scene.entities().len());

    click_through(&mut manager, &SceneDescriptor::room("motion"));
    assert_eq!(active(&manager), Some(SceneDescriptor::room("motion")));
}

#[test]
fn test_failed_transition_releases_lock() {
    let mut manager = manager(HeadlessBackend::immediate());
    let empty = SceneContext::new(ContentSnapshot::new(Portfolio::new("empty", "Empty", "gallery"), Vec::new()));

    assert_eq!(manager.load_scene(SceneDescriptor::Hub, empty), LoadOutcome::Started);
    assert!(!manager.is_loading());
    assert!(active(&manager).is_none());
    assert!(matches!(manager.last_error(), Some(TransitionError::Build { .. })));

    assert_eq!(manager.load_scene(SceneDescriptor::Hub, context()), LoadOutcome::Started);
    settle(&mut manager);
    assert_eq!(active(&manager), Some(SceneDescriptor::Hub));
}

#[test]
fn test_room_without_route_back_returns_to_hub() {
    let mut backend = HeadlessBackend::immediate();
    backend.reject_primary_for("nav-room:print-hub");
    backend.fail_direct_for("nav-room:print-hub");
    let mut manager = manager(backend);
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    click_through(&mut manager, &SceneDescriptor::room("print"));

    assert_eq!(active(&manager), Some(SceneDescriptor::Hub));
    assert!(manager.last_error().is_none());
    let hub_entities = manager.active_scene().map_or(0, |scene| scene.entities().len());
    assert_eq!(hub_entities, 5);
    assert_eq!(manager.backend().live_count(), hub_entities);
}

#[test]
fn test_interaction_from_disposed_scene_is_ignored() {
    let mut manager = manager(HeadlessBackend::immediate());
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    let welcome = manager
        .active_scene()
        .and_then(|scene| scene.entities().iter().find(|e| e.id == "panel-lobby-0"))
        .map(|e| e.handle)
        .expect("welcome panel");
    assert_eq!(manager.backend_mut().simulate_interaction(welcome, ElementRole::Interact), 1);

    assert_eq!(
        manager.load_scene(SceneDescriptor::room("print"), context()),
        LoadOutcome::Deferred
    );
    settle(&mut manager);

    assert!(manager.backend().popups().is_empty());
    assert_eq!(active(&manager), Some(SceneDescriptor::room("print")));
}

#[test]
fn test_media_interaction_opens_popup() {
    let recorder = MemoryAnalytics::new();
    let mut manager = manager(HeadlessBackend::immediate()).with_analytics(Box::new(recorder.clone()));
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);

    let reel = manager
        .active_scene()
        .and_then(|scene| scene.entities().iter().find(|e| e.id == "panel-lobby-1"))
        .map(|e| e.handle)
        .expect("reel panel");

    let action = manager
        .backend()
        .document(reel)
        .and_then(|document| document.element(ElementRole::Interact))
        .and_then(|element| element.handlers.first().cloned());
    assert!(matches!(action, Some(InteractAction::OpenMedia { kind: MediaKind::Video, .. })));

    manager.backend_mut().simulate_interaction(reel, ElementRole::Interact);
    manager.update(FRAME);

    assert_eq!(manager.backend().popups().len(), 1);
    assert_eq!(manager.backend().popups()[0].source, "https://cdn.example.com/reel.mp4");
    assert!(recorder
        .events()
        .iter()
        .any(|event| matches!(event, AnalyticsEvent::MediaOpened { kind: MediaKind::Video, .. })));
    assert_eq!(active(&manager), Some(SceneDescriptor::Hub));
}

#[test]
fn test_shutdown_releases_everything_once() {
    let mut manager = manager(HeadlessBackend::immediate());
    manager.load_scene(SceneDescriptor::Hub, context());
    settle(&mut manager);
    assert!(manager.backend().live_count() > 0);

    manager.shutdown();
    let released = manager.backend().released_count();
    assert_eq!(manager.backend().live_count(), 0);
    assert_eq!(manager.provisioner().live_count(), 0);

    manager.shutdown();
    assert_eq!(manager.backend().released_count(), released);
}
