//! Scene Lifecycle Manager
//!
//! Owns the single active scene and serializes transitions between scenes.
//! A transition holds a lock from the moment it is requested until the new
//! scene has finished building (or failed); requests arriving meanwhile are
//! dropped, never queued.
//!
//! Replacing a scene happens in two steps: the old scene is disposed
//! synchronously inside [`SceneLifecycleManager::load_scene`], and the new one
//! is created at the next frame boundary in [`SceneLifecycleManager::update`].

use super::binder::ContentBinder;
use super::navigation::{SceneContext, SceneDescriptor};
use super::provisioner::EntityProvisioner;
use super::scene::{BuildStep, Scene, SceneServices};
use crate::analytics::{track, AnalyticsEvent, AnalyticsSink, NullAnalytics};
use crate::core::config::{GalleryConfig, SceneConfig};
use crate::error::TransitionError;
use crate::layout::TemplateRegistry;
use crate::render::{EntityHandle, InteractAction, Popup, RenderBackend};
use std::time::Duration;

/// What [`SceneLifecycleManager::load_scene`] did with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No scene was active; the new scene started building immediately
    Started,
    /// The active scene was disposed; the new scene is created next frame
    Deferred,
    /// A transition was already in flight; the request was ignored
    Dropped,
}

/// Transition lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// No transition in flight
    Idle,
    /// A transition holds the lock
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Transition {
    Pending(SceneDescriptor),
    Building,
}

/// Drives scenes against a rendering backend
pub struct SceneLifecycleManager<B: RenderBackend> {
    backend: B,
    provisioner: EntityProvisioner,
    binder: ContentBinder,
    templates: TemplateRegistry,
    scene_config: SceneConfig,
    analytics: Box<dyn AnalyticsSink>,
    context: Option<SceneContext>,
    active: Option<Scene>,
    transition: Option<Transition>,
    last_outcome: Option<LoadOutcome>,
    last_error: Option<TransitionError>,
    session: Option<Duration>,
    scene_entered: Option<Duration>,
}

impl<B: RenderBackend> SceneLifecycleManager<B> {
    /// Create a manager with the given configuration
    pub fn new(backend: B, config: &GalleryConfig) -> Self {
        let mut templates = TemplateRegistry::new();
        for template in &config.templates {
            templates.register(template.clone());
        }
        templates.set_default(&config.scene.default_template);

        Self {
            backend,
            provisioner: EntityProvisioner::new(config.provision.clone(), config.scene.focal_point),
            binder: ContentBinder::new(config.bind.clone()),
            templates,
            scene_config: config.scene.clone(),
            analytics: Box::new(NullAnalytics),
            context: None,
            active: None,
            transition: None,
            last_outcome: None,
            last_error: None,
            session: None,
            scene_entered: None,
        }
    }

    /// Report events to the given sink
    pub fn with_analytics(mut self, sink: Box<dyn AnalyticsSink>) -> Self {
        self.analytics = sink;
        self
    }

    /// Request a transition to `descriptor`
    pub fn load_scene(&mut self, descriptor: SceneDescriptor, context: SceneContext) -> LoadOutcome {
        let outcome = if self.transition.is_some() {
            log::debug!("Transition in flight, dropping request for '{}'", descriptor);
            LoadOutcome::Dropped
        } else {
            self.begin_session(&context);
            self.context = Some(context);

            match self.active.take() {
                Some(mut previous) => {
                    log::info!("Leaving scene '{}' for '{}'", previous.descriptor(), descriptor);
                    previous.dispose(&mut self.backend, &mut self.provisioner);
                    self.report_exit(previous.descriptor());
                    self.transition = Some(Transition::Pending(descriptor));
                    LoadOutcome::Deferred
                }
                None => {
                    self.start(descriptor);
                    LoadOutcome::Started
                }
            }
        };

        self.last_outcome = Some(outcome);
        outcome
    }

    /// Advance the manager by one frame
    ///
    /// Order: backend frame, pending scene creation or build progress, then
    /// interactions. A navigation routed here is created on the next call.
    pub fn update(&mut self, delta_time: f32) {
        self.backend.advance_frame(delta_time);
        if let (Some(session), Ok(delta)) = (self.session.as_mut(), Duration::try_from_secs_f32(delta_time)) {
            *session = session.saturating_add(delta);
        }

        match self.transition.take() {
            Some(Transition::Pending(descriptor)) => self.start(descriptor),
            Some(Transition::Building) => self.advance_build(delta_time),
            None => {}
        }

        self.route_interactions();
    }

    /// Dispose the active scene and close the session
    pub fn shutdown(&mut self) {
        if let Some(mut scene) = self.active.take() {
            scene.dispose(&mut self.backend, &mut self.provisioner);
            self.report_exit(scene.descriptor());
        }
        self.transition = None;

        if let (Some(duration), Some(context)) = (self.session.take(), self.context.as_ref()) {
            let portfolio = context.snapshot().portfolio.id.clone();
            track(self.analytics.as_mut(), AnalyticsEvent::SessionEnd { portfolio, duration });
        }
    }

    /// Lock state
    pub fn state(&self) -> ManagerState {
        if self.transition.is_some() {
            ManagerState::Loading
        } else {
            ManagerState::Idle
        }
    }

    /// True while a transition holds the lock
    pub fn is_loading(&self) -> bool {
        self.state() == ManagerState::Loading
    }

    /// The active scene (possibly still building)
    pub fn active_scene(&self) -> Option<&Scene> {
        self.active.as_ref()
    }

    /// Content of the last load request
    pub fn context(&self) -> Option<&SceneContext> {
        self.context.as_ref()
    }

    /// Rendering backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Rendering backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Entity provisioner
    pub fn provisioner(&self) -> &EntityProvisioner {
        &self.provisioner
    }

    /// Template registry
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Outcome of the most recent load request
    pub fn last_outcome(&self) -> Option<LoadOutcome> {
        self.last_outcome
    }

    /// Most recent failed transition
    pub fn last_error(&self) -> Option<&TransitionError> {
        self.last_error.as_ref()
    }

    fn begin_session(&mut self, context: &SceneContext) {
        if self.session.is_none() {
            self.session = Some(Duration::ZERO);
            let portfolio = context.snapshot().portfolio.id.clone();
            track(self.analytics.as_mut(), AnalyticsEvent::SessionStart { portfolio });
        }
    }

    fn report_exit(&mut self, scene: &SceneDescriptor) {
        if let (Some(entered), Some(now)) = (self.scene_entered.take(), self.session) {
            let event = AnalyticsEvent::SceneExited {
                scene: scene.clone(),
                duration: now.saturating_sub(entered),
            };
            track(self.analytics.as_mut(), event);
        }
    }

    /// True if `handle` belongs to the active scene and is still provisioned
    fn owns_entity(&self, handle: EntityHandle) -> bool {
        self.provisioner.is_tracked(handle)
            && self
                .active
                .as_ref()
                .is_some_and(|scene| scene.entities().iter().any(|entity| entity.handle == handle))
    }

    fn start(&mut self, descriptor: SceneDescriptor) {
        let Some(context) = self.context.clone() else {
            log::warn!("No content loaded, cannot build scene '{}'", descriptor);
            return;
        };

        let mut scene = Scene::for_descriptor(&descriptor);
        let result = {
            let mut services = SceneServices {
                backend: &mut self.backend,
                provisioner: &mut self.provisioner,
                binder: &self.binder,
                templates: &self.templates,
                config: &self.scene_config,
            };
            scene.build(&context, &mut services)
        };
        self.settle(scene, result);
    }

    fn advance_build(&mut self, delta_time: f32) {
        let Some(mut scene) = self.active.take() else {
            return;
        };

        let result = {
            let mut services = SceneServices {
                backend: &mut self.backend,
                provisioner: &mut self.provisioner,
                binder: &self.binder,
                templates: &self.templates,
                config: &self.scene_config,
            };
            scene.update(&mut services, delta_time)
        };
        self.settle(scene, result);
    }

    /// Apply a build result; the lock is held only while the build continues
    fn settle(&mut self, mut scene: Scene, result: Result<BuildStep, TransitionError>) {
        match result {
            Ok(BuildStep::InProgress) => {
                self.active = Some(scene);
                self.transition = Some(Transition::Building);
            }
            Ok(BuildStep::Complete) => {
                let descriptor = scene.descriptor().clone();
                self.active = Some(scene);
                self.transition = None;
                self.scene_entered = self.session;
                track(self.analytics.as_mut(), AnalyticsEvent::SceneReady { scene: descriptor });
            }
            Ok(BuildStep::Redirect(target)) => {
                scene.dispose(&mut self.backend, &mut self.provisioner);
                self.transition = None;
                if let Some(context) = self.context.clone() {
                    log::info!("Scene '{}' redirected to '{}'", scene.descriptor(), target);
                    self.load_scene(target, context);
                }
            }
            Err(e) => {
                log::error!("Scene transition failed: {}", e);
                scene.dispose(&mut self.backend, &mut self.provisioner);
                self.transition = None;
                self.last_error = Some(e);
            }
        }
    }

    fn route_interactions(&mut self) {
        for event in self.backend.drain_interactions() {
            if !self.owns_entity(event.handle) {
                log::debug!("Ignoring interaction on entity no longer in the active scene");
                continue;
            }
            match event.action {
                InteractAction::Navigate(target) => match self.context.clone() {
                    Some(context) => {
                        self.load_scene(target, context);
                    }
                    None => log::warn!("Navigation to '{}' before any content was loaded", target),
                },
                InteractAction::OpenMedia { source, kind } => {
                    self.backend.open_popup(Popup {
                        source: source.clone(),
                        kind,
                    });
                    track(self.analytics.as_mut(), AnalyticsEvent::MediaOpened { source, kind });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MemoryAnalytics;
    use crate::content::{ContentSnapshot, MediaItem, MediaKind, Portfolio, Room};
    use crate::render::HeadlessBackend;

    const FRAME: f32 = 1.0 / 60.0;

    fn context() -> SceneContext {
        let rooms = vec![
            Room::new("hub", "Lobby", 0).with_media(vec![MediaItem::new("h0", MediaKind::Image, "h0.png")]),
            Room::new("r1", "One", 1).with_media(vec![MediaItem::new("m1", MediaKind::Image, "m1.png")]),
        ];
        SceneContext::new(ContentSnapshot::new(Portfolio::new("p", "P", "gallery"), rooms))
    }

    fn settle<B: RenderBackend>(manager: &mut SceneLifecycleManager<B>) {
        for _ in 0..50 {
            manager.update(FRAME);
            if !manager.is_loading() {
                return;
            }
        }
    }

    #[test]
    fn test_first_load_starts_immediately() {
        let mut manager = SceneLifecycleManager::new(HeadlessBackend::immediate(), &GalleryConfig::default());
        assert_eq!(manager.load_scene(SceneDescriptor::Hub, context()), LoadOutcome::Started);
        assert!(manager.is_loading());
        assert!(manager.active_scene().is_some());

        settle(&mut manager);
        assert_eq!(manager.state(), ManagerState::Idle);
    }

    #[test]
    fn test_replacing_scene_defers_creation() {
        let mut manager = SceneLifecycleManager::new(HeadlessBackend::immediate(), &GalleryConfig::default());
        manager.load_scene(SceneDescriptor::Hub, context());
        settle(&mut manager);

        assert_eq!(manager.load_scene(SceneDescriptor::room("r1"), context()), LoadOutcome::Deferred);
        assert!(manager.active_scene().is_none());
        assert_eq!(manager.backend().live_count(), 0);

        settle(&mut manager);
        let active = manager.active_scene().map(|s| s.descriptor().clone());
        assert_eq!(active, Some(SceneDescriptor::room("r1")));
    }

    #[test]
    fn test_session_and_scene_events() {
        let recorder = MemoryAnalytics::new();
        let mut manager = SceneLifecycleManager::new(HeadlessBackend::immediate(), &GalleryConfig::default())
            .with_analytics(Box::new(recorder.clone()));

        manager.load_scene(SceneDescriptor::Hub, context());
        settle(&mut manager);
        manager.shutdown();

        let events = recorder.events();
        assert!(matches!(events.first(), Some(AnalyticsEvent::SessionStart { .. })));
        assert!(events.contains(&AnalyticsEvent::SceneReady { scene: SceneDescriptor::Hub }));
        assert!(matches!(events.last(), Some(AnalyticsEvent::SessionEnd { .. })));
        assert_eq!(manager.backend().live_count(), 0);
    }

    #[test]
    fn test_leaving_a_ready_scene_reports_exit() {
        let recorder = MemoryAnalytics::new();
        let mut manager = SceneLifecycleManager::new(HeadlessBackend::immediate(), &GalleryConfig::default())
            .with_analytics(Box::new(recorder.clone()));

        manager.load_scene(SceneDescriptor::Hub, context());
        settle(&mut manager);
        manager.update(FRAME);
        manager.load_scene(SceneDescriptor::room("r1"), context());
        settle(&mut manager);
        manager.update(FRAME);
        manager.shutdown();

        let exited: Vec<SceneDescriptor> = recorder
            .events()
            .into_iter()
            .filter_map(|event| match event {
                AnalyticsEvent::SceneExited { scene, duration } => {
                    assert!(duration > Duration::ZERO);
                    Some(scene)
                }
                _ => None,
            })
            .collect();
        assert_eq!(exited, vec![SceneDescriptor::Hub, SceneDescriptor::room("r1")]);
    }

    #[test]
    fn test_oversized_frame_time_does_not_panic() {
        let mut manager = SceneLifecycleManager::new(HeadlessBackend::immediate(), &GalleryConfig::default());
        manager.load_scene(SceneDescriptor::Hub, context());
        manager.update(1.0e30);
        manager.update(f32::INFINITY);
        settle(&mut manager);
        assert_eq!(manager.state(), ManagerState::Idle);
    }
}
