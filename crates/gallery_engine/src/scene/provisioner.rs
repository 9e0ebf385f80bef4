//! Spatial Entity Provisioner
//!
//! Creates one positioned, visible entity per descriptor. The backend reports
//! transforms asynchronously, so creation is a [`ProvisionTask`] advanced once
//! per frame until it resolves.
//!
//! The primary path polls for the transform under the configured time budget.
//! When the backend rejects the request or the budget runs out, the stale
//! handle is released and the entity is instantiated directly instead, with a
//! short settle delay before its transform is checked.

use super::navigation::SceneDescriptor;
use crate::core::config::ProvisionConfig;
use crate::error::ProvisionError;
use crate::foundation::math::{facing_toward, Quat, Vec3};
use crate::foundation::poll::{FramePoll, PollExhausted, PollState};
use crate::render::{BackendError, EntityDescriptor, EntityHandle, EntityTemplate, RenderBackend};
use std::collections::{BTreeMap, HashMap};

/// What an entity is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRole {
    /// Shows one panel
    Panel {
        /// Panel slot in its room
        slot: usize,
    },
    /// Leads to another scene
    Navigation {
        /// Destination
        target: SceneDescriptor,
    },
}

/// A provisioned entity
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntity {
    /// Entity id
    pub id: String,
    /// Backend handle
    pub handle: EntityHandle,
    /// Prefab
    pub template: EntityTemplate,
    /// World position
    pub position: Vec3,
    /// Rotation toward the focal point
    pub facing: Quat,
    /// Visibility as last set by the provisioner
    pub visible: bool,
    /// Panel or navigation
    pub role: EntityRole,
}

/// Result of advancing a [`ProvisionTask`]
#[derive(Debug)]
pub enum ProvisionStep {
    /// The entity is positioned and visible
    Ready(SpatialEntity),
    /// Still waiting on the backend
    Pending,
    /// Both creation paths failed
    Failed(ProvisionError),
}

#[derive(Debug)]
enum Stage {
    Primary { handle: EntityHandle, poll: FramePoll },
    Settling { handle: EntityHandle, remaining: u32 },
    Failed(ProvisionError),
    Finished,
}

/// In-flight creation of one entity
#[derive(Debug)]
pub struct ProvisionTask {
    descriptor: EntityDescriptor,
    role: EntityRole,
    stage: Stage,
    primary_timeout: Option<PollExhausted>,
}

impl ProvisionTask {
    /// Entity id
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// Role the entity will have
    pub fn role(&self) -> &EntityRole {
        &self.role
    }

    /// Handle currently owned by the task, if any
    pub fn handle(&self) -> Option<EntityHandle> {
        match self.stage {
            Stage::Primary { handle, .. } | Stage::Settling { handle, .. } => Some(handle),
            Stage::Failed(_) | Stage::Finished => None,
        }
    }

    /// True once the task has produced its result
    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finished)
    }
}

/// Creates entities and tracks the ones still alive
#[derive(Debug)]
pub struct EntityProvisioner {
    config: ProvisionConfig,
    focal_point: Vec3,
    created: BTreeMap<String, u32>,
    live: HashMap<EntityHandle, String>,
}

impl EntityProvisioner {
    /// Create a provisioner facing entities toward `focal_point`
    pub fn new(config: ProvisionConfig, focal_point: Vec3) -> Self {
        Self {
            config,
            focal_point,
            created: BTreeMap::new(),
            live: HashMap::new(),
        }
    }

    /// Provisioning limits
    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Point every entity faces
    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    /// Start creating an entity
    pub fn create(
        &mut self,
        backend: &mut dyn RenderBackend,
        descriptor: EntityDescriptor,
        role: EntityRole,
    ) -> ProvisionTask {
        let stage = match backend.create_entity(&descriptor) {
            Ok(handle) => Stage::Primary {
                handle,
                poll: FramePoll::new(self.config.poll_policy()),
            },
            Err(e) => {
                log::warn!("Primary creation of '{}' rejected, instantiating directly: {}", descriptor.id, e);
                self.start_fallback(backend, &descriptor)
            }
        };

        ProvisionTask {
            descriptor,
            role,
            stage,
            primary_timeout: None,
        }
    }

    /// Advance a task by one frame
    pub fn advance(
        &mut self,
        task: &mut ProvisionTask,
        backend: &mut dyn RenderBackend,
        delta_time: f32,
    ) -> ProvisionStep {
        match std::mem::replace(&mut task.stage, Stage::Finished) {
            Stage::Primary { handle, mut poll } => {
                match poll.tick(delta_time, || backend.has_transform(handle).then_some(())) {
                    PollState::Ready(()) => self.finish(task, backend, handle),
                    PollState::Pending => {
                        task.stage = Stage::Primary { handle, poll };
                        ProvisionStep::Pending
                    }
                    PollState::Exhausted(exhausted) => {
                        log::warn!(
                            "Entity '{}' transform missing after {}ms ({} attempts), instantiating directly",
                            task.descriptor.id,
                            exhausted.elapsed.as_millis(),
                            exhausted.attempts
                        );
                        backend.detach(handle);
                        backend.release_resources(handle);
                        task.primary_timeout = Some(exhausted);
                        task.stage = self.start_fallback(backend, &task.descriptor);
                        ProvisionStep::Pending
                    }
                }
            }
            Stage::Settling { handle, remaining } if remaining > 0 => {
                task.stage = Stage::Settling {
                    handle,
                    remaining: remaining - 1,
                };
                ProvisionStep::Pending
            }
            Stage::Settling { handle, .. } => {
                if backend.has_transform(handle) {
                    return self.finish(task, backend, handle);
                }
                backend.detach(handle);
                backend.release_resources(handle);
                ProvisionStep::Failed(self.settle_failure(task))
            }
            Stage::Failed(error) => ProvisionStep::Failed(error),
            Stage::Finished => ProvisionStep::Pending,
        }
    }

    /// Drop a task that will not be advanced again, releasing its handle
    pub fn abandon(&mut self, task: ProvisionTask, backend: &mut dyn RenderBackend) {
        if let Some(handle) = task.handle() {
            log::debug!("Abandoning provisioning of '{}'", task.descriptor.id);
            backend.detach(handle);
            backend.release_resources(handle);
        }
    }

    /// Detach an entity and free its resources
    pub fn release(&mut self, backend: &mut dyn RenderBackend, handle: EntityHandle) {
        backend.detach(handle);
        backend.release_resources(handle);
        self.live.remove(&handle);
    }

    /// True while the entity is provisioned and not yet released
    pub fn is_tracked(&self, handle: EntityHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Every id provisioned so far with its provision count
    pub fn created_ids(&self) -> &BTreeMap<String, u32> {
        &self.created
    }

    /// Number of provisioned entities not yet released
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn start_fallback(&self, backend: &mut dyn RenderBackend, descriptor: &EntityDescriptor) -> Stage {
        match backend.instantiate_direct(descriptor) {
            Ok(handle) => Stage::Settling {
                handle,
                remaining: self.config.fallback_settle_frames,
            },
            Err(source) => Stage::Failed(ProvisionError::Rejected {
                id: descriptor.id.clone(),
                source,
            }),
        }
    }

    fn settle_failure(&self, task: &ProvisionTask) -> ProvisionError {
        match task.primary_timeout {
            Some(exhausted) => ProvisionError::Timeout {
                id: task.descriptor.id.clone(),
                waited_ms: exhausted.elapsed.as_millis(),
                attempts: exhausted.attempts,
            },
            None => ProvisionError::FallbackFailed {
                id: task.descriptor.id.clone(),
                reason: format!(
                    "transform missing {} frames after direct instantiation",
                    self.config.fallback_settle_frames
                ),
            },
        }
    }

    fn finish(
        &mut self,
        task: &ProvisionTask,
        backend: &mut dyn RenderBackend,
        handle: EntityHandle,
    ) -> ProvisionStep {
        let position = task.descriptor.position;
        let facing = facing_toward(position, self.focal_point);

        let placed: Result<(), BackendError> = backend
            .set_position(handle, position)
            .and_then(|()| backend.set_facing(handle, facing))
            .and_then(|()| backend.set_visible(handle, true));

        if let Err(source) = placed {
            backend.detach(handle);
            backend.release_resources(handle);
            return ProvisionStep::Failed(ProvisionError::Rejected {
                id: task.descriptor.id.clone(),
                source,
            });
        }

        *self.created.entry(task.descriptor.id.clone()).or_insert(0) += 1;
        self.live.insert(handle, task.descriptor.id.clone());
        log::trace!("Entity '{}' ready at {:?}", task.descriptor.id, position);

        ProvisionStep::Ready(SpatialEntity {
            id: task.descriptor.id.clone(),
            handle,
            template: task.descriptor.template,
            position,
            facing,
            visible: true,
            role: task.role.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessBackend, HeadlessConfig};
    use approx::assert_relative_eq;

    const FRAME: f32 = 1.0 / 60.0;

    fn descriptor(id: &str) -> EntityDescriptor {
        EntityDescriptor {
            id: id.to_string(),
            template: EntityTemplate::MediaPanel,
            max_width: 1.6,
            max_height: 1.2,
            position: Vec3::new(1.0, 1.6, -3.0),
        }
    }

    fn run(
        provisioner: &mut EntityProvisioner,
        backend: &mut HeadlessBackend,
        mut task: ProvisionTask,
        frames: usize,
    ) -> Option<Result<SpatialEntity, ProvisionError>> {
        for _ in 0..frames {
            backend.advance_frame(FRAME);
            match provisioner.advance(&mut task, backend, FRAME) {
                ProvisionStep::Ready(entity) => return Some(Ok(entity)),
                ProvisionStep::Failed(e) => return Some(Err(e)),
                ProvisionStep::Pending => {}
            }
        }
        None
    }

    fn provisioner() -> EntityProvisioner {
        EntityProvisioner::new(ProvisionConfig::default(), Vec3::new(0.0, 1.6, 0.0))
    }

    #[test]
    fn test_ready_entity_is_placed_and_visible() {
        let mut backend = HeadlessBackend::new(HeadlessConfig::default());
        let mut provisioner = provisioner();
        let task = provisioner.create(&mut backend, descriptor("a"), EntityRole::Panel { slot: 0 });

        let entity = run(&mut provisioner, &mut backend, task, 10)
            .expect("resolved")
            .expect("ready");

        let state = backend.entity(entity.handle).expect("alive");
        assert!(state.visible);
        assert_eq!(state.position, Some(Vec3::new(1.0, 1.6, -3.0)));
        let forward = entity.facing * Vec3::z();
        assert_relative_eq!(forward, Vec3::new(-1.0, 0.0, 3.0).normalize(), epsilon = 1e-5);
        assert_eq!(provisioner.created_ids().get("a"), Some(&1));
        assert!(provisioner.is_tracked(entity.handle));
    }

    #[test]
    fn test_timeout_falls_back_to_direct_instantiation() {
        let mut backend = HeadlessBackend::new(HeadlessConfig::default());
        backend.stall_transform_for("a");
        let mut provisioner = provisioner();
        let task = provisioner.create(&mut backend, descriptor("a"), EntityRole::Panel { slot: 0 });

        let entity = run(&mut provisioner, &mut backend, task, 300)
            .expect("resolved")
            .expect("fallback ready");

        assert_eq!(backend.live_count(), 1);
        assert_eq!(backend.released_count(), 1);
        assert_eq!(
            backend.entity(entity.handle).map(|e| e.path),
            Some(crate::render::CreationPath::Direct)
        );
    }

    #[test]
    fn test_timeout_error_names_entity() {
        let mut backend = HeadlessBackend::new(HeadlessConfig {
            direct_transform_latency_frames: 50,
            ..HeadlessConfig::default()
        });
        backend.stall_transform_for("slow-panel");
        let mut provisioner = provisioner();
        let task = provisioner.create(&mut backend, descriptor("slow-panel"), EntityRole::Panel { slot: 0 });

        let err = run(&mut provisioner, &mut backend, task, 300)
            .expect("resolved")
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Timeout { .. }));
        assert_eq!(err.entity_id(), "slow-panel");
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn test_rejection_then_fallback_failure() {
        let mut backend = HeadlessBackend::immediate();
        backend.reject_primary_for("a");
        backend.fail_direct_for("a");
        let mut provisioner = provisioner();
        let task = provisioner.create(&mut backend, descriptor("a"), EntityRole::Panel { slot: 0 });

        let err = run(&mut provisioner, &mut backend, task, 5)
            .expect("resolved")
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Rejected { .. }));
        assert!(provisioner.created_ids().is_empty());
    }

    #[test]
    fn test_reprovisioning_counts() {
        let mut backend = HeadlessBackend::immediate();
        let mut provisioner = provisioner();

        for _ in 0..2 {
            let task = provisioner.create(&mut backend, descriptor("a"), EntityRole::Panel { slot: 0 });
            let entity = run(&mut provisioner, &mut backend, task, 5)
                .expect("resolved")
                .expect("ready");
            provisioner.release(&mut backend, entity.handle);
        }

        assert_eq!(provisioner.created_ids().get("a"), Some(&2));
        assert_eq!(provisioner.live_count(), 0);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn test_abandon_releases_pending_handle() {
        let mut backend = HeadlessBackend::new(HeadlessConfig::default());
        let mut provisioner = provisioner();
        let task = provisioner.create(&mut backend, descriptor("a"), EntityRole::Panel { slot: 0 });

        assert_eq!(backend.live_count(), 1);
        provisioner.abandon(task, &mut backend);
        assert_eq!(backend.live_count(), 0);
    }
}
