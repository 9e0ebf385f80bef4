//! Scene system
//!
//! Entity provisioning, content binding, the hub and room scenes, and the
//! lifecycle manager that switches between them.

pub mod binder;
pub mod lifecycle;
pub mod navigation;
pub mod provisioner;
#[allow(clippy::module_inception)]
pub mod scene;

pub use binder::{BindReport, BindStep, BindTask, ContentBinder, PanelContent};
pub use lifecycle::{LoadOutcome, ManagerState, SceneLifecycleManager};
pub use navigation::{hub_edges, room_edges, NavigationEdge, SceneContext, SceneDescriptor};
pub use provisioner::{EntityProvisioner, EntityRole, ProvisionStep, ProvisionTask, SpatialEntity};
pub use scene::{
    BuildStep, HubScene, PlanOutcome, PlannedEntity, RoomScene, Scene, SceneDiagnostics, ScenePhase, ScenePlan,
    ScenePlanner, SceneServices,
};
