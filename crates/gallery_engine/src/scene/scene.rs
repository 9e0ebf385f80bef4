//! Scenes: one hub or room, built over several frames
//!
//! A [`ScenePlanner`] turns the shared content into a [`ScenePlan`]: every
//! entity the scene needs, where it goes and what it shows. The [`Scene`] then
//! provisions and binds those entities frame by frame, owns them until it is
//! disposed, and exposes its navigation edges.

use super::binder::{BindStep, BindTask, ContentBinder, PanelContent};
use super::navigation::{hub_edges, room_edges, NavigationEdge, SceneContext, SceneDescriptor};
use super::provisioner::{EntityProvisioner, EntityRole, ProvisionStep, ProvisionTask, SpatialEntity};
use crate::content::{ColorTheme, ContentTransformer, Panel};
use crate::core::config::SceneConfig;
use crate::error::{ContentError, TransitionError};
use crate::foundation::math::Vec3;
use crate::layout::{positions, LayoutParams, LayoutStrategy, TemplateRegistry};
use crate::render::{EntityDescriptor, EntityTemplate, RenderBackend};
use std::fmt;

/// Collaborators a scene uses while building
pub struct SceneServices<'a> {
    /// Rendering backend
    pub backend: &'a mut dyn RenderBackend,
    /// Entity provisioner
    pub provisioner: &'a mut EntityProvisioner,
    /// Content binder
    pub binder: &'a ContentBinder,
    /// Template registry
    pub templates: &'a TemplateRegistry,
    /// Scene placement
    pub config: &'a SceneConfig,
}

/// One entity a scene will create
#[derive(Debug, Clone)]
pub struct PlannedEntity {
    /// Creation request
    pub descriptor: EntityDescriptor,
    /// Panel or navigation
    pub role: EntityRole,
    /// Content bound once the entity exists
    pub content: PanelContent,
}

/// Everything a scene will create
#[derive(Debug, Clone)]
pub struct ScenePlan {
    /// Colors applied to the backend
    pub theme: ColorTheme,
    /// Panels first, then navigation entities
    pub entities: Vec<PlannedEntity>,
    /// Navigation edges, one per navigation entity
    pub edges: Vec<NavigationEdge>,
}

/// Outcome of planning
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    /// Build this plan
    Build(ScenePlan),
    /// Nothing to show here; go to another scene instead
    Redirect(SceneDescriptor),
}

/// Decides what a scene contains
pub trait ScenePlanner: fmt::Debug {
    /// Scene this planner builds
    fn descriptor(&self) -> SceneDescriptor;

    /// Derive the plan from the shared content
    fn plan(&self, context: &SceneContext, services: &SceneServices<'_>) -> Result<PlanOutcome, ContentError>;
}

/// Planner of the hub scene
#[derive(Debug, Clone, Copy, Default)]
pub struct HubScene;

impl ScenePlanner for HubScene {
    fn descriptor(&self) -> SceneDescriptor {
        SceneDescriptor::Hub
    }

    fn plan(&self, context: &SceneContext, services: &SceneServices<'_>) -> Result<PlanOutcome, ContentError> {
        let snapshot = context.snapshot();
        let content = ContentTransformer::transform(&snapshot.portfolio, &snapshot.rooms)?;
        let resolved = services.templates.resolve_for(&snapshot.portfolio);
        let edges = hub_edges(&content.other_rooms);

        let mut entities = panel_entities(&content.hub_panels, resolved.strategy, &resolved.params, services);
        entities.extend(navigation_entities(&self.descriptor(), &edges, services));

        Ok(PlanOutcome::Build(ScenePlan {
            theme: resolved.theme,
            entities,
            edges,
        }))
    }
}

/// Planner of a room scene
#[derive(Debug, Clone)]
pub struct RoomScene {
    room_id: String,
}

impl RoomScene {
    /// Planner for the given room
    pub fn new(room_id: impl Into<String>) -> Self {
        Self { room_id: room_id.into() }
    }
}

impl ScenePlanner for RoomScene {
    fn descriptor(&self) -> SceneDescriptor {
        SceneDescriptor::room(&self.room_id)
    }

    fn plan(&self, context: &SceneContext, services: &SceneServices<'_>) -> Result<PlanOutcome, ContentError> {
        let portfolio = &context.snapshot().portfolio;
        let (hub, others) = context.split_rooms().ok_or_else(|| ContentError::NoRooms {
            portfolio: portfolio.id.clone(),
        })?;

        if hub.id == self.room_id {
            log::debug!("Room '{}' is the hub, showing the hub scene", self.room_id);
            return Ok(PlanOutcome::Redirect(SceneDescriptor::Hub));
        }

        let Some(room) = others.iter().find(|room| room.id == self.room_id) else {
            log::warn!("Room '{}' not found, returning to the hub", self.room_id);
            return Ok(PlanOutcome::Redirect(SceneDescriptor::Hub));
        };

        let panels = ContentTransformer::panels_for_room(room, portfolio.visibility);
        if panels.is_empty() {
            log::info!("Room '{}' has nothing to show, returning to the hub", room.id);
            return Ok(PlanOutcome::Redirect(SceneDescriptor::Hub));
        }

        let resolved = services.templates.resolve_for(portfolio);
        let edges = room_edges(&room.id, &hub, &others);

        let mut entities = panel_entities(&panels, resolved.strategy, &resolved.params, services);
        entities.extend(navigation_entities(&self.descriptor(), &edges, services));

        Ok(PlanOutcome::Build(ScenePlan {
            theme: resolved.theme,
            entities,
            edges,
        }))
    }
}

fn panel_entities(
    panels: &[Panel],
    strategy: LayoutStrategy,
    params: &LayoutParams,
    services: &SceneServices<'_>,
) -> Vec<PlannedEntity> {
    let (max_width, max_height) = services.provisioner.config().panel_size;
    panels
        .iter()
        .zip(positions(panels.len(), strategy, params))
        .map(|(panel, position)| PlannedEntity {
            descriptor: EntityDescriptor {
                id: panel.id.clone(),
                template: EntityTemplate::MediaPanel,
                max_width,
                max_height,
                position,
            },
            role: EntityRole::Panel { slot: panel.slot },
            content: PanelContent::for_panel(panel),
        })
        .collect()
}

fn navigation_entities(
    scene: &SceneDescriptor,
    edges: &[NavigationEdge],
    services: &SceneServices<'_>,
) -> Vec<PlannedEntity> {
    let (max_width, max_height) = services.provisioner.config().navigation_size;
    let params = LayoutParams {
        spacing: services.config.navigation_spacing,
        base: services.config.navigation_base,
        ..LayoutParams::default()
    };

    edges
        .iter()
        .zip(positions(edges.len(), LayoutStrategy::Horizontal, &params))
        .map(|(edge, position)| PlannedEntity {
            descriptor: EntityDescriptor {
                id: format!("nav-{}-{}", scene.key(), edge.target.key()),
                template: EntityTemplate::NavigationPortal,
                max_width,
                max_height,
                position,
            },
            role: EntityRole::Navigation {
                target: edge.target.clone(),
            },
            content: PanelContent::for_edge(edge),
        })
        .collect()
}

/// Where a scene is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    /// Created, not built
    Idle,
    /// Entities still provisioning or binding
    Building,
    /// Fully built
    Ready,
    /// Entities released
    Disposed,
}

/// Progress of a scene build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
    /// More frames needed
    InProgress,
    /// Every entity provisioned and bound (or skipped)
    Complete,
    /// The scene cannot be shown; navigate here instead
    Redirect(SceneDescriptor),
}

/// Per-scene counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneDiagnostics {
    /// Entities provisioned
    pub provisioned: usize,
    /// Entities skipped because provisioning failed
    pub provision_failures: usize,
    /// Entities with content bound
    pub bound: usize,
    /// Entities whose binding failed
    pub bind_failures: usize,
    /// Text elements left with placeholder text
    pub text_warnings: usize,
}

struct Provisioning {
    order: usize,
    task: ProvisionTask,
    content: PanelContent,
}

/// A hub or room at runtime
pub struct Scene {
    planner: Box<dyn ScenePlanner>,
    descriptor: SceneDescriptor,
    phase: ScenePhase,
    entities: Vec<SpatialEntity>,
    entity_order: Vec<usize>,
    edges: Vec<NavigationEdge>,
    provisioning: Vec<Provisioning>,
    binding: Vec<BindTask>,
    diagnostics: SceneDiagnostics,
    hub_route_lost: bool,
}

impl Scene {
    /// Scene built by a custom planner
    pub fn new(planner: Box<dyn ScenePlanner>) -> Self {
        Self {
            descriptor: planner.descriptor(),
            planner,
            phase: ScenePhase::Idle,
            entities: Vec::new(),
            entity_order: Vec::new(),
            edges: Vec::new(),
            provisioning: Vec::new(),
            binding: Vec::new(),
            diagnostics: SceneDiagnostics::default(),
            hub_route_lost: false,
        }
    }

    /// Scene for a descriptor with the standard planners
    pub fn for_descriptor(descriptor: &SceneDescriptor) -> Self {
        match descriptor {
            SceneDescriptor::Hub => Self::new(Box::new(HubScene)),
            SceneDescriptor::Room { room_id } => Self::new(Box::new(RoomScene::new(room_id.clone()))),
        }
    }

    /// Which scene this is
    pub fn descriptor(&self) -> &SceneDescriptor {
        &self.descriptor
    }

    /// Build phase
    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// Owned entities in plan order
    pub fn entities(&self) -> &[SpatialEntity] {
        &self.entities
    }

    /// Navigation edges backed by a provisioned or pending entity
    pub fn edges(&self) -> &[NavigationEdge] {
        &self.edges
    }

    /// Build counters
    pub fn diagnostics(&self) -> SceneDiagnostics {
        self.diagnostics
    }

    /// Plan the scene and start provisioning every entity
    pub fn build(&mut self, context: &SceneContext, services: &mut SceneServices<'_>) -> Result<BuildStep, TransitionError> {
        match self.phase {
            ScenePhase::Idle => {}
            ScenePhase::Disposed => return Err(TransitionError::Disposed(self.descriptor.to_string())),
            ScenePhase::Building => return Ok(BuildStep::InProgress),
            ScenePhase::Ready => return Ok(BuildStep::Complete),
        }

        let plan = match self.planner.plan(context, services) {
            Ok(PlanOutcome::Build(plan)) => plan,
            Ok(PlanOutcome::Redirect(target)) => {
                self.phase = ScenePhase::Ready;
                return Ok(BuildStep::Redirect(target));
            }
            Err(source) => {
                return Err(TransitionError::Build {
                    scene: self.descriptor.to_string(),
                    source,
                })
            }
        };

        log::info!(
            "Building scene '{}': {} entities, {} navigation edges",
            self.descriptor,
            plan.entities.len(),
            plan.edges.len()
        );

        services.backend.apply_theme(&plan.theme);
        self.edges = plan.edges;
        for (order, planned) in plan.entities.into_iter().enumerate() {
            let task = services
                .provisioner
                .create(&mut *services.backend, planned.descriptor, planned.role);
            self.provisioning.push(Provisioning {
                order,
                task,
                content: planned.content,
            });
        }

        self.phase = ScenePhase::Building;
        Ok(self.completion())
    }

    /// Advance provisioning and binding by one frame
    ///
    /// A room whose way back to the hub could not be provisioned redirects
    /// to the hub instead of completing.
    pub fn update(&mut self, services: &mut SceneServices<'_>, delta_time: f32) -> Result<BuildStep, TransitionError> {
        match self.phase {
            ScenePhase::Building => {}
            ScenePhase::Ready => return Ok(BuildStep::Complete),
            ScenePhase::Idle => return Ok(BuildStep::InProgress),
            ScenePhase::Disposed => return Err(TransitionError::Disposed(self.descriptor.to_string())),
        }

        self.advance_provisioning(services, delta_time);
        if self.hub_route_lost {
            log::warn!("Scene '{}' has no route back to the hub, returning there", self.descriptor);
            self.phase = ScenePhase::Ready;
            return Ok(BuildStep::Redirect(SceneDescriptor::Hub));
        }
        self.advance_binding(services, delta_time);
        Ok(self.completion())
    }

    /// Detach and release every owned entity
    ///
    /// Safe to call any number of times, including on a scene that never
    /// finished building.
    pub fn dispose(&mut self, backend: &mut dyn RenderBackend, provisioner: &mut EntityProvisioner) {
        if self.phase == ScenePhase::Disposed {
            return;
        }

        for pending in self.provisioning.drain(..) {
            provisioner.abandon(pending.task, &mut *backend);
        }
        self.binding.clear();

        for entity in self.entities.drain(..) {
            provisioner.release(&mut *backend, entity.handle);
        }
        self.entity_order.clear();
        self.edges.clear();

        log::debug!("Disposed scene '{}'", self.descriptor);
        self.phase = ScenePhase::Disposed;
    }

    fn advance_provisioning(&mut self, services: &mut SceneServices<'_>, delta_time: f32) {
        let mut still_pending = Vec::with_capacity(self.provisioning.len());

        for mut pending in std::mem::take(&mut self.provisioning) {
            match services
                .provisioner
                .advance(&mut pending.task, &mut *services.backend, delta_time)
            {
                ProvisionStep::Pending => still_pending.push(pending),
                ProvisionStep::Ready(entity) => {
                    self.diagnostics.provisioned += 1;
                    self.binding.push(services.binder.bind(&entity, pending.content));
                    let index = self.entity_order.partition_point(|order| *order < pending.order);
                    self.entity_order.insert(index, pending.order);
                    self.entities.insert(index, entity);
                }
                ProvisionStep::Failed(e) => {
                    self.diagnostics.provision_failures += 1;
                    log::warn!("Scene '{}': skipping entity: {}", self.descriptor, e);
                    if let EntityRole::Navigation { target } = pending.task.role() {
                        self.edges.retain(|edge| &edge.target != target);
                        self.hub_route_lost |= target.is_hub();
                    }
                }
            }
        }

        self.provisioning = still_pending;
    }

    fn advance_binding(&mut self, services: &mut SceneServices<'_>, delta_time: f32) {
        let mut still_pending = Vec::with_capacity(self.binding.len());

        for mut task in std::mem::take(&mut self.binding) {
            match services.binder.advance(&mut task, &mut *services.backend, delta_time) {
                BindStep::Pending => still_pending.push(task),
                BindStep::Bound(report) => {
                    self.diagnostics.bound += 1;
                    self.diagnostics.text_warnings += report.unverified_text.len();
                }
                BindStep::Failed(e) => {
                    self.diagnostics.bind_failures += 1;
                    log::warn!("Scene '{}': entity keeps placeholder content: {}", self.descriptor, e);
                }
            }
        }

        self.binding = still_pending;
    }

    fn completion(&mut self) -> BuildStep {
        if !self.provisioning.is_empty() || !self.binding.is_empty() {
            return BuildStep::InProgress;
        }

        self.phase = ScenePhase::Ready;
        log::info!(
            "Scene '{}' ready: {} entities ({} skipped, {} unbound)",
            self.descriptor,
            self.entities.len(),
            self.diagnostics.provision_failures,
            self.diagnostics.bind_failures
        );
        BuildStep::Complete
    }

    /// Positions of the owned panel entities, in slot order
    pub fn panel_positions(&self) -> Vec<Vec3> {
        self.entities
            .iter()
            .filter(|entity| matches!(entity.role, EntityRole::Panel { .. }))
            .map(|entity| entity.position)
            .collect()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("descriptor", &self.descriptor)
            .field("phase", &self.phase)
            .field("entities", &self.entities.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}
