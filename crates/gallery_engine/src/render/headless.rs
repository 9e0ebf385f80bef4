//! In-memory rendering backend
//!
//! Simulates a renderer whose entity transforms and backing documents appear
//! some frames after creation. Failures can be injected per entity id, which
//! makes every recovery path of the provisioner and binder reachable without a
//! GPU.

use super::backend::{
    BackendError, BackingDocument, ElementMarker, ElementRole, EntityDescriptor, EntityHandle,
    EntityTemplate, InlineMedia, InteractAction, InteractionEvent, Popup, RenderBackend, TextMechanism,
};
use crate::content::ColorTheme;
use crate::foundation::math::{Quat, Vec3};
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};

/// Simulated latencies
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Frames until a primary-path entity has its transform
    pub transform_latency_frames: u32,

    /// Frames until a directly instantiated entity has its transform
    pub direct_transform_latency_frames: u32,

    /// Frames until the backing document is populated
    pub document_latency_frames: u32,

    /// Text mechanisms the documents accept
    pub text_mechanisms: Vec<TextMechanism>,

    /// Mechanisms that report success but do not apply the text
    pub unverified_text_mechanisms: Vec<TextMechanism>,
}

impl HeadlessConfig {
    /// Everything ready at creation
    pub fn immediate() -> Self {
        Self {
            transform_latency_frames: 0,
            direct_transform_latency_frames: 0,
            document_latency_frames: 0,
            ..Self::default()
        }
    }
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            transform_latency_frames: 2,
            direct_transform_latency_frames: 0,
            document_latency_frames: 4,
            text_mechanisms: TextMechanism::ORDER.to_vec(),
            unverified_text_mechanisms: Vec::new(),
        }
    }
}

/// How an entity was created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationPath {
    /// `create_entity`
    Primary,
    /// `instantiate_direct`
    Direct,
}

/// One element of a headless document
#[derive(Debug, Clone, Default)]
pub struct HeadlessElement {
    /// Current text
    pub text: Option<String>,
    /// Inline media
    pub media: Option<InlineMedia>,
    /// Markers
    pub marker: ElementMarker,
    /// Registered handlers, in registration order
    pub handlers: Vec<InteractAction>,
}

/// Headless backing document
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    elements: HashMap<ElementRole, HeadlessElement>,
    text_mechanisms: Vec<TextMechanism>,
    unverified_text_mechanisms: Vec<TextMechanism>,
}

impl HeadlessDocument {
    fn new(roles: impl IntoIterator<Item = ElementRole>, config: &HeadlessConfig) -> Self {
        Self {
            elements: roles.into_iter().map(|role| (role, HeadlessElement::default())).collect(),
            text_mechanisms: config.text_mechanisms.clone(),
            unverified_text_mechanisms: config.unverified_text_mechanisms.clone(),
        }
    }

    /// Inspect one element
    pub fn element(&self, element: ElementRole) -> Option<&HeadlessElement> {
        self.elements.get(&element)
    }

    /// Number of handlers registered on an element
    pub fn handler_count(&self, element: ElementRole) -> usize {
        self.elements.get(&element).map_or(0, |e| e.handlers.len())
    }
}

impl BackingDocument for HeadlessDocument {
    fn has_element(&self, element: ElementRole) -> bool {
        self.elements.contains_key(&element)
    }

    fn set_text(&mut self, element: ElementRole, mechanism: TextMechanism, text: &str) -> bool {
        if self.unverified_text_mechanisms.contains(&mechanism) {
            return true;
        }
        if !self.text_mechanisms.contains(&mechanism) {
            return false;
        }
        match self.elements.get_mut(&element) {
            Some(target) => {
                target.text = Some(text.to_string());
                true
            }
            None => false,
        }
    }

    fn text(&self, element: ElementRole) -> Option<&str> {
        self.elements.get(&element)?.text.as_deref()
    }

    fn set_media(&mut self, element: ElementRole, media: InlineMedia) -> bool {
        match self.elements.get_mut(&element) {
            Some(target) => {
                target.media = Some(media);
                true
            }
            None => false,
        }
    }

    fn marker(&self, element: ElementRole) -> ElementMarker {
        self.elements.get(&element).map_or_else(ElementMarker::empty, |e| e.marker)
    }

    fn set_marker(&mut self, element: ElementRole, marker: ElementMarker) {
        if let Some(target) = self.elements.get_mut(&element) {
            target.marker |= marker;
        }
    }

    fn register_handler(&mut self, element: ElementRole, action: InteractAction) {
        if let Some(target) = self.elements.get_mut(&element) {
            target.handlers.push(action);
        }
    }
}

/// Headless entity state
#[derive(Debug, Clone)]
pub struct HeadlessEntity {
    /// Descriptor id
    pub id: String,
    /// Prefab
    pub template: EntityTemplate,
    /// Creation path
    pub path: CreationPath,
    /// Frame on which the entity was created
    pub created_frame: u64,
    /// Frames since creation
    pub age_frames: u32,
    /// Transform present
    pub transform_ready: bool,
    /// Position (not applied until the engine sets it)
    pub position: Option<Vec3>,
    /// Rotation
    pub facing: Option<Quat>,
    /// Visibility; the backend does not guarantee it after creation
    pub visible: bool,
    /// Attached to the spatial root
    pub attached: bool,
    /// Backing document, once populated
    pub document: Option<HeadlessDocument>,
}

/// In-memory [`RenderBackend`]
#[derive(Debug)]
pub struct HeadlessBackend {
    config: HeadlessConfig,
    entities: SlotMap<EntityHandle, HeadlessEntity>,
    frame: u64,
    reject_primary: HashSet<String>,
    stall_transform: HashSet<String>,
    fail_direct: HashSet<String>,
    withhold_document: HashSet<String>,
    omitted_elements: HashMap<String, Vec<ElementRole>>,
    interactions: Vec<InteractionEvent>,
    popups: Vec<Popup>,
    theme: Option<ColorTheme>,
    creation_log: Vec<(String, u64)>,
    removal_log: Vec<(String, u64)>,
    released: usize,
}

impl HeadlessBackend {
    /// Create a backend with the given latencies
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            entities: SlotMap::with_key(),
            frame: 0,
            reject_primary: HashSet::new(),
            stall_transform: HashSet::new(),
            fail_direct: HashSet::new(),
            withhold_document: HashSet::new(),
            omitted_elements: HashMap::new(),
            interactions: Vec::new(),
            popups: Vec::new(),
            theme: None,
            creation_log: Vec::new(),
            removal_log: Vec::new(),
            released: 0,
        }
    }

    /// Backend where everything is ready at creation
    pub fn immediate() -> Self {
        Self::new(HeadlessConfig::immediate())
    }

    // ------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------

    /// `create_entity` fails for this id
    pub fn reject_primary_for(&mut self, id: impl Into<String>) {
        self.reject_primary.insert(id.into());
    }

    /// Primary-path entities with this id never get a transform
    pub fn stall_transform_for(&mut self, id: impl Into<String>) {
        self.stall_transform.insert(id.into());
    }

    /// `instantiate_direct` fails for this id
    pub fn fail_direct_for(&mut self, id: impl Into<String>) {
        self.fail_direct.insert(id.into());
    }

    /// The document of this id is never populated
    pub fn withhold_document_for(&mut self, id: impl Into<String>) {
        self.withhold_document.insert(id.into());
    }

    /// The document of this id lacks the given element
    pub fn omit_element_for(&mut self, id: impl Into<String>, element: ElementRole) {
        self.omitted_elements.entry(id.into()).or_default().push(element);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Frames advanced so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Entity state by handle
    pub fn entity(&self, handle: EntityHandle) -> Option<&HeadlessEntity> {
        self.entities.get(handle)
    }

    /// Most recently created live entity with this id
    pub fn find(&self, id: &str) -> Option<EntityHandle> {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.id == id)
            .max_by_key(|(_, entity)| entity.created_frame)
            .map(|(handle, _)| handle)
    }

    /// Populated document by handle
    pub fn document(&self, handle: EntityHandle) -> Option<&HeadlessDocument> {
        self.entities.get(handle)?.document.as_ref()
    }

    /// Number of live entities
    pub fn live_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities attached to the spatial root
    pub fn attached_count(&self) -> usize {
        self.entities.values().filter(|entity| entity.attached).count()
    }

    /// Number of entities whose resources were released
    pub fn released_count(&self) -> usize {
        self.released
    }

    /// Popups opened so far
    pub fn popups(&self) -> &[Popup] {
        &self.popups
    }

    /// Last applied theme
    pub fn theme(&self) -> Option<&ColorTheme> {
        self.theme.as_ref()
    }

    /// `(id, frame)` of every creation
    pub fn creation_log(&self) -> &[(String, u64)] {
        &self.creation_log
    }

    /// `(id, frame)` of every detach
    pub fn removal_log(&self) -> &[(String, u64)] {
        &self.removal_log
    }

    /// Trigger an element; one event per registered handler
    pub fn simulate_interaction(&mut self, handle: EntityHandle, element: ElementRole) -> usize {
        let Some(handlers) = self
            .entities
            .get(handle)
            .and_then(|entity| entity.document.as_ref())
            .and_then(|document| document.element(element))
            .map(|e| e.handlers.clone())
        else {
            return 0;
        };

        let count = handlers.len();
        self.interactions.extend(handlers.into_iter().map(|action| InteractionEvent {
            handle,
            element,
            action,
        }));
        count
    }

    fn spawn(&mut self, descriptor: &EntityDescriptor, path: CreationPath) -> EntityHandle {
        let latency = match path {
            CreationPath::Primary => self.config.transform_latency_frames,
            CreationPath::Direct => self.config.direct_transform_latency_frames,
        };
        let stalled = path == CreationPath::Primary && self.stall_transform.contains(&descriptor.id);

        let mut entity = HeadlessEntity {
            id: descriptor.id.clone(),
            template: descriptor.template,
            path,
            created_frame: self.frame,
            age_frames: 0,
            transform_ready: latency == 0 && !stalled,
            position: None,
            facing: None,
            visible: false,
            attached: true,
            document: None,
        };
        self.populate_document(&mut entity);

        self.creation_log.push((descriptor.id.clone(), self.frame));
        self.entities.insert(entity)
    }

    fn populate_document(&self, entity: &mut HeadlessEntity) {
        if entity.document.is_some()
            || !entity.transform_ready
            || entity.age_frames < self.config.document_latency_frames
            || self.withhold_document.contains(&entity.id)
        {
            return;
        }

        let omitted = self.omitted_elements.get(&entity.id);
        let roles = ElementRole::ALL.into_iter().filter(|role| {
            let template_has = entity.template == EntityTemplate::MediaPanel || *role != ElementRole::Media;
            template_has && omitted.map_or(true, |o| !o.contains(role))
        });
        entity.document = Some(HeadlessDocument::new(roles, &self.config));
    }

    fn live_mut(&mut self, handle: EntityHandle) -> Result<&mut HeadlessEntity, BackendError> {
        self.entities.get_mut(handle).ok_or(BackendError::UnknownEntity(handle))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl RenderBackend for HeadlessBackend {
    fn advance_frame(&mut self, _delta_time: f32) {
        self.frame += 1;

        let handles: Vec<EntityHandle> = self.entities.keys().collect();
        for handle in handles {
            let Some(mut entity) = self.entities.get(handle).cloned() else {
                continue;
            };

            entity.age_frames = entity.age_frames.saturating_add(1);
            let latency = match entity.path {
                CreationPath::Primary => self.config.transform_latency_frames,
                CreationPath::Direct => self.config.direct_transform_latency_frames,
            };
            let stalled = entity.path == CreationPath::Primary && self.stall_transform.contains(&entity.id);
            if !entity.transform_ready && !stalled && entity.age_frames >= latency {
                entity.transform_ready = true;
            }
            self.populate_document(&mut entity);

            if let Some(slot) = self.entities.get_mut(handle) {
                *slot = entity;
            }
        }
    }

    fn create_entity(&mut self, descriptor: &EntityDescriptor) -> Result<EntityHandle, BackendError> {
        if self.reject_primary.contains(&descriptor.id) {
            return Err(BackendError::Rejected(format!("primary creation disabled for '{}'", descriptor.id)));
        }
        Ok(self.spawn(descriptor, CreationPath::Primary))
    }

    fn instantiate_direct(&mut self, descriptor: &EntityDescriptor) -> Result<EntityHandle, BackendError> {
        if self.fail_direct.contains(&descriptor.id) {
            return Err(BackendError::Rejected(format!("direct creation disabled for '{}'", descriptor.id)));
        }
        Ok(self.spawn(descriptor, CreationPath::Direct))
    }

    fn has_transform(&self, handle: EntityHandle) -> bool {
        self.entities.get(handle).map_or(false, |entity| entity.transform_ready)
    }

    fn is_alive(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(handle)
    }

    fn set_position(&mut self, handle: EntityHandle, position: Vec3) -> Result<(), BackendError> {
        self.live_mut(handle)?.position = Some(position);
        Ok(())
    }

    fn set_facing(&mut self, handle: EntityHandle, rotation: Quat) -> Result<(), BackendError> {
        self.live_mut(handle)?.facing = Some(rotation);
        Ok(())
    }

    fn set_visible(&mut self, handle: EntityHandle, visible: bool) -> Result<(), BackendError> {
        self.live_mut(handle)?.visible = visible;
        Ok(())
    }

    fn detach(&mut self, handle: EntityHandle) {
        let frame = self.frame;
        if let Some(entity) = self.entities.get_mut(handle) {
            if entity.attached {
                entity.attached = false;
                self.removal_log.push((entity.id.clone(), frame));
            }
        }
    }

    fn release_resources(&mut self, handle: EntityHandle) {
        if self.entities.remove(handle).is_some() {
            self.released += 1;
        }
    }

    fn document_mut(&mut self, handle: EntityHandle) -> Option<&mut dyn BackingDocument> {
        self.entities
            .get_mut(handle)?
            .document
            .as_mut()
            .map(|document| document as &mut dyn BackingDocument)
    }

    fn open_popup(&mut self, popup: Popup) {
        log::debug!("Popup: {:?} {}", popup.kind, popup.source);
        self.popups.push(popup);
    }

    fn drain_interactions(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.interactions)
    }

    fn apply_theme(&mut self, theme: &ColorTheme) {
        self.theme = Some(theme.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str) -> EntityDescriptor {
        EntityDescriptor {
            id: id.to_string(),
            template: EntityTemplate::MediaPanel,
            max_width: 1.0,
            max_height: 1.0,
            position: Vec3::zeros(),
        }
    }

    #[test]
    fn test_transform_and_document_latency() {
        let mut backend = HeadlessBackend::new(HeadlessConfig {
            transform_latency_frames: 1,
            document_latency_frames: 3,
            ..HeadlessConfig::default()
        });
        let handle = backend.create_entity(&descriptor("a")).expect("create");

        assert!(!backend.has_transform(handle));
        backend.advance_frame(0.016);
        assert!(backend.has_transform(handle));
        assert!(backend.document(handle).is_none());

        backend.advance_frame(0.016);
        backend.advance_frame(0.016);
        assert!(backend.document(handle).is_some());
        assert!(!backend.entity(handle).map_or(true, |e| e.visible));
    }

    #[test]
    fn test_navigation_portal_has_no_media_element() {
        let mut backend = HeadlessBackend::immediate();
        let mut nav = descriptor("nav");
        nav.template = EntityTemplate::NavigationPortal;
        let handle = backend.create_entity(&nav).expect("create");

        let document = backend.document(handle).expect("document");
        assert!(document.has_element(ElementRole::Interact));
        assert!(!document.has_element(ElementRole::Media));
    }

    #[test]
    fn test_detach_and_release() {
        let mut backend = HeadlessBackend::immediate();
        let handle = backend.create_entity(&descriptor("a")).expect("create");

        backend.detach(handle);
        backend.detach(handle);
        assert_eq!(backend.removal_log().len(), 1);
        assert_eq!(backend.attached_count(), 0);

        backend.release_resources(handle);
        backend.release_resources(handle);
        assert_eq!(backend.released_count(), 1);
        assert!(!backend.is_alive(handle));
        assert!(backend.set_visible(handle, true).is_err());
    }

    #[test]
    fn test_stalled_entities_never_ready() {
        let mut backend = HeadlessBackend::immediate();
        backend.stall_transform_for("a");
        let handle = backend.create_entity(&descriptor("a")).expect("create");
        for _ in 0..10 {
            backend.advance_frame(0.016);
        }
        assert!(!backend.has_transform(handle));

        let direct = backend.instantiate_direct(&descriptor("a")).expect("direct");
        assert!(backend.has_transform(direct));
    }
}
