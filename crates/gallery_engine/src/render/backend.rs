//! Rendering collaborator boundary
//!
//! The engine never talks to a concrete renderer. Entity creation, transform
//! readiness and the asynchronously populated backing documents all go
//! through [`RenderBackend`] and [`BackingDocument`], so a real renderer and
//! the in-memory [`HeadlessBackend`](super::HeadlessBackend) are
//! interchangeable.

use crate::content::{ColorTheme, MediaKind};
use crate::foundation::math::{Quat, Vec3};
use crate::scene::SceneDescriptor;
use bitflags::bitflags;
use std::fmt;
use thiserror::Error;

slotmap::new_key_type! {
    /// Backend-side handle of a spatial entity
    pub struct EntityHandle;
}

/// Prefab the backend instantiates for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTemplate {
    /// Framed media panel with title, subtitle, media and interact elements
    MediaPanel,
    /// Navigation portal with title, subtitle and interact elements
    NavigationPortal,
}

impl EntityTemplate {
    /// Template name as understood by backends
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MediaPanel => "media-panel",
            Self::NavigationPortal => "navigation-portal",
        }
    }
}

/// Everything needed to create one spatial entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    /// Entity id, unique within a scene
    pub id: String,
    /// Prefab to instantiate
    pub template: EntityTemplate,
    /// Maximum width in world units
    pub max_width: f32,
    /// Maximum height in world units
    pub max_height: f32,
    /// World position
    pub position: Vec3,
}

/// Named sub-element of a backing document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRole {
    /// Title text
    Title,
    /// Subtitle text
    Subtitle,
    /// Inline media surface
    Media,
    /// Clickable surface
    Interact,
}

impl ElementRole {
    /// All roles, in document order
    pub const ALL: [Self; 4] = [Self::Title, Self::Subtitle, Self::Media, Self::Interact];

    /// Element name inside the document
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Media => "media",
            Self::Interact => "interact",
        }
    }
}

impl fmt::Display for ElementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ways a document may accept text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextMechanism {
    /// Structured setter (preferred)
    Structured,
    /// Direct text assignment
    Direct,
    /// Alternate text assignment
    Alternate,
}

impl TextMechanism {
    /// Order in which the binder tries mechanisms
    pub const ORDER: [Self; 3] = [Self::Structured, Self::Direct, Self::Alternate];
}

/// Media shown inline on a media element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineMedia {
    /// Still image source
    Image(String),
    /// Video source
    Video(String),
}

bitflags! {
    /// Per-element markers kept by the document
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementMarker: u8 {
        /// An interaction handler has been registered
        const HANDLER_BOUND = 0b0001;
        /// Text has been set and verified
        const TEXT_SET = 0b0010;
        /// Inline media has been set
        const MEDIA_SET = 0b0100;
    }
}

/// What happens when an interact element is triggered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractAction {
    /// Change the active scene
    Navigate(SceneDescriptor),
    /// Show media in a popup
    OpenMedia {
        /// Media source
        source: String,
        /// Media kind
        kind: MediaKind,
    },
}

/// An interaction reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEvent {
    /// Entity that was interacted with
    pub handle: EntityHandle,
    /// Element that was triggered
    pub element: ElementRole,
    /// Registered action
    pub action: InteractAction,
}

/// Popup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    /// Media source
    pub source: String,
    /// Media kind
    pub kind: MediaKind,
}

/// Rendering backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Handle does not refer to a live entity
    #[error("Unknown entity handle {0:?}")]
    UnknownEntity(EntityHandle),

    /// The backend refused the request
    #[error("Backend rejected request: {0}")]
    Rejected(String),
}

/// Content-bindable document that appears some time after its entity
pub trait BackingDocument {
    /// True when the named sub-element exists
    fn has_element(&self, element: ElementRole) -> bool;

    /// Try to set text through one mechanism; false when unsupported
    ///
    /// A `true` return does not guarantee the text was applied; read it back
    /// with [`Self::text`].
    fn set_text(&mut self, element: ElementRole, mechanism: TextMechanism, text: &str) -> bool;

    /// Current text of an element
    fn text(&self, element: ElementRole) -> Option<&str>;

    /// Show media inline; false when the element cannot show it
    fn set_media(&mut self, element: ElementRole, media: InlineMedia) -> bool;

    /// Markers of an element
    fn marker(&self, element: ElementRole) -> ElementMarker;

    /// Add markers to an element
    fn set_marker(&mut self, element: ElementRole, marker: ElementMarker);

    /// Register an interaction handler on an element
    fn register_handler(&mut self, element: ElementRole, action: InteractAction);
}

/// The rendering collaborator
pub trait RenderBackend {
    /// Called once per frame before any readiness check
    fn advance_frame(&mut self, _delta_time: f32) {}

    /// Primary creation path; the transform appears asynchronously
    fn create_entity(&mut self, descriptor: &EntityDescriptor) -> Result<EntityHandle, BackendError>;

    /// Fallback creation path: direct instantiation
    fn instantiate_direct(&mut self, descriptor: &EntityDescriptor) -> Result<EntityHandle, BackendError>;

    /// True once the entity's transform is present
    fn has_transform(&self, handle: EntityHandle) -> bool;

    /// True while the entity exists
    fn is_alive(&self, handle: EntityHandle) -> bool;

    /// Set world position
    fn set_position(&mut self, handle: EntityHandle, position: Vec3) -> Result<(), BackendError>;

    /// Set world rotation
    fn set_facing(&mut self, handle: EntityHandle, rotation: Quat) -> Result<(), BackendError>;

    /// Show or hide the entity
    fn set_visible(&mut self, handle: EntityHandle, visible: bool) -> Result<(), BackendError>;

    /// Remove the entity from the spatial root
    fn detach(&mut self, handle: EntityHandle);

    /// Free geometry, material and document resources of the entity
    fn release_resources(&mut self, handle: EntityHandle);

    /// Backing document, once the backend has populated it
    fn document_mut(&mut self, handle: EntityHandle) -> Option<&mut dyn BackingDocument>;

    /// Show media in a popup
    fn open_popup(&mut self, popup: Popup);

    /// Interactions since the last call
    fn drain_interactions(&mut self) -> Vec<InteractionEvent>;

    /// Apply scene colors
    fn apply_theme(&mut self, _theme: &ColorTheme) {}
}
