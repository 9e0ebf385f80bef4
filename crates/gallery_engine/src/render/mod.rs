//! Rendering boundary and the headless backend

pub mod backend;
pub mod headless;

pub use backend::{
    BackendError, BackingDocument, ElementMarker, ElementRole, EntityDescriptor, EntityHandle, EntityTemplate,
    InlineMedia, InteractAction, InteractionEvent, Popup, RenderBackend, TextMechanism,
};
pub use headless::{CreationPath, HeadlessBackend, HeadlessConfig, HeadlessDocument, HeadlessElement, HeadlessEntity};
