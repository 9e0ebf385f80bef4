//! Content Binder
//!
//! Writes titles, media and interaction handlers into an entity's backing
//! document. Documents appear some frames after their entity, so binding is a
//! [`BindTask`] polled once per frame under a bounded [`FramePoll`].

use super::navigation::NavigationEdge;
use super::provisioner::SpatialEntity;
use crate::content::{MediaKind, Panel};
use crate::core::config::BindConfig;
use crate::error::BindError;
use crate::foundation::poll::{FramePoll, PollState};
use crate::render::{
    BackingDocument, ElementMarker, ElementRole, EntityHandle, InlineMedia, InteractAction, RenderBackend,
    TextMechanism,
};

/// Content written into one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelContent {
    /// Title text
    pub title: String,
    /// Subtitle text; not written when empty
    pub subtitle: String,
    /// Inline image
    pub image_source: Option<String>,
    /// Video; inline only when there is no image
    pub video_source: Option<String>,
    /// Explicit interaction; derived from the media when unset
    pub on_interact: Option<InteractAction>,
}

impl PanelContent {
    /// Content of a media panel
    ///
    /// A video with a thumbnail shows the thumbnail inline and plays the video
    /// in a popup.
    pub fn for_panel(panel: &Panel) -> Self {
        let media = &panel.media;
        let (image_source, video_source) = match media.kind {
            MediaKind::Image => (Some(media.url.clone()), None),
            MediaKind::Video => (media.thumbnail.clone(), Some(media.url.clone())),
            MediaKind::Other => (None, None),
        };

        Self {
            title: panel.title.clone(),
            subtitle: panel.subtitle.clone(),
            image_source,
            video_source,
            on_interact: None,
        }
    }

    /// Content of a navigation entity
    pub fn for_edge(edge: &NavigationEdge) -> Self {
        Self {
            title: edge.label.clone(),
            subtitle: String::new(),
            image_source: None,
            video_source: None,
            on_interact: Some(InteractAction::Navigate(edge.target.clone())),
        }
    }

    /// Media shown inline: the image when present, else the video
    pub fn inline_media(&self) -> Option<InlineMedia> {
        match (&self.image_source, &self.video_source) {
            (Some(image), _) => Some(InlineMedia::Image(image.clone())),
            (None, Some(video)) => Some(InlineMedia::Video(video.clone())),
            (None, None) => None,
        }
    }

    /// Action registered on the interact element
    pub fn interaction(&self) -> Option<InteractAction> {
        if let Some(action) = &self.on_interact {
            return Some(action.clone());
        }
        match (&self.image_source, &self.video_source) {
            (_, Some(video)) => Some(InteractAction::OpenMedia {
                source: video.clone(),
                kind: MediaKind::Video,
            }),
            (Some(image), None) => Some(InteractAction::OpenMedia {
                source: image.clone(),
                kind: MediaKind::Image,
            }),
            (None, None) => None,
        }
    }

    fn text_targets(&self) -> Vec<(ElementRole, &str)> {
        let mut targets = vec![(ElementRole::Title, self.title.as_str())];
        if !self.subtitle.is_empty() {
            targets.push((ElementRole::Subtitle, self.subtitle.as_str()));
        }
        targets
    }

    fn required_elements(&self) -> Vec<ElementRole> {
        let mut required: Vec<ElementRole> = self.text_targets().into_iter().map(|(role, _)| role).collect();
        if self.inline_media().is_some() {
            required.push(ElementRole::Media);
        }
        if self.interaction().is_some() {
            required.push(ElementRole::Interact);
        }
        required
    }
}

/// Summary of a finished binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindReport {
    /// Entity id
    pub entity_id: String,
    /// Readiness checks performed
    pub attempts: u32,
    /// Mechanism that set each text element
    pub text_mechanisms: Vec<(ElementRole, TextMechanism)>,
    /// Text elements no mechanism could set
    pub unverified_text: Vec<ElementRole>,
    /// True when this binding registered the interaction handler
    pub handler_registered: bool,
}

/// Result of advancing a [`BindTask`]
#[derive(Debug)]
pub enum BindStep {
    /// Content is in place
    Bound(BindReport),
    /// Still waiting on the document
    Pending,
    /// The document or one of its elements never appeared
    Failed(BindError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Missing {
    Document,
    Element(ElementRole),
    Text(Vec<ElementRole>),
}

/// In-flight binding of one entity
#[derive(Debug)]
pub struct BindTask {
    entity_id: String,
    handle: EntityHandle,
    content: PanelContent,
    poll: FramePoll,
    missing: Missing,
    mechanisms: Vec<(ElementRole, TextMechanism)>,
    handler_registered: bool,
}

impl BindTask {
    /// Entity id
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Entity handle
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Readiness checks performed so far
    pub fn attempts(&self) -> u32 {
        self.poll.attempts()
    }
}

/// Binds content onto provisioned entities
#[derive(Debug, Clone, Default)]
pub struct ContentBinder {
    config: BindConfig,
}

impl ContentBinder {
    /// Create a binder with the given limits
    pub fn new(config: BindConfig) -> Self {
        Self { config }
    }

    /// Start binding content onto an entity
    pub fn bind(&self, entity: &SpatialEntity, content: PanelContent) -> BindTask {
        BindTask {
            entity_id: entity.id.clone(),
            handle: entity.handle,
            content,
            poll: FramePoll::new(self.config.poll_policy()),
            missing: Missing::Document,
            mechanisms: Vec::new(),
            handler_registered: false,
        }
    }

    /// Advance a task by one frame
    pub fn advance(&self, task: &mut BindTask, backend: &mut dyn RenderBackend, delta_time: f32) -> BindStep {
        if !backend.is_alive(task.handle) {
            log::debug!("Entity '{}' vanished before binding finished", task.entity_id);
            return BindStep::Failed(BindError::EntityGone {
                id: task.entity_id.clone(),
            });
        }

        let handle = task.handle;
        let content = &task.content;
        let mechanisms = &mut task.mechanisms;
        let handler_registered = &mut task.handler_registered;
        let mut missing = task.missing.clone();

        let state = task.poll.tick(delta_time, || {
            let Some(document) = backend.document_mut(handle) else {
                missing = Missing::Document;
                return None;
            };
            match apply(document, content, mechanisms, handler_registered) {
                Ok(()) => Some(()),
                Err(m) => {
                    missing = m;
                    None
                }
            }
        });
        task.missing = missing;

        match state {
            PollState::Ready(()) => BindStep::Bound(report(task, Vec::new())),
            PollState::Pending => BindStep::Pending,
            PollState::Exhausted(exhausted) => match task.missing.clone() {
                Missing::Document => BindStep::Failed(BindError::DocumentMissing {
                    id: task.entity_id.clone(),
                    attempts: exhausted.attempts,
                }),
                Missing::Element(role) => BindStep::Failed(BindError::ElementMissing {
                    id: task.entity_id.clone(),
                    element: role.as_str(),
                    attempts: exhausted.attempts,
                }),
                Missing::Text(roles) => {
                    log::warn!(
                        "Entity '{}': no text mechanism applied {:?} after {} attempts, keeping placeholder text",
                        task.entity_id,
                        roles,
                        exhausted.attempts
                    );
                    BindStep::Bound(report(task, roles))
                }
            },
        }
    }
}

fn report(task: &BindTask, unverified_text: Vec<ElementRole>) -> BindReport {
    BindReport {
        entity_id: task.entity_id.clone(),
        attempts: task.poll.attempts(),
        text_mechanisms: task.mechanisms.clone(),
        unverified_text,
        handler_registered: task.handler_registered,
    }
}

/// One binding attempt against a populated document
fn apply(
    document: &mut dyn BackingDocument,
    content: &PanelContent,
    mechanisms: &mut Vec<(ElementRole, TextMechanism)>,
    handler_registered: &mut bool,
) -> Result<(), Missing> {
    if let Some(role) = content
        .required_elements()
        .into_iter()
        .find(|role| !document.has_element(*role))
    {
        return Err(Missing::Element(role));
    }

    if let Some(media) = content.inline_media() {
        if document.set_media(ElementRole::Media, media) {
            document.set_marker(ElementRole::Media, ElementMarker::MEDIA_SET);
        }
    }

    if let Some(action) = content.interaction() {
        if !document.marker(ElementRole::Interact).contains(ElementMarker::HANDLER_BOUND) {
            document.register_handler(ElementRole::Interact, action);
            document.set_marker(ElementRole::Interact, ElementMarker::HANDLER_BOUND);
            *handler_registered = true;
        }
    }

    let mut unverified = Vec::new();
    for (role, text) in content.text_targets() {
        if document.text(role) == Some(text) {
            continue;
        }
        match set_text_verified(document, role, text) {
            Some(mechanism) => {
                document.set_marker(role, ElementMarker::TEXT_SET);
                mechanisms.push((role, mechanism));
            }
            None => unverified.push(role),
        }
    }

    if unverified.is_empty() {
        Ok(())
    } else {
        Err(Missing::Text(unverified))
    }
}

/// Try each mechanism in order, reading back after each
fn set_text_verified(document: &mut dyn BackingDocument, role: ElementRole, text: &str) -> Option<TextMechanism> {
    TextMechanism::ORDER
        .into_iter()
        .find(|mechanism| document.set_text(role, *mechanism, text) && document.text(role) == Some(text))
}
