//! Error taxonomy for the gallery engine
//!
//! Each failure domain has its own enum so callers can decide how far a
//! failure propagates: panel-level errors are logged and skipped, room-level
//! errors degrade a room, and transition errors end a single transition.

use crate::config::ConfigError;
use crate::render::BackendError;
use thiserror::Error;

/// Malformed or missing content
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    /// The portfolio has no rooms at all
    #[error("Portfolio '{portfolio}' has no rooms")]
    NoRooms {
        /// Portfolio id
        portfolio: String,
    },

    /// A room id was requested that the snapshot does not contain
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    /// The content collaborator failed
    #[error("Content source error: {0}")]
    Source(String),

    /// Content could not be parsed
    #[error("Content parse error: {0}")]
    Parse(String),
}

/// Spatial entity creation failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProvisionError {
    /// The backend never confirmed the entity's transform
    #[error("Entity '{id}' was not ready after {waited_ms}ms ({attempts} attempts)")]
    Timeout {
        /// Entity id
        id: String,
        /// Accumulated frame time spent waiting
        waited_ms: u128,
        /// Readiness checks performed
        attempts: u32,
    },

    /// The backend refused to create the entity
    #[error("Entity '{id}' creation rejected: {source}")]
    Rejected {
        /// Entity id
        id: String,
        /// Backend error
        source: BackendError,
    },

    /// The direct-instantiation fallback did not produce a usable entity
    #[error("Entity '{id}' fallback creation failed: {reason}")]
    FallbackFailed {
        /// Entity id
        id: String,
        /// Human-readable reason
        reason: String,
    },
}

impl ProvisionError {
    /// Id of the entity that failed
    pub fn entity_id(&self) -> &str {
        match self {
            Self::Timeout { id, .. } | Self::Rejected { id, .. } | Self::FallbackFailed { id, .. } => id,
        }
    }
}

/// Content binding failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    /// A named sub-element never appeared in the backing document
    #[error("Entity '{id}' document never exposed element '{element}' ({attempts} attempts)")]
    ElementMissing {
        /// Entity id
        id: String,
        /// Element name
        element: &'static str,
        /// Readiness checks performed
        attempts: u32,
    },

    /// The backing document never appeared
    #[error("Entity '{id}' document never became available ({attempts} attempts)")]
    DocumentMissing {
        /// Entity id
        id: String,
        /// Readiness checks performed
        attempts: u32,
    },

    /// The entity was removed while binding was still in flight
    #[error("Entity '{id}' is no longer tracked")]
    EntityGone {
        /// Entity id
        id: String,
    },
}

/// A scene transition failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// The scene's build step could not obtain content
    #[error("Scene '{scene}' build failed: {source}")]
    Build {
        /// Scene label
        scene: String,
        /// Underlying content error
        source: ContentError,
    },

    /// The scene was asked to advance after it was disposed
    #[error("Scene '{0}' was disposed during build")]
    Disposed(String),
}

/// Umbrella error for applications embedding the engine
#[derive(Error, Debug)]
pub enum GalleryError {
    /// Content error
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Provisioning error
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// Binding error
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Transition error
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Backend error
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}
