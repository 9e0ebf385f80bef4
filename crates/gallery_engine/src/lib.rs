//! # Gallery Engine
//!
//! Turns a portfolio of ordered rooms and media into navigable 3D scenes whose
//! entities are created and populated asynchronously by a rendering backend.
//!
//! ## Features
//!
//! - **Content Transformer**: hub selection, room ordering and panel derivation
//! - **Layout Engine**: horizontal, grid and vertical placement with templates
//! - **Entity Provisioner**: bounded readiness polling with a direct-instantiation fallback
//! - **Content Binder**: text, media and interaction binding onto late documents
//! - **Scene Lifecycle**: serialized transitions with a single active scene
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gallery_engine::prelude::*;
//!
//! fn main() -> Result<(), GalleryError> {
//!     let snapshot = ContentSnapshot::load_ron("portfolio.ron")?;
//!     let config = GalleryConfig::default();
//!
//!     let mut manager = SceneLifecycleManager::new(HeadlessBackend::default(), &config);
//!     manager.load_scene(SceneDescriptor::Hub, SceneContext::new(snapshot));
//!
//!     while manager.is_loading() {
//!         manager.update(config.engine.frame_delta());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod analytics;
pub mod config;
pub mod content;
pub mod core;
pub mod error;
pub mod foundation;
pub mod layout;
pub mod render;
pub mod scene;

pub use error::{BindError, ContentError, GalleryError, ProvisionError, TransitionError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        analytics::{AnalyticsEvent, AnalyticsSink, LogAnalytics, MemoryAnalytics, NullAnalytics},
        config::Config,
        content::{
            gather_snapshot, ContentSnapshot, ContentSource, MediaItem, MediaKind, Portfolio, RonContentSource,
            Room,
        },
        core::config::GalleryConfig,
        error::{BindError, ContentError, GalleryError, ProvisionError, TransitionError},
        foundation::math::{Quat, Vec3},
        layout::{LayoutParams, LayoutStrategy, Template, TemplateRegistry},
        render::{HeadlessBackend, HeadlessConfig, RenderBackend},
        scene::{LoadOutcome, SceneContext, SceneDescriptor, SceneLifecycleManager},
    };
}
