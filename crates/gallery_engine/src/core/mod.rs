//! # Core Engine Module
//!
//! Shared configuration for every subsystem of the gallery engine.

pub mod config;

pub use config::{BindConfig, Config, ConfigError, EngineConfig, GalleryConfig, ProvisionConfig, SceneConfig};
