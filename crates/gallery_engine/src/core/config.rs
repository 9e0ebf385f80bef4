//! # Gallery Configuration
//!
//! All tunables of the engine in one serializable tree. Every section has
//! defaults matching the engine's documented behavior, so an empty file (or
//! no file) yields a working configuration.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging and frame pacing of the host loop
//! - **Provision Config**: entity creation timeouts and fallback behavior
//! - **Bind Config**: document polling limits
//! - **Scene Config**: focal point, navigation row and default template

use crate::foundation::math::Vec3;
use crate::foundation::poll::PollPolicy;
use crate::layout::Template;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Host-loop behavior: log level and frame pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Target frame rate of the host loop
    pub target_fps: u32,
    /// Frames the demo viewer runs per navigation step
    pub frame_budget: u32,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            target_fps: 60,
            frame_budget: 600,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Frame time in seconds at the target frame rate
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.target_fps == 0 {
            return Err("Target FPS must be at least 1".to_string());
        }
        if self.frame_budget == 0 {
            return Err("Frame budget must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Provision Configuration
///
/// Limits for creating spatial entities and the sizes they are created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Hard timeout of the primary path, in accumulated frame time
    pub timeout_ms: u64,
    /// Readiness checks before the primary path gives up
    pub max_attempts: u32,
    /// Frames between readiness checks
    pub interval_frames: u32,
    /// Frames to wait after direct instantiation before checking it
    pub fallback_settle_frames: u32,
    /// Maximum panel size (width, height)
    pub panel_size: (f32, f32),
    /// Maximum navigation entity size (width, height)
    pub navigation_size: (f32, f32),
}

impl ProvisionConfig {
    /// Poll limits of the primary creation path
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::every_frame(self.max_attempts)
            .with_interval(self.interval_frames)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("Provision timeout must be positive".to_string());
        }
        if self.max_attempts == 0 {
            return Err("Provision attempts must be at least 1".to_string());
        }
        let sizes = [self.panel_size, self.navigation_size];
        if sizes.iter().any(|(w, h)| *w <= 0.0 || *h <= 0.0) {
            return Err("Entity sizes must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            max_attempts: 240,
            interval_frames: 1,
            fallback_settle_frames: 2,
            panel_size: (1.6, 1.2),
            navigation_size: (1.0, 0.4),
        }
    }
}

/// # Bind Configuration
///
/// Limits for waiting on backing documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Readiness checks before binding gives up
    pub max_attempts: u32,
    /// Frames between readiness checks
    pub interval_frames: u32,
    /// Time budget in accumulated frame time (`None` = attempts only)
    pub timeout_ms: Option<u64>,
}

impl BindConfig {
    /// Poll limits of one binding task
    pub fn poll_policy(&self) -> PollPolicy {
        let policy = PollPolicy::every_frame(self.max_attempts).with_interval(self.interval_frames);
        match self.timeout_ms {
            Some(ms) => policy.with_timeout(Duration::from_millis(ms)),
            None => policy,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("Bind attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            max_attempts: 200,
            interval_frames: 1,
            timeout_ms: Some(10_000),
        }
    }
}

/// # Scene Configuration
///
/// Scene-wide placement shared by every template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Point every entity faces
    pub focal_point: Vec3,
    /// Center of the navigation row
    pub navigation_base: Vec3,
    /// Distance between navigation entities
    pub navigation_spacing: f32,
    /// Template used for unknown template ids
    pub default_template: String,
}

impl SceneConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.navigation_spacing <= 0.0 {
            return Err("Navigation spacing must be positive".to_string());
        }
        if self.default_template.trim().is_empty() {
            return Err("Default template id cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            focal_point: Vec3::new(0.0, 1.6, 0.0),
            navigation_base: Vec3::new(0.0, 0.4, -2.0),
            navigation_spacing: 1.2,
            default_template: crate::layout::DEFAULT_TEMPLATE_ID.to_string(),
        }
    }
}

/// # Complete Gallery Configuration
///
/// Top-level configuration applications load from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Host-loop configuration
    pub engine: EngineConfig,
    /// Entity creation configuration
    pub provision: ProvisionConfig,
    /// Content binding configuration
    pub bind: BindConfig,
    /// Scene placement configuration
    pub scene: SceneConfig,
    /// Extra templates, merged over the built-ins
    pub templates: Vec<Template>,
}

impl GalleryConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        self.provision.validate()?;
        self.bind.validate()?;
        self.scene.validate()?;

        if let Some(template) = self.templates.iter().find(|t| t.id.trim().is_empty()) {
            return Err(format!("Template with strategy '{}' has an empty id", template.strategy));
        }
        Ok(())
    }

    /// Validate, mapping failures to [`ConfigError::Invalid`]
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map_err(ConfigError::Invalid)?;
        Ok(self)
    }
}

impl Config for GalleryConfig {}
