//! Content model supplied by the content collaborator
//!
//! These types are read-only snapshots: the engine derives panels and scenes
//! from them but never mutates them.

use crate::layout::LayoutStrategy;
use serde::{Deserialize, Serialize};

/// Kind of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video clip
    Video,
    /// Anything else (documents, audio, ...); shown as a placeholder
    #[default]
    Other,
}

/// One media item inside a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Stable id
    pub id: String,

    /// Media kind
    #[serde(default)]
    pub kind: MediaKind,

    /// Source locator (URL or path)
    pub url: String,

    /// Explicit display name
    #[serde(default)]
    pub display_name: Option<String>,

    /// Explicit display title
    #[serde(default)]
    pub display_title: Option<String>,

    /// Poster image for videos
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl MediaItem {
    /// Create an untitled media item
    pub fn new(id: impl Into<String>, kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            url: url.into(),
            display_name: None,
            display_title: None,
            thumbnail: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.display_title = Some(title.into());
        self
    }

    /// Set the video poster image
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// File name of the source locator, without query, fragment or extension
    pub fn file_stem(&self) -> Option<&str> {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        let name = path.trim_end_matches('/').rsplit('/').next()?;
        let stem = match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        };
        if stem.trim().is_empty() {
            None
        } else {
            Some(stem)
        }
    }
}

/// A room ("project"): an ordered content unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Stable id
    pub id: String,

    /// Display title
    pub title: String,

    /// Description, used as panel subtitle fallback
    #[serde(default)]
    pub description: String,

    /// Ordinal position (0 = hub)
    #[serde(default)]
    pub ordinal: i32,

    /// Creation time (seconds since epoch), tie-breaker for ordinals
    #[serde(default)]
    pub created_at: u64,

    /// Ordered media
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

impl Room {
    /// Create an empty room
    pub fn new(id: impl Into<String>, title: impl Into<String>, ordinal: i32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            ordinal,
            created_at: 0,
            media: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the creation time
    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Replace the media list
    pub fn with_media(mut self, media: Vec<MediaItem>) -> Self {
        self.media = media;
        self
    }
}

/// Partial color theme; unset colors inherit from the template
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTheme {
    /// Scene background color (hex)
    pub background: Option<String>,
    /// Accent color for navigation entities (hex)
    pub accent: Option<String>,
    /// Text color (hex)
    pub text: Option<String>,
}

impl ColorTheme {
    /// Fully specified theme
    pub fn new(background: &str, accent: &str, text: &str) -> Self {
        Self {
            background: Some(background.to_string()),
            accent: Some(accent.to_string()),
            text: Some(text.to_string()),
        }
    }

    /// Colors from `overrides` where set, else from `self`
    pub fn overlaid_with(&self, overrides: &Self) -> Self {
        Self {
            background: overrides.background.clone().or_else(|| self.background.clone()),
            accent: overrides.accent.clone().or_else(|| self.accent.clone()),
            text: overrides.text.clone().or_else(|| self.text.clone()),
        }
    }
}

/// Portfolio visibility settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visibility {
    /// Listed publicly
    pub public: bool,
    /// Show panel subtitles
    pub show_subtitles: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            public: true,
            show_subtitles: true,
        }
    }
}

/// Normalized portfolio settings
///
/// Parsed from the raw settings payload; anything malformed becomes the
/// default (empty) settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSettings {
    /// Layout strategy override
    pub layout: Option<LayoutStrategy>,
    /// Spacing override
    pub spacing: Option<f32>,
    /// Grid column override
    pub columns: Option<u32>,
}

impl PortfolioSettings {
    /// Parse a raw RON settings payload
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };

        match ron::from_str::<Self>(raw) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Malformed portfolio settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// True when no override is set
    pub fn is_empty(&self) -> bool {
        self.layout.is_none() && self.spacing.is_none() && self.columns.is_none()
    }
}

/// Portfolio: the top-level content collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Stable id
    pub id: String,

    /// Display title
    pub title: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Template identifier (unknown ids resolve to the default template)
    #[serde(default)]
    pub template_id: String,

    /// Raw settings payload (RON)
    #[serde(default)]
    pub settings: Option<String>,

    /// Color overrides
    #[serde(default)]
    pub colors: ColorTheme,

    /// Visibility settings
    #[serde(default)]
    pub visibility: Visibility,
}

impl Portfolio {
    /// Create a portfolio using the given template
    pub fn new(id: impl Into<String>, title: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            template_id: template_id.into(),
            settings: None,
            colors: ColorTheme::default(),
            visibility: Visibility::default(),
        }
    }

    /// Normalized settings
    pub fn normalized_settings(&self) -> PortfolioSettings {
        PortfolioSettings::normalize(self.settings.as_deref())
    }
}
