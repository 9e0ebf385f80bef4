//! Templates: named bundles of layout and color parameters
//!
//! A portfolio names its template by id. Unknown ids never fail; they resolve
//! to the registry's default template.

use super::strategy::{LayoutParams, LayoutStrategy};
use crate::content::{ColorTheme, Portfolio};
use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Id of the template used when nothing else matches
pub const DEFAULT_TEMPLATE_ID: &str = "gallery";

/// Layout and colors applied when building a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template id
    pub id: String,

    /// Panel placement strategy
    pub strategy: LayoutStrategy,

    /// Placement parameters
    #[serde(default)]
    pub params: LayoutParams,

    /// Default colors
    #[serde(default)]
    pub colors: ColorTheme,
}

impl Template {
    /// Create a template with default parameters
    pub fn new(id: impl Into<String>, strategy: LayoutStrategy) -> Self {
        Self {
            id: id.into(),
            strategy,
            params: LayoutParams::default(),
            colors: ColorTheme::default(),
        }
    }

    /// Set placement parameters
    pub fn with_params(mut self, params: LayoutParams) -> Self {
        self.params = params;
        self
    }

    /// Set default colors
    pub fn with_colors(mut self, colors: ColorTheme) -> Self {
        self.colors = colors;
        self
    }
}

/// Layout resolved for one portfolio
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    /// Template id actually used
    pub template_id: String,
    /// Strategy after settings overrides
    pub strategy: LayoutStrategy,
    /// Parameters after settings overrides
    pub params: LayoutParams,
    /// Colors after portfolio overrides
    pub theme: ColorTheme,
}

/// Registry of known templates
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
    default_id: String,
}

impl TemplateRegistry {
    /// Registry with the built-in templates
    pub fn new() -> Self {
        let mut registry = Self {
            templates: HashMap::new(),
            default_id: DEFAULT_TEMPLATE_ID.to_string(),
        };
        for template in Self::builtins() {
            registry.register(template);
        }
        registry
    }

    /// Built-in templates: `gallery`, `grid` and `tower`
    pub fn builtins() -> Vec<Template> {
        vec![
            Template::new(DEFAULT_TEMPLATE_ID, LayoutStrategy::Horizontal)
                .with_colors(ColorTheme::new("#101418", "#e0a458", "#f4f4f4")),
            Template::new("grid", LayoutStrategy::Grid)
                .with_params(LayoutParams {
                    spacing: 1.7,
                    row_spacing: 1.3,
                    columns: 3,
                    ..LayoutParams::default()
                })
                .with_colors(ColorTheme::new("#f5f2eb", "#2b59c3", "#1b1b1b")),
            Template::new("tower", LayoutStrategy::Vertical)
                .with_params(LayoutParams {
                    spacing: 1.3,
                    base: Vec3::new(0.0, 3.2, -3.0),
                    ..LayoutParams::default()
                })
                .with_colors(ColorTheme::new("#000000", "#7fdbca", "#ffffff")),
        ]
    }

    /// Add or replace a template
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Change the fallback template; ignored when the id is unknown
    pub fn set_default(&mut self, id: &str) -> bool {
        if self.templates.contains_key(id) {
            self.default_id = id.to_string();
            true
        } else {
            log::warn!("Default template '{}' is not registered, keeping '{}'", id, self.default_id);
            false
        }
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when no template is registered
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Look up a template without fallback
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    /// Look up a template, falling back to the default
    pub fn resolve(&self, id: &str) -> Template {
        if let Some(template) = self.templates.get(id) {
            return template.clone();
        }
        log::debug!("Unknown template '{}', using '{}'", id, self.default_id);
        self.templates
            .get(&self.default_id)
            .cloned()
            .unwrap_or_else(|| Template::new(DEFAULT_TEMPLATE_ID, LayoutStrategy::Horizontal))
    }

    /// Apply a portfolio's template, settings and color overrides
    pub fn resolve_for(&self, portfolio: &Portfolio) -> ResolvedLayout {
        let template = self.resolve(&portfolio.template_id);
        let settings = portfolio.normalized_settings();

        let mut params = template.params.clone();
        if let Some(spacing) = settings.spacing.filter(|s| s.is_finite()) {
            params.spacing = spacing;
        }
        if let Some(columns) = settings.columns {
            params.columns = columns;
        }

        ResolvedLayout {
            strategy: settings.layout.unwrap_or(template.strategy),
            theme: template.colors.overlaid_with(&portfolio.colors),
            template_id: template.id,
            params,
        }
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
