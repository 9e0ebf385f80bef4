//! Spatial Layout Engine
//!
//! Maps ordered panel lists to 3D positions using named strategies, and
//! resolves portfolio templates into layout parameters and colors.

mod strategy;
mod templates;

pub use strategy::{grid_dimensions, layout, positions, LayoutParams, LayoutStrategy};
pub use templates::{ResolvedLayout, Template, TemplateRegistry, DEFAULT_TEMPLATE_ID};
