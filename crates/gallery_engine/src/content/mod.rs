//! Content model, sources and the content transformer

pub mod model;
pub mod source;
mod transformer;

pub use model::{ColorTheme, MediaItem, MediaKind, Portfolio, PortfolioSettings, Room, Visibility};
pub use source::{gather_snapshot, ContentSnapshot, ContentSource, RonContentSource};
pub use transformer::{ContentTransformer, Panel, TransformedContent};
