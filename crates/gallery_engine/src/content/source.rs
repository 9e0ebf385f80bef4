//! Content collaborator boundary
//!
//! The engine reads content through [`ContentSource`] and freezes it into a
//! [`ContentSnapshot`] before any scene is built. Scenes only ever see the
//! snapshot, shared read-only.

use super::model::{MediaItem, Portfolio, Room};
use crate::error::ContentError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read-only access to portfolio content
pub trait ContentSource {
    /// The portfolio itself
    fn fetch_portfolio(&self) -> Result<Portfolio, ContentError>;

    /// Rooms of the portfolio (media may be empty; see [`Self::fetch_media`])
    fn fetch_rooms(&self, portfolio_id: &str) -> Result<Vec<Room>, ContentError>;

    /// Ordered media of one room
    fn fetch_media(&self, room_id: &str) -> Result<Vec<MediaItem>, ContentError>;
}

/// Immutable portfolio content shared by every scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    /// Portfolio metadata
    pub portfolio: Portfolio,
    /// Rooms with their media
    #[serde(default)]
    pub rooms: Vec<Room>,
}

impl ContentSnapshot {
    /// Create a snapshot from already assembled content
    pub fn new(portfolio: Portfolio, rooms: Vec<Room>) -> Self {
        Self { portfolio, rooms }
    }

    /// Look up a room by id
    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == room_id)
    }

    /// Load a whole snapshot from a `.ron` document
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ContentError::Source(format!("{}: {}", path.display(), e)))?;
        ron::from_str(&contents).map_err(|e| ContentError::Parse(format!("{}: {}", path.display(), e)))
    }
}

/// Collect a snapshot from a content source
///
/// Portfolio and room list failures are fatal for the snapshot. A failed
/// media fetch only empties that room.
pub fn gather_snapshot(source: &dyn ContentSource) -> Result<ContentSnapshot, ContentError> {
    let portfolio = source.fetch_portfolio()?;
    let mut rooms = source.fetch_rooms(&portfolio.id)?;

    for room in &mut rooms {
        match source.fetch_media(&room.id) {
            Ok(media) => room.media = media,
            Err(e) => {
                log::warn!("Media for room '{}' unavailable, showing it empty: {}", room.id, e);
                room.media.clear();
            }
        }
    }

    Ok(ContentSnapshot { portfolio, rooms })
}

/// Content source backed by a RON portfolio document on disk
#[derive(Debug, Clone)]
pub struct RonContentSource {
    snapshot: ContentSnapshot,
}

impl RonContentSource {
    /// Read and parse the document
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        Ok(Self {
            snapshot: ContentSnapshot::load_ron(path)?,
        })
    }

    /// Wrap an in-memory snapshot
    pub fn from_snapshot(snapshot: ContentSnapshot) -> Self {
        Self { snapshot }
    }
}

impl ContentSource for RonContentSource {
    fn fetch_portfolio(&self) -> Result<Portfolio, ContentError> {
        Ok(self.snapshot.portfolio.clone())
    }

    fn fetch_rooms(&self, portfolio_id: &str) -> Result<Vec<Room>, ContentError> {
        if portfolio_id != self.snapshot.portfolio.id {
            return Err(ContentError::Source(format!("unknown portfolio '{}'", portfolio_id)));
        }
        Ok(self.snapshot.rooms.clone())
    }

    fn fetch_media(&self, room_id: &str) -> Result<Vec<MediaItem>, ContentError> {
        self.snapshot
            .room(room_id)
            .map(|room| room.media.clone())
            .ok_or_else(|| ContentError::RoomNotFound(room_id.to_string()))
    }
}
