//! Scene descriptors, navigation edges and the shared scene context

use crate::content::{ContentSnapshot, ContentTransformer, Room};
use std::fmt;
use std::sync::Arc;

/// Which scene to show
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneDescriptor {
    /// The portfolio's hub room
    Hub,
    /// A non-hub room
    Room {
        /// Room id
        room_id: String,
    },
}

impl SceneDescriptor {
    /// Descriptor for a room
    pub fn room(room_id: impl Into<String>) -> Self {
        Self::Room { room_id: room_id.into() }
    }

    /// True for the hub
    pub fn is_hub(&self) -> bool {
        matches!(self, Self::Hub)
    }

    /// Key used in entity ids
    ///
    /// Room keys carry a `room:` prefix so a room whose id is `hub` never
    /// collides with the hub itself.
    pub fn key(&self) -> String {
        match self {
            Self::Hub => "hub".to_string(),
            Self::Room { room_id } => format!("room:{}", room_id),
        }
    }
}

impl fmt::Display for SceneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hub => f.write_str("hub"),
            Self::Room { room_id } => write!(f, "room:{}", room_id),
        }
    }
}

/// A directed link from one scene to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEdge {
    /// Destination
    pub target: SceneDescriptor,
    /// Label shown on the navigation entity
    pub label: String,
}

impl NavigationEdge {
    /// Edge to a room
    pub fn to_room(room: &Room) -> Self {
        Self {
            target: SceneDescriptor::room(&room.id),
            label: room.title.clone(),
        }
    }

    /// Edge back to the hub
    pub fn to_hub(hub_title: &str) -> Self {
        Self {
            target: SceneDescriptor::Hub,
            label: format!("Back to {}", hub_title),
        }
    }
}

/// Edges of the hub: one per non-hub room, in display order
pub fn hub_edges(other_rooms: &[Room]) -> Vec<NavigationEdge> {
    other_rooms.iter().map(NavigationEdge::to_room).collect()
}

/// Edges of a room: back to the hub, then every other non-hub room
///
/// Every room links to every other room, so any two rooms are at most two
/// hops apart (one through the hub, or one direct).
pub fn room_edges(current_room_id: &str, hub: &Room, other_rooms: &[Room]) -> Vec<NavigationEdge> {
    std::iter::once(NavigationEdge::to_hub(&hub.title))
        .chain(
            other_rooms
                .iter()
                .filter(|room| room.id != current_room_id)
                .map(NavigationEdge::to_room),
        )
        .collect()
}

/// Immutable content shared by every scene the manager builds
#[derive(Debug, Clone)]
pub struct SceneContext {
    snapshot: Arc<ContentSnapshot>,
}

impl SceneContext {
    /// Wrap a snapshot
    pub fn new(snapshot: ContentSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    /// Share an existing snapshot
    pub fn from_shared(snapshot: Arc<ContentSnapshot>) -> Self {
        Self { snapshot }
    }

    /// The content snapshot
    pub fn snapshot(&self) -> &ContentSnapshot {
        &self.snapshot
    }

    /// Shared handle to the snapshot
    pub fn shared(&self) -> Arc<ContentSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Hub room and the remaining rooms in display order
    pub fn split_rooms(&self) -> Option<(Room, Vec<Room>)> {
        let mut sorted = ContentTransformer::sorted_rooms(&self.snapshot.rooms);
        let hub_index = ContentTransformer::hub_index(&sorted)?;
        let hub = sorted.remove(hub_index);
        Some((hub, sorted))
    }
}
