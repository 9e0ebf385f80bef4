//! Content Transformer
//!
//! Normalizes raw rooms and media into ordered panel lists and selects the
//! hub room. Everything here is a pure function of its inputs; panels are
//! rebuilt every time a scene is built.

use super::model::{MediaItem, Portfolio, Room, Visibility};
use crate::error::ContentError;
use std::cmp::Ordering;

/// One renderable unit bound to exactly one media item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    /// Panel id, unique within a portfolio
    pub id: String,
    /// Display title
    pub title: String,
    /// Display subtitle (may be empty)
    pub subtitle: String,
    /// The media item this panel shows
    pub media: MediaItem,
    /// Position in the room's media order
    pub slot: usize,
}

/// Output of [`ContentTransformer::transform`]
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedContent {
    /// The hub room
    pub hub: Room,
    /// Panels of the hub room
    pub hub_panels: Vec<Panel>,
    /// Every other room, in display order
    pub other_rooms: Vec<Room>,
}

/// Stateless content normalizer
pub struct ContentTransformer;

impl ContentTransformer {
    /// Room display order: ordinal ascending, then creation time ascending
    pub fn compare_rooms(a: &Room, b: &Room) -> Ordering {
        a.ordinal
            .cmp(&b.ordinal)
            .then_with(|| a.created_at.cmp(&b.created_at))
    }

    /// Rooms sorted into display order (stable for full ties)
    pub fn sorted_rooms(rooms: &[Room]) -> Vec<Room> {
        let mut sorted = rooms.to_vec();
        sorted.sort_by(Self::compare_rooms);
        sorted
    }

    /// Index of the hub within an already sorted room list
    ///
    /// The ordinal-0 room wins; without one the first sorted room is the hub.
    pub fn hub_index(sorted: &[Room]) -> Option<usize> {
        if sorted.is_empty() {
            return None;
        }
        Some(sorted.iter().position(|room| room.ordinal == 0).unwrap_or(0))
    }

    /// Split rooms into hub panels and the remaining rooms
    pub fn transform(portfolio: &Portfolio, rooms: &[Room]) -> Result<TransformedContent, ContentError> {
        let mut sorted = Self::sorted_rooms(rooms);
        let hub_index = Self::hub_index(&sorted).ok_or_else(|| ContentError::NoRooms {
            portfolio: portfolio.id.clone(),
        })?;

        let hub = sorted.remove(hub_index);
        let hub_panels = Self::panels_for_room(&hub, portfolio.visibility);

        log::debug!(
            "Portfolio '{}': hub '{}' with {} panels, {} other rooms",
            portfolio.id,
            hub.id,
            hub_panels.len(),
            sorted.len()
        );

        Ok(TransformedContent {
            hub,
            hub_panels,
            other_rooms: sorted,
        })
    }

    /// Derive one panel per media item, preserving order
    pub fn panels_for_room(room: &Room, visibility: Visibility) -> Vec<Panel> {
        if room.media.is_empty() {
            log::debug!("Room '{}' has no media, no panels derived", room.id);
            return Vec::new();
        }

        room.media
            .iter()
            .enumerate()
            .map(|(slot, media)| Panel {
                id: format!("panel-{}-{}", room.id, slot),
                title: Self::panel_title(room, media, slot),
                subtitle: if visibility.show_subtitles {
                    Self::panel_subtitle(room, media)
                } else {
                    String::new()
                },
                media: media.clone(),
                slot,
            })
            .collect()
    }

    /// Title chain: display name, display title, file name, synthesized
    pub fn panel_title(room: &Room, media: &MediaItem, slot: usize) -> String {
        non_blank(media.display_name.as_deref())
            .or_else(|| non_blank(media.display_title.as_deref()))
            .or_else(|| media.file_stem())
            .map_or_else(
                || format!("{} — Panel {}", room.title, slot + 1),
                str::to_string,
            )
    }

    /// Subtitle chain: media title, room description, empty
    pub fn panel_subtitle(room: &Room, media: &MediaItem) -> String {
        non_blank(media.display_title.as_deref())
            .or_else(|| non_blank(Some(room.description.as_str())))
            .unwrap_or_default()
            .to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::MediaKind;

    fn media(id: &str, kind: MediaKind) -> MediaItem {
        MediaItem::new(id, kind, format!("https://cdn.example.com/{}.bin", id))
    }

    fn room_with(id: &str, ordinal: i32, created_at: u64, media_count: usize) -> Room {
        let items = (0..media_count)
            .map(|i| media(&format!("{}-m{}", id, i), MediaKind::Image))
            .collect();
        Room::new(id, format!("Room {}", id), ordinal)
            .with_created_at(created_at)
            .with_media(items)
    }

    fn portfolio() -> Portfolio {
        Portfolio::new("p1", "Portfolio", "gallery")
    }

    #[test]
    fn test_ordinals_and_media_counts() {
        // ordinals [0, 2, 1], media counts [2, 0, 3]
        let rooms = vec![
            room_with("a", 0, 10, 2),
            room_with("b", 2, 11, 0),
            room_with("c", 1, 12, 3),
        ];

        let out = ContentTransformer::transform(&portfolio(), &rooms).expect("transform");
        assert_eq!(out.hub.id, "a");
        assert_eq!(out.hub_panels.len(), 2);
        let others: Vec<&str> = out.other_rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(others, vec!["c", "b"]);
    }

    #[test]
    fn test_exactly_one_hub_without_ordinal_zero() {
        let rooms = vec![
            room_with("late", 3, 50, 1),
            room_with("early", 3, 20, 1),
            room_with("mid", 5, 1, 1),
        ];
        let out = ContentTransformer::transform(&portfolio(), &rooms).expect("transform");
        assert_eq!(out.hub.id, "early");
        assert_eq!(out.other_rooms.len(), 2);
        assert!(out.other_rooms.iter().all(|r| r.id != "early"));
    }

    #[test]
    fn test_ordinal_zero_wins_over_negative() {
        let rooms = vec![room_with("neg", -1, 0, 1), room_with("zero", 0, 0, 1)];
        let out = ContentTransformer::transform(&portfolio(), &rooms).expect("transform");
        assert_eq!(out.hub.id, "zero");
        assert_eq!(out.other_rooms[0].id, "neg");
    }

    #[test]
    fn test_hub_selection_for_many_lists() {
        for n in 1..8usize {
            let rooms: Vec<Room> = (0..n)
                .map(|i| room_with(&format!("r{}", i), (n - i) as i32, i as u64, 1))
                .collect();
            let out = ContentTransformer::transform(&portfolio(), &rooms).expect("transform");
            assert_eq!(out.other_rooms.len() + 1, n);
        }
    }

    #[test]
    fn test_no_rooms_is_content_error() {
        let err = ContentTransformer::transform(&portfolio(), &[]).unwrap_err();
        assert_eq!(err, ContentError::NoRooms { portfolio: "p1".to_string() });
    }

    #[test]
    fn test_image_and_video_panels() {
        let img1 = MediaItem::new("img1", MediaKind::Image, "https://cdn.example.com/img1.jpg");
        let vid1 = MediaItem::new("vid1", MediaKind::Video, "https://cdn.example.com/vid1.mp4");
        let room = Room::new("a", "Room A", 0).with_media(vec![img1.clone(), vid1.clone()]);

        let panels = ContentTransformer::panels_for_room(&room, Visibility::default());
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].title, "img1");
        assert_eq!(panels[0].media, img1);
        assert_eq!(panels[1].title, "vid1");
        assert_eq!(panels[1].media, vid1);
        assert_eq!(panels[1].slot, 1);
    }

    #[test]
    fn test_title_fallback_chain() {
        let room = Room::new("a", "Studio", 0).with_description("Studio work");

        let named = MediaItem::new("m", MediaKind::Image, "x/file.png")
            .with_name("Name")
            .with_title("Title");
        assert_eq!(ContentTransformer::panel_title(&room, &named, 0), "Name");

        let titled = MediaItem::new("m", MediaKind::Image, "x/file.png").with_title("Title");
        assert_eq!(ContentTransformer::panel_title(&room, &titled, 0), "Title");

        let blank_name = MediaItem::new("m", MediaKind::Image, "x/file.png").with_name("  ");
        assert_eq!(ContentTransformer::panel_title(&room, &blank_name, 0), "file");

        let bare = MediaItem::new("m", MediaKind::Other, "");
        assert_eq!(ContentTransformer::panel_title(&room, &bare, 2), "Studio — Panel 3");
    }

    #[test]
    fn test_subtitle_prefers_media_title() {
        let room = Room::new("a", "Studio", 0).with_description("Studio work");
        let titled = MediaItem::new("m", MediaKind::Image, "f.png").with_title("Dusk");
        let plain = MediaItem::new("m", MediaKind::Image, "f.png");

        assert_eq!(ContentTransformer::panel_subtitle(&room, &titled), "Dusk");
        assert_eq!(ContentTransformer::panel_subtitle(&room, &plain), "Studio work");
        assert_eq!(ContentTransformer::panel_subtitle(&Room::new("b", "B", 1), &plain), "");
    }

    #[test]
    fn test_hidden_subtitles() {
        let room = room_with("a", 0, 0, 2).with_description("described");
        let visibility = Visibility {
            show_subtitles: false,
            ..Visibility::default()
        };
        let panels = ContentTransformer::panels_for_room(&room, visibility);
        assert!(panels.iter().all(|p| p.subtitle.is_empty()));
    }

    #[test]
    fn test_empty_room_yields_no_panels() {
        let room = room_with("empty", 1, 0, 0);
        assert!(ContentTransformer::panels_for_room(&room, Visibility::default()).is_empty());
    }
}
