//! Mirrored window state
//!
//! This module defines the `WindowRecord` kept for every window the host has
//! reported, plus the geometry type used by every other module.

use framesync_proto::WindowKind;

use crate::wm::decorations::FrameHandle;

/// Host-assigned window handle
pub type WindowId = String;

/// Window geometry (content area, screen pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Whether a point lies inside this rectangle
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

/// Host-authoritative fields carried by an inbound `window_map`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPatch {
    pub display_name: Option<String>,
    pub visible: bool,
    pub kind: WindowKind,
    pub has_server_border: bool,
    /// Only used when the record is created
    pub geometry: Geometry,
}

/// Reconciliation bookkeeping, never shown to presentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SyncState {
    /// Geometry most recently requested from the host
    pub requested: Option<Geometry>,
    /// The outstanding request has left in a flushed batch
    pub requested_sent: bool,
    /// Consecutive replies that disagreed with the local geometry
    pub mismatch_streak: u32,
    /// Divergence warning already logged for the current streak
    pub divergence_reported: bool,
    /// Host confirmed the close, waiting for collection
    pub closing: bool,
}

/// One mirrored window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRecord {
    pub id: WindowId,
    pub display_name: String,
    /// Drives presentation visibility, not existence
    pub visible: bool,
    pub geometry: Geometry,
    pub icon: Option<String>,
    pub kind: WindowKind,
    /// Host already decorates the window
    pub has_server_border: bool,
    /// Interactive frame, present for chromed windows only
    pub frame: Option<FrameHandle>,
    pub(crate) sync: SyncState,
}

impl WindowRecord {
    /// Create a record from the first `window_map` seen for `id`
    pub fn from_patch(id: &str, patch: WindowPatch) -> Self {
        Self {
            id: id.to_string(),
            display_name: patch.display_name.unwrap_or_else(|| id.to_string()),
            visible: patch.visible,
            geometry: patch.geometry,
            icon: None,
            kind: patch.kind,
            has_server_border: patch.has_server_border,
            frame: None,
            sync: SyncState::default(),
        }
    }

    /// Whether the host has confirmed this window closed
    pub fn is_closing(&self) -> bool {
        self.sync.closing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_contains_is_half_open() {
        let geom = Geometry::new(10, 20, 100, 50);

        assert!(geom.contains(10, 20));
        assert!(geom.contains(109, 69));
        assert!(!geom.contains(110, 20));
        assert!(!geom.contains(10, 70));
        assert!(!geom.contains(9, 20));
    }

    #[test]
    fn test_record_name_falls_back_to_id() {
        let record = WindowRecord::from_patch(
            "0x1a00003",
            WindowPatch {
                display_name: None,
                visible: true,
                kind: WindowKind::Normal,
                has_server_border: false,
                geometry: Geometry::new(0, 0, 10, 10),
            },
        );

        assert_eq!(record.display_name, "0x1a00003");
        assert!(record.frame.is_none());
        assert!(!record.is_closing());
    }
}
