//! MoveResize Module
//!
//! Handles interactive window moving, eight-direction resizing and
//! maximize/restore. This module only computes geometry; the engine writes
//! the result to the store and queues the matching `window_map`.

use bitflags::bitflags;
use std::collections::HashMap;
use tracing::debug;

use crate::config::ScreenConfig;
use crate::shared::{Geometry, WindowId};

bitflags! {
    /// Frame edges dragged by a resize
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ResizeEdges: u8 {
        const NORTH = 1 << 0;
        const EAST  = 1 << 1;
        const SOUTH = 1 << 2;
        const WEST  = 1 << 3;
    }
}

/// Resize direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl ResizeDirection {
    pub const ALL: [ResizeDirection; 8] = [
        ResizeDirection::North,
        ResizeDirection::NorthEast,
        ResizeDirection::East,
        ResizeDirection::SouthEast,
        ResizeDirection::South,
        ResizeDirection::SouthWest,
        ResizeDirection::West,
        ResizeDirection::NorthWest,
    ];

    /// Edges this direction drags
    pub fn edges(self) -> ResizeEdges {
        match self {
            ResizeDirection::North => ResizeEdges::NORTH,
            ResizeDirection::NorthEast => ResizeEdges::NORTH | ResizeEdges::EAST,
            ResizeDirection::East => ResizeEdges::EAST,
            ResizeDirection::SouthEast => ResizeEdges::SOUTH | ResizeEdges::EAST,
            ResizeDirection::South => ResizeEdges::SOUTH,
            ResizeDirection::SouthWest => ResizeEdges::SOUTH | ResizeEdges::WEST,
            ResizeDirection::West => ResizeEdges::WEST,
            ResizeDirection::NorthWest => ResizeEdges::NORTH | ResizeEdges::WEST,
        }
    }

    /// Direction for an edge set, `None` for empty or opposing edges
    pub fn from_edges(edges: ResizeEdges) -> Option<Self> {
        ResizeDirection::ALL
            .into_iter()
            .find(|direction| direction.edges() == edges)
    }
}

/// Move/resize operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResizeOperation {
    /// Dragging by the title bar
    Move,
    /// Dragging a resize handle
    Resize(ResizeDirection),
}

/// Active gesture state
#[derive(Debug, Clone)]
pub struct MoveResizeState {
    /// Pointer position at gesture start
    pub start_x: i32,
    pub start_y: i32,

    /// Window geometry at start, the delta base
    pub start_geometry: Geometry,

    /// Operation type
    pub operation: MoveResizeOperation,

    /// Directional flags currently held
    pub edges: ResizeEdges,

    /// Pointer moved since the gesture started
    pub moved: bool,
}

/// Interaction phase of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionPhase {
    #[default]
    Idle,
    Moving,
    Resizing(ResizeDirection),
    Maximized,
}

/// Geometry produced by a pointer motion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motion {
    pub window: WindowId,
    pub geometry: Geometry,
    /// This motion ended a maximized state
    pub restored: bool,
}

/// A gesture ended by pointer release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub window: WindowId,
    pub operation: MoveResizeOperation,
    pub moved: bool,
}

#[derive(Debug, Default)]
struct WindowInteraction {
    gesture: Option<MoveResizeState>,
    /// Pre-maximize geometry, present while maximized
    restore: Option<Geometry>,
}

impl WindowInteraction {
    fn is_empty(&self) -> bool {
        self.gesture.is_none() && self.restore.is_none()
    }
}

/// Move/resize manager
#[derive(Debug)]
pub struct MoveResizeManager {
    sessions: HashMap<WindowId, WindowInteraction>,

    /// Minimum width/height
    pub min_size: i32,

    /// Title bar height; content never goes above it
    pub border_width: i32,

    changed: bool,
}

impl MoveResizeManager {
    /// Create a new move/resize manager
    pub fn new(min_size: i32, border_width: i32) -> Self {
        Self {
            sessions: HashMap::new(),
            min_size: min_size.max(1),
            border_width,
            changed: false,
        }
    }

    /// Start a move operation
    pub fn start_move(&mut self, window: &str, root_x: i32, root_y: i32, current: Geometry) {
        debug!("Starting move operation for window {}", window);
        self.start(window, root_x, root_y, current, MoveResizeOperation::Move);
    }

    /// Start a resize operation
    pub fn start_resize(
        &mut self,
        window: &str,
        direction: ResizeDirection,
        root_x: i32,
        root_y: i32,
        current: Geometry,
    ) {
        debug!(
            "Starting resize operation for window {} (direction={:?})",
            window, direction
        );
        self.start(
            window,
            root_x,
            root_y,
            current,
            MoveResizeOperation::Resize(direction),
        );
    }

    fn start(
        &mut self,
        window: &str,
        root_x: i32,
        root_y: i32,
        current: Geometry,
        operation: MoveResizeOperation,
    ) {
        let edges = match operation {
            MoveResizeOperation::Move => ResizeEdges::empty(),
            MoveResizeOperation::Resize(direction) => direction.edges(),
        };
        let session = self.sessions.entry(window.to_string()).or_default();
        session.gesture = Some(MoveResizeState {
            start_x: root_x,
            start_y: root_y,
            start_geometry: current,
            operation,
            edges,
            moved: false,
        });
        self.changed = true;
    }

    /// Handle pointer motion for every active gesture
    pub fn handle_motion(&mut self, root_x: i32, root_y: i32) -> Vec<Motion> {
        let mut motions = Vec::new();

        for (window, session) in self.sessions.iter_mut() {
            let Some(gesture) = session.gesture.as_mut() else {
                continue;
            };

            let dx = root_x.saturating_sub(gesture.start_x);
            let dy = root_y.saturating_sub(gesture.start_y);
            if dx == 0 && dy == 0 && !gesture.moved {
                continue;
            }
            gesture.moved = true;

            // The first geometry change after maximize continues from the
            // pre-maximize geometry
            let restored = match session.restore.take() {
                Some(restore) => {
                    debug!("Restoring {} from maximized for gesture", window);
                    gesture.start_geometry = restore;
                    self.changed = true;
                    true
                }
                None => false,
            };

            let geometry = match gesture.operation {
                MoveResizeOperation::Move => {
                    move_geometry(gesture.start_geometry, dx, dy, self.border_width)
                }
                MoveResizeOperation::Resize(_) => resize_geometry(
                    gesture.start_geometry,
                    gesture.edges,
                    dx,
                    dy,
                    self.min_size,
                    self.border_width,
                ),
            };

            motions.push(Motion {
                window: window.clone(),
                geometry,
                restored,
            });
        }

        motions.sort_by(|a, b| a.window.cmp(&b.window));
        motions
    }

    /// Finish every active gesture (pointer released)
    pub fn finish(&mut self) -> Vec<Finished> {
        let mut finished = Vec::new();

        for (window, session) in self.sessions.iter_mut() {
            if let Some(gesture) = session.gesture.take() {
                debug!("Finished move/resize operation for window {}", window);
                finished.push(Finished {
                    window: window.clone(),
                    operation: gesture.operation,
                    moved: gesture.moved,
                });
            }
        }

        if !finished.is_empty() {
            self.changed = true;
        }
        self.sessions.retain(|_, session| !session.is_empty());
        finished.sort_by(|a, b| a.window.cmp(&b.window));
        finished
    }

    /// Toggle maximize, returning the geometry to apply
    pub fn toggle_maximize(
        &mut self,
        window: &str,
        current: Geometry,
        screen: &ScreenConfig,
    ) -> Geometry {
        let border_width = self.border_width;
        let session = self.sessions.entry(window.to_string()).or_default();
        self.changed = true;

        let target = match session.restore.take() {
            Some(restore) => {
                debug!("Restoring window {} to {:?}", window, restore);
                restore
            }
            None => {
                session.restore = Some(current);
                let maximized = maximized_geometry(screen, border_width);
                debug!("Maximizing window {} to {:?}", window, maximized);
                maximized
            }
        };

        if session.is_empty() {
            self.sessions.remove(window);
        }
        target
    }

    /// Drop all interaction state of a window
    pub fn forget(&mut self, window: &str) {
        if self.sessions.remove(window).is_some() {
            self.changed = true;
        }
    }

    /// Check if a gesture is active on a window
    pub fn is_active(&self, window: &str) -> bool {
        self.sessions
            .get(window)
            .is_some_and(|session| session.gesture.is_some())
    }

    pub fn is_maximized(&self, window: &str) -> bool {
        self.sessions
            .get(window)
            .is_some_and(|session| session.restore.is_some())
    }

    /// Active gesture of a window
    pub fn gesture(&self, window: &str) -> Option<&MoveResizeState> {
        self.sessions.get(window)?.gesture.as_ref()
    }

    pub fn phase(&self, window: &str) -> InteractionPhase {
        let Some(session) = self.sessions.get(window) else {
            return InteractionPhase::Idle;
        };
        match (&session.gesture, session.restore) {
            (Some(gesture), _) => match gesture.operation {
                MoveResizeOperation::Move => InteractionPhase::Moving,
                MoveResizeOperation::Resize(direction) => InteractionPhase::Resizing(direction),
            },
            (None, Some(_)) => InteractionPhase::Maximized,
            (None, None) => InteractionPhase::Idle,
        }
    }

    /// Whether any phase changed since the last call, clearing the flag
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

/// Geometry after moving by a pointer delta
///
/// The content area never goes above the title bar region.
pub fn move_geometry(start: Geometry, dx: i32, dy: i32, border_width: i32) -> Geometry {
    Geometry {
        x: start.x.saturating_add(dx),
        y: start.y.saturating_add(dy).max(border_width),
        ..start
    }
}

/// Geometry after dragging `edges` by a pointer delta
///
/// West and north drags keep the opposite edge pinned. Width and height
/// never drop below `min_size`. Whatever the edge, `x` ends at or right of
/// 0 and `y` at or below `border_width`.
pub fn resize_geometry(
    start: Geometry,
    edges: ResizeEdges,
    dx: i32,
    dy: i32,
    min_size: i32,
    border_width: i32,
) -> Geometry {
    let min_size = min_size.max(1);
    let mut geom = start;

    if edges.contains(ResizeEdges::EAST) {
        geom.width = start.width.saturating_add(dx).max(min_size);
    } else if edges.contains(ResizeEdges::WEST) {
        geom.width = start.width.saturating_sub(dx).max(min_size);
        geom.x = start.x.saturating_add(start.width.saturating_sub(geom.width));
        if geom.x < 0 {
            geom.width = start.right().max(min_size);
            geom.x = 0;
        }
    }

    if edges.contains(ResizeEdges::SOUTH) {
        geom.height = start.height.saturating_add(dy).max(min_size);
    } else if edges.contains(ResizeEdges::NORTH) {
        geom.height = start.height.saturating_sub(dy).max(min_size);
        geom.y = start.y.saturating_add(start.height.saturating_sub(geom.height));
        if geom.y < border_width {
            geom.height = start.bottom().saturating_sub(border_width).max(min_size);
            geom.y = border_width;
        }
    }

    // A window that started off screen is pulled back by any resize
    geom.x = geom.x.max(0);
    geom.y = geom.y.max(border_width);
    geom
}

/// Full screen bounds minus the title bar allowance
pub fn maximized_geometry(screen: &ScreenConfig, border_width: i32) -> Geometry {
    Geometry::new(
        0,
        border_width,
        screen.width.max(1),
        (screen.height - border_width).max(1),
    )
}
