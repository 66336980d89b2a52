//! Window decorations (frames, title bars, buttons) for Framesync
//!
//! Frames are drawn by the presentation layer; this module owns their
//! bindings to window records, the hit-test layout of the chrome and the
//! view handed to the presenter.

use tracing::debug;

use crate::config::FrameConfig;
use crate::shared::{Geometry, WindowId};
use crate::wm::moveresize::{InteractionPhase, ResizeDirection, ResizeEdges};

/// Generation-checked reference to a frame slot
///
/// A handle outlives the frame it named: once the slot is released its
/// generation moves on and the handle resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct FrameSlot {
    generation: u32,
    window: Option<WindowId>,
}

/// Storage for frame bindings
#[derive(Debug, Default)]
pub struct FrameArena {
    slots: Vec<FrameSlot>,
    free: Vec<u32>,
}

impl FrameArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a new frame to `window`
    pub fn bind(&mut self, window: &str) -> FrameHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(FrameSlot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.window = Some(window.to_string());
        debug!("Frame {}:{} bound to {}", index, slot.generation, window);
        FrameHandle {
            index,
            generation: slot.generation,
        }
    }

    /// Release a frame, returning the window it was bound to
    pub fn release(&mut self, handle: FrameHandle) -> Option<WindowId> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let window = slot.window.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        debug!("Frame {} released from {}", handle.index, window);
        Some(window)
    }

    /// Window a handle is bound to, `None` when stale
    pub fn resolve(&self, handle: FrameHandle) -> Option<&str> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.window.as_deref()
    }

    /// Number of live frames
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.window.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Chrome area the host routes to the frame, relative to the content origin
///
/// `x`/`y` are the (negative) left and top extents; `width`/`height` the
/// right and bottom extents. The title bar is always included; the local
/// resize margin is not.
pub fn border_margin(cfg: &FrameConfig) -> Geometry {
    let margin = cfg.register_margin;
    Geometry::new(-margin, -(cfg.border_width + margin), margin, margin)
}

/// Outer frame rectangle, chrome and resize margin included
pub fn frame_bounds(content: Geometry, cfg: &FrameConfig) -> Geometry {
    let margin = cfg.resize_margin;
    Geometry::new(
        content.x - margin,
        content.y - cfg.border_width - margin,
        content.width + 2 * margin,
        content.height + cfg.border_width + 2 * margin,
    )
}

/// Title bar rectangle, directly above the content
pub fn title_bar(content: Geometry, cfg: &FrameConfig) -> Geometry {
    Geometry::new(content.x, content.y - cfg.border_width, content.width, cfg.border_width)
}

/// Title bar buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Maximize,
    Close,
}

impl FrameControl {
    /// Button rectangle, close rightmost and maximize to its left
    pub fn bounds(self, content: Geometry, cfg: &FrameConfig) -> Geometry {
        let close_x = content.right() - cfg.button_padding - cfg.button_size;
        let x = match self {
            FrameControl::Close => close_x,
            FrameControl::Maximize => close_x - cfg.button_padding - cfg.button_size,
        };
        let y = content.y - cfg.border_width + (cfg.border_width - cfg.button_size) / 2;
        Geometry::new(x, y, cfg.button_size, cfg.button_size)
    }
}

/// Part of a frame under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    TitleBar,
    Body,
    Resize(ResizeDirection),
    Control(FrameControl),
}

/// Resolve a point against one frame
pub fn hit_test_frame(content: Geometry, cfg: &FrameConfig, px: i32, py: i32) -> Option<HitTarget> {
    if !frame_bounds(content, cfg).contains(px, py) {
        return None;
    }

    for control in [FrameControl::Close, FrameControl::Maximize] {
        if control.bounds(content, cfg).contains(px, py) {
            return Some(HitTarget::Control(control));
        }
    }

    let mut edges = ResizeEdges::empty();
    edges.set(ResizeEdges::NORTH, py < content.y - cfg.border_width);
    edges.set(ResizeEdges::SOUTH, py >= content.bottom());
    edges.set(ResizeEdges::WEST, px < content.x);
    edges.set(ResizeEdges::EAST, px >= content.right());
    if let Some(direction) = ResizeDirection::from_edges(edges) {
        return Some(HitTarget::Resize(direction));
    }

    if title_bar(content, cfg).contains(px, py) {
        Some(HitTarget::TitleBar)
    } else {
        Some(HitTarget::Body)
    }
}

/// What the presenter draws for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameView {
    pub handle: FrameHandle,
    pub window: WindowId,
    pub title: String,
    pub geometry: Geometry,
    pub visible: bool,
    /// Position in the stacking order plus one
    pub z_index: usize,
    pub icon: Option<String>,
    pub phase: InteractionPhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> FrameConfig {
        FrameConfig {
            border_width: 20,
            resize_margin: 5,
            register_margin: 0,
            button_size: 16,
            button_padding: 4,
        }
    }

    #[test]
    fn test_released_handle_goes_stale() {
        let mut arena = FrameArena::new();
        let first = arena.bind("w1");
        assert_eq!(arena.resolve(first), Some("w1"));

        assert_eq!(arena.release(first), Some("w1".to_string()));
        assert_eq!(arena.resolve(first), None);
        assert_eq!(arena.release(first), None);

        // Slot is reused under a new generation
        let second = arena.bind("w2");
        assert_ne!(first, second);
        assert_eq!(arena.resolve(first), None);
        assert_eq!(arena.resolve(second), Some("w2"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_border_margin_extends_above_title_bar() {
        // Default registration is the bare title bar, whatever the hit-test margin
        assert_eq!(border_margin(&cfg()), Geometry::new(0, -20, 0, 0));
        assert_eq!(border_margin(&FrameConfig::default()), Geometry::new(0, -20, 0, 0));

        let mut wide = cfg();
        wide.register_margin = 3;
        assert_eq!(border_margin(&wide), Geometry::new(-3, -23, 3, 3));
    }

    #[test]
    fn test_hit_test_regions() {
        let content = Geometry::new(100, 100, 400, 300);
        let cfg = cfg();

        assert_eq!(hit_test_frame(content, &cfg, 50, 50), None);
        assert_eq!(hit_test_frame(content, &cfg, 200, 200), Some(HitTarget::Body));
        assert_eq!(hit_test_frame(content, &cfg, 200, 90), Some(HitTarget::TitleBar));

        assert_eq!(
            hit_test_frame(content, &cfg, 97, 200),
            Some(HitTarget::Resize(ResizeDirection::West))
        );
        assert_eq!(
            hit_test_frame(content, &cfg, 502, 402),
            Some(HitTarget::Resize(ResizeDirection::SouthEast))
        );
        assert_eq!(
            hit_test_frame(content, &cfg, 97, 77),
            Some(HitTarget::Resize(ResizeDirection::NorthWest))
        );
        assert_eq!(
            hit_test_frame(content, &cfg, 300, 77),
            Some(HitTarget::Resize(ResizeDirection::North))
        );
    }

    #[test]
    fn test_hit_test_controls() {
        let content = Geometry::new(100, 100, 400, 300);
        let cfg = cfg();

        // Close spans x 480..496, maximize 460..476, both y 82..98
        assert_eq!(
            hit_test_frame(content, &cfg, 485, 90),
            Some(HitTarget::Control(FrameControl::Close))
        );
        assert_eq!(
            hit_test_frame(content, &cfg, 465, 90),
            Some(HitTarget::Control(FrameControl::Maximize))
        );
        assert_eq!(hit_test_frame(content, &cfg, 478, 90), Some(HitTarget::TitleBar));
    }
}
