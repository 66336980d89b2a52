//! Stacking Module
//!
//! Manages window z-order. The order is kept bottom to top; raising moves a
//! window to the tail. Every change is observable through `take_changed` so
//! the engine can announce the complete order to the host.

use tracing::debug;

use crate::shared::WindowId;

/// Stacking manager
#[derive(Debug, Default)]
pub struct StackingManager {
    /// Stacking order (bottom to top)
    stacking_order: Vec<WindowId>,
    /// Order changed since the last `take_changed`
    changed: bool,
}

impl StackingManager {
    /// Create a new stacking manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a window to the top
    ///
    /// Returns true when the order actually changed.
    pub fn raise_window(&mut self, window: &str) -> bool {
        if self.stacking_order.last().map(String::as_str) == Some(window) {
            return false;
        }

        debug!("Raising window {}", window);

        // Remove from stacking order, then add to top
        self.stacking_order.retain(|w| w != window);
        self.stacking_order.push(window.to_string());
        self.changed = true;
        true
    }

    /// Add window to stacking order (on top) if not already present
    pub fn add_window(&mut self, window: &str) -> bool {
        if self.contains(window) {
            return false;
        }
        self.stacking_order.push(window.to_string());
        self.changed = true;
        true
    }

    /// Remove window from stacking order
    pub fn remove_window(&mut self, window: &str) -> bool {
        let before = self.stacking_order.len();
        self.stacking_order.retain(|w| w != window);
        let removed = self.stacking_order.len() != before;
        self.changed |= removed;
        removed
    }

    pub fn contains(&self, window: &str) -> bool {
        self.stacking_order.iter().any(|w| w == window)
    }

    /// Get stacking order (bottom to top)
    pub fn stacking_order(&self) -> &[WindowId] {
        &self.stacking_order
    }

    /// Windows from the topmost down
    pub fn topmost_first(&self) -> impl Iterator<Item = &WindowId> {
        self.stacking_order.iter().rev()
    }

    /// Presentation stacking index: position in the order plus one
    pub fn stacking_index(&self, window: &str) -> Option<usize> {
        self.stacking_order
            .iter()
            .position(|w| w == window)
            .map(|pos| pos + 1)
    }

    /// Whether the order changed since the last call, clearing the flag
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}
