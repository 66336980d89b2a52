//! Shell rendering seam
//!
//! Frames are drawn by whatever sits behind `FramePresenter`. The binary
//! ships a presenter that only logs what it would draw.

use tracing::{debug, info};

use crate::wm::FrameUpdate;

/// Consumer of frame updates
pub trait FramePresenter {
    /// Redraw after a tick changed the mirror or the z-order
    fn present(&mut self, update: &FrameUpdate);

    /// Throw away everything presented so far
    fn reload(&mut self);
}

/// Presenter that writes frame updates to the log
#[derive(Debug, Default)]
pub struct TracingPresenter {
    presented: u64,
}

impl TracingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of updates presented since the last reload
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FramePresenter for TracingPresenter {
    fn present(&mut self, update: &FrameUpdate) {
        self.presented += 1;
        for frame in &update.frames {
            debug!(
                "Frame {} '{}' at {:?} z={} visible={} {:?}",
                frame.window, frame.title, frame.geometry, frame.z_index, frame.visible, frame.phase
            );
        }
        for window in &update.removed {
            debug!("Frame {} removed", window);
        }
    }

    fn reload(&mut self) {
        info!("Reloading presentation after {} updates", self.presented);
        self.presented = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_resets_counter() {
        let mut presenter = TracingPresenter::new();
        presenter.present(&FrameUpdate::default());
        presenter.present(&FrameUpdate::default());
        assert_eq!(presenter.presented(), 2);

        presenter.reload();
        assert_eq!(presenter.presented(), 0);
    }
}
