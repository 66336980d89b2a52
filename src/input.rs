//! Pointer input
//!
//! Local pointer events and the remote pointer mirroring that turns host
//! `mouse_move`/`mouse_press` replies into the same events.

use framesync_proto::Reply;
use tracing::debug;

use crate::wm::MirrorEngine;

/// A pointer event in root coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press { x: i32, y: i32 },
    Move { x: i32, y: i32 },
    Release { x: i32, y: i32 },
}

impl PointerEvent {
    /// Synthetic event for a remote pointer reply
    pub fn from_reply(reply: &Reply) -> Option<Self> {
        match *reply {
            Reply::MouseMove { x, y } => Some(PointerEvent::Move { x, y }),
            Reply::MousePress { state: true, x, y } => Some(PointerEvent::Press { x, y }),
            Reply::MousePress { state: false, x, y } => Some(PointerEvent::Release { x, y }),
            _ => None,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        match *self {
            PointerEvent::Press { x, y }
            | PointerEvent::Move { x, y }
            | PointerEvent::Release { x, y } => (x, y),
        }
    }
}

impl MirrorEngine {
    /// Route a pointer event into the interaction state machine
    ///
    /// Presses are hit-tested against the frames, topmost first. A press
    /// that misses every frame only updates the pointer position.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press { x, y } => match self.hit_test(x, y) {
                Some((window, target)) => {
                    debug!("Pointer press at ({}, {}) on {} {:?}", x, y, window, target);
                    self.pointer_down(&window, target, x, y);
                }
                None => {
                    debug!("Pointer press at ({}, {}) hit no frame", x, y);
                    self.pointer_up(x, y);
                }
            },
            PointerEvent::Move { x, y } => self.pointer_move(x, y),
            PointerEvent::Release { x, y } => self.pointer_up(x, y),
        }
    }
}
