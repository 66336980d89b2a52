//! Framesync
//!
//! Client-side window frame mirror for a host compositor. The shell keeps a
//! local copy of the host's windows, lets the user drag, resize, maximize,
//! focus and close them, and negotiates every change with the host through
//! one batched round trip per tick.

pub mod batcher;
pub mod bridge;
pub mod config;
pub mod input;
pub mod shared;
pub mod shell;
pub mod wm;

pub use batcher::Batcher;
pub use bridge::{HostBridge, TransportError, UnixSocketBridge};
pub use config::Config;
pub use input::PointerEvent;
pub use wm::MirrorEngine;
