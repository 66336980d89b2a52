//! Types shared between the store, the interaction layer and presentation.

pub mod window_state;

pub use window_state::{Geometry, WindowId, WindowPatch, WindowRecord};
