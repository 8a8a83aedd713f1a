//! Camera model for viewing the volume.
//!
//! The renderer consumes a [`CameraState`]: projection kind, view-to-world
//! transform, and an OpenGL-convention projection. [`Camera`] is a simple
//! look-at camera that produces one.

/// Look-at camera, projection kinds, and per-frame camera state.
pub mod core;

pub use self::core::{Camera, CameraState, ProjectionKind};
