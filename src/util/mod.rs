//! Shared utilities for the renderer.
//!
//! Coordinate conventions shared by the camera, the raymarch kernel and the
//! shaders, plus frame timing for the viewer loop.

pub mod coords;
pub mod frame_timing;
