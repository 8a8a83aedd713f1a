//! Volume raymarcher.
//!
//! [`kernel`] is the per-fragment sphere-tracing algorithm in Rust;
//! [`pass::VolumeRaymarcher`] runs the same algorithm in WGSL over the back
//! faces of the volume's bounding box.

pub mod kernel;
/// GPU raymarch pipeline, uniforms, and volume bindings.
pub mod pass;

pub use kernel::{MarchContext, MarchParams};
pub use pass::VolumeRaymarcher;
