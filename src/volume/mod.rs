//! The SDF grid resource and its GPU-side counterparts.
//!
//! [`SdfGrid`] owns the signed 8-bit samples and the physical box they span.
//! [`texture::VolumeTexture`] mirrors the samples in an `R8Snorm` 3D texture
//! and [`bounds::BoxMesh`] is the bounding box whose back faces drive the
//! raymarch fragments.

/// Bounding box geometry rasterized by the raymarch pass.
pub mod bounds;
/// CPU grid storage, validation, and trilinear sampling.
pub mod grid;
/// `R8Snorm` 3D texture upload and rebinding.
pub mod texture;

pub use grid::{GridChange, SdfGrid};
