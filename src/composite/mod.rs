//! Depth-aware compositing.
//!
//! Two color + depth images are merged per pixel by keeping the nearer
//! sample. [`composite_texel`] is the rule; [`pass::DepthCompositePass`]
//! applies it on the GPU and [`copy::CopyPass`] moves a finished image into
//! its destination.

/// Fullscreen color + depth copy.
pub mod copy;
/// GPU depth composite of the opaque and volume images.
pub mod pass;
/// Shared interface of the fullscreen passes.
pub mod screen_pass;

use glam::Vec4;

pub use copy::CopyPass;
pub use pass::DepthCompositePass;
pub use screen_pass::ScreenPass;

/// One pixel of a color + depth image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Texel {
    /// RGBA color.
    pub color: Vec4,
    /// Depth in `[0, 1]`, 1 = far.
    pub depth: f32,
}

impl Texel {
    /// Cleared pixel: given color at the far plane.
    #[must_use]
    pub fn cleared(color: Vec4) -> Self {
        Self { color, depth: 1.0 }
    }
}

/// Merge `a` (opaque scene) with `b` (volume): `b` when
/// `b.depth <= a.depth`, else `a`. Ties go to `b`.
#[must_use]
pub fn composite_texel(a: Texel, b: Texel) -> Texel {
    if b.depth <= a.depth {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texel(r: f32, depth: f32) -> Texel {
        Texel {
            color: Vec4::new(r, 0.0, 0.0, 1.0),
            depth,
        }
    }

    #[test]
    fn nearer_wins_in_either_order() {
        let near = texel(1.0, 0.25);
        let far = texel(0.5, 0.75);
        assert_eq!(composite_texel(near, far), near);
        assert_eq!(composite_texel(far, near), near);
    }

    #[test]
    fn farther_volume_keeps_opaque() {
        let opaque = texel(0.1, 0.3);
        for d in [0.31, 0.5, 1.0] {
            assert_eq!(composite_texel(opaque, texel(0.9, d)), opaque);
        }
    }

    #[test]
    fn tie_goes_to_volume() {
        let opaque = texel(0.1, 0.5);
        let volume = texel(0.9, 0.5);
        assert_eq!(composite_texel(opaque, volume), volume);
        assert_eq!(composite_texel(volume, opaque), opaque);
    }

    #[test]
    fn cleared_volume_ties_cleared_opaque() {
        let bg = Texel::cleared(Vec4::new(0.2, 0.2, 0.2, 1.0));
        let empty = Texel::cleared(Vec4::ZERO);
        // Both at the far plane: the volume's clear color shows.
        assert_eq!(composite_texel(bg, empty), empty);
    }
}
