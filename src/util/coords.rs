//! Coordinate conventions shared by the camera, the raymarch kernel and the
//! WGSL shaders.
//!
//! The world is **z-up**: volumes produced for this renderer store their
//! height along model-space z, and the camera builds its view basis around
//! [`WORLD_UP`] rather than the y-up default most math libraries assume.
//!
//! Projection matrices follow the OpenGL clip convention (NDC z in
//! `[-1, 1]`). Fragment depth written by the raymarcher is remapped to
//! `[0, 1]` with [`ndc_depth_to_unit`]; rasterized positions are converted
//! to wgpu clip space with [`GL_TO_WGPU_CLIP`] so both agree.

use glam::{Mat4, Vec3, Vec4};

/// World up axis.
pub const WORLD_UP: Vec3 = Vec3::Z;

/// Maps OpenGL clip space (z in `[-w, w]`) to wgpu clip space
/// (z in `[0, w]`): `z' = 0.5 z + 0.5 w`.
pub const GL_TO_WGPU_CLIP: Mat4 = Mat4::from_cols(
    Vec4::X,
    Vec4::Y,
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// Remap an OpenGL NDC depth in `[-1, 1]` to a depth-buffer value in
/// `[0, 1]`.
#[must_use]
pub fn ndc_depth_to_unit(ndc_z: f32) -> f32 {
    ndc_z * 0.5 + 0.5
}

/// Depth-buffer value of a view-space point under an OpenGL-convention
/// projection.
#[must_use]
pub fn view_point_depth(clip_from_view: Mat4, p: Vec3) -> f32 {
    let clip = clip_from_view * p.extend(1.0);
    ndc_depth_to_unit(clip.z / clip.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_remap_matches_depth_remap() {
        let proj = Mat4::perspective_rh_gl(1.0, 1.5, 0.1, 50.0);
        let p = Vec3::new(0.3, -0.2, -7.0);
        let gl = proj * p.extend(1.0);
        let wgpu_clip = GL_TO_WGPU_CLIP * gl;
        let via_clip = wgpu_clip.z / wgpu_clip.w;
        assert!((via_clip - view_point_depth(proj, p)).abs() < 1e-6);
    }

    #[test]
    fn near_and_far_planes_map_to_unit_range() {
        let proj = Mat4::perspective_rh_gl(1.0, 1.0, 0.5, 10.0);
        assert!(view_point_depth(proj, Vec3::new(0.0, 0.0, -0.5)).abs() < 1e-5);
        assert!((view_point_depth(proj, Vec3::new(0.0, 0.0, -10.0)) - 1.0).abs() < 1e-5);
    }
}
