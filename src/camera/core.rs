use glam::{Mat4, Vec3};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::options::CameraOptions;
use crate::util::coords::WORLD_UP;

/// Kind of projection the camera uses. The raymarcher builds its rays
/// differently for each.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Default,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Rays fan out from the eye.
    #[default]
    Perspective,
    /// Parallel rays along the view direction.
    Orthographic,
}

impl ProjectionKind {
    /// The other projection kind.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Perspective => Self::Orthographic,
            Self::Orthographic => Self::Perspective,
        }
    }

    /// Discriminant written into GPU uniforms.
    #[must_use]
    pub fn as_uniform(self) -> u32 {
        match self {
            Self::Perspective => 0,
            Self::Orthographic => 1,
        }
    }
}

/// Everything the volume renderer needs from the camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Projection kind.
    pub projection: ProjectionKind,
    /// View space to world space.
    pub view_to_world: Mat4,
    /// OpenGL-convention projection (NDC z in `[-1, 1]`).
    pub clip_from_view: Mat4,
}

impl CameraState {
    /// World space to view space.
    #[must_use]
    pub fn world_to_view(&self) -> Mat4 {
        self.view_to_world.inverse()
    }

    /// View space to the model space of a box placed by `box_to_world`.
    #[must_use]
    pub fn view_to_model(&self, box_to_world: Mat4) -> Mat4 {
        box_to_world.inverse() * self.view_to_world
    }

    /// Model space of a box placed by `box_to_world` to view space.
    #[must_use]
    pub fn model_to_view(&self, box_to_world: Mat4) -> Mat4 {
        self.world_to_view() * box_to_world
    }
}

/// Look-at camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees (perspective).
    pub fovy: f32,
    /// Visible height in world units at any depth (orthographic).
    pub ortho_height: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Projection kind.
    pub projection: ProjectionKind,
}

impl Camera {
    /// Camera at `eye` looking at `target` with z up.
    #[must_use]
    pub fn new(
        eye: Vec3,
        target: Vec3,
        aspect: f32,
        options: &CameraOptions,
    ) -> Self {
        Self {
            eye,
            target,
            up: WORLD_UP,
            aspect,
            fovy: options.fovy,
            ortho_height: options.ortho_height,
            znear: options.znear,
            zfar: options.zfar,
            projection: options.projection,
        }
    }

    /// World-to-view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// OpenGL-convention projection matrix for the current kind.
    #[must_use]
    pub fn build_projection(&self) -> Mat4 {
        match self.projection {
            ProjectionKind::Perspective => Mat4::perspective_rh_gl(
                self.fovy.to_radians(),
                self.aspect,
                self.znear,
                self.zfar,
            ),
            ProjectionKind::Orthographic => {
                let half_h = self.ortho_height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh_gl(
                    -half_w, half_w, -half_h, half_h, self.znear, self.zfar,
                )
            }
        }
    }

    /// Snapshot for the renderer.
    #[must_use]
    pub fn state(&self) -> CameraState {
        CameraState {
            projection: self.projection,
            view_to_world: self.view_matrix().inverse(),
            clip_from_view: self.build_projection(),
        }
    }

    /// Update the aspect ratio after a viewport resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(projection: ProjectionKind) -> Camera {
        let options = CameraOptions {
            projection,
            ..CameraOptions::default()
        };
        Camera::new(Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO, 1.5, &options)
    }

    #[test]
    fn view_to_world_places_eye_at_origin() {
        let state = camera(ProjectionKind::Perspective).state();
        let eye = state.view_to_world.transform_point3(Vec3::ZERO);
        assert!(eye.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-5));
        // Looking down -z in view space means toward the target.
        let ahead = state.view_to_world.transform_vector3(Vec3::NEG_Z);
        assert!(ahead.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn z_is_up_on_screen() {
        let state = camera(ProjectionKind::Perspective).state();
        let up = state.world_to_view().transform_vector3(Vec3::Z);
        assert!(up.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn orthographic_projection_is_affine() {
        let proj = camera(ProjectionKind::Orthographic).build_projection();
        assert_eq!(proj.w_axis.w, 1.0);
        assert_eq!(proj.z_axis.w, 0.0);
    }

    #[test]
    fn toggle_round_trips() {
        let kind = ProjectionKind::Perspective;
        assert_eq!(kind.toggled(), ProjectionKind::Orthographic);
        assert_eq!(kind.toggled().toggled(), kind);
    }
}
