use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::camera::ProjectionKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection parameters.
pub struct CameraOptions {
    /// Perspective or orthographic rays.
    #[schemars(title = "Projection")]
    pub projection: ProjectionKind,
    /// Vertical field of view in degrees (perspective).
    #[schemars(title = "Field of View", range(min = 20.0, max = 90.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Visible world height (orthographic).
    #[schemars(title = "Ortho Height", range(min = 0.1, max = 100.0), extend("step" = 0.1))]
    pub ortho_height: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::Perspective,
            fovy: 45.0,
            ortho_height: 4.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}
