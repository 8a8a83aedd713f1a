use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::raymarch::kernel::{
    MarchParams, BAND_WIDTH_FACTOR, MAX_STEPS, TOLERANCE_FACTOR,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Raymarch", inline)]
#[serde(default)]
/// Sphere-tracing tunables.
///
/// `max_steps` is baked into the shader at pipeline build time; the two
/// factors are uniforms.
pub struct RaymarchOptions {
    /// Iteration cap of the march loop.
    #[schemars(title = "Max Steps", range(min = 8, max = 1024))]
    pub max_steps: u32,
    /// Narrow-band half-width as a fraction of the box diagonal.
    #[schemars(skip)]
    pub band_width_factor: f32,
    /// Hit tolerance as a fraction of the texel diagonal.
    #[schemars(skip)]
    pub tolerance_factor: f32,
}

impl Default for RaymarchOptions {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS,
            band_width_factor: BAND_WIDTH_FACTOR,
            tolerance_factor: TOLERANCE_FACTOR,
        }
    }
}

impl RaymarchOptions {
    /// Kernel parameters for these options.
    #[must_use]
    pub fn march_params(&self) -> MarchParams {
        MarchParams {
            max_steps: self.max_steps,
            band_width_factor: self.band_width_factor,
            tolerance_factor: self.tolerance_factor,
        }
    }
}
