use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Volume", inline)]
#[serde(default)]
/// Appearance and render-target options of the volume pass.
pub struct VolumeOptions {
    /// Whether the volume is drawn. Hidden volumes pass the opaque image
    /// through unchanged.
    #[schemars(title = "Visible")]
    pub visible: bool,
    /// Linear RGB base color of the shaded surface.
    #[schemars(title = "Base Color")]
    pub base_color: [f32; 3],
    /// Clear color of the volume target. Pixels the volume misses stay at
    /// the far plane and tie with a cleared opaque buffer, so this should
    /// match the opaque pass's clear color.
    #[schemars(skip)]
    pub clear_color: [f32; 4],
    /// Edge length of the square volume render target in pixels. Fixed for
    /// the lifetime of the pass.
    #[schemars(skip)]
    pub render_size: u32,
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self {
            visible: true,
            base_color: [1.0, 1.0, 1.0],
            clear_color: [0.0, 0.0, 0.0, 0.0],
            render_size: 1024,
        }
    }
}
