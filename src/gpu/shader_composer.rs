use std::borrow::Cow;
use std::collections::HashMap;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor,
    ShaderDefValue, ShaderLanguage, ShaderType,
};

use crate::error::SdfViewError;

/// A top-level WGSL shader embedded in the binary.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource {
    /// WGSL text, possibly with `#import` directives and `#{DEF}` values.
    pub source: &'static str,
    /// Path used in diagnostics.
    pub file_path: &'static str,
}

/// Sphere-traces the SDF over the back faces of its bounding box.
pub const VOLUME_RAYMARCH: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/raster/volume_raymarch.wgsl"),
    file_path: "raster/volume_raymarch.wgsl",
};

/// Merges two color + depth images by depth.
pub const DEPTH_COMPOSITE: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/screen/depth_composite.wgsl"),
    file_path: "screen/depth_composite.wgsl",
};

/// Copies a color + depth image.
pub const COPY: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/screen/copy.wgsl"),
    file_path: "screen/copy.wgsl",
};

/// Shader def carrying the raymarch iteration cap.
pub const MAX_STEPS_DEF: &str = "MAX_STEPS";

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Pre-loads all shared WGSL modules at construction time. Consuming shaders
/// use `#import sdfview::module_name` to pull in shared code. The composer
/// produces `naga::Module` IR directly, skipping WGSL re-parse at runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition.
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

impl ShaderComposer {
    /// Register the shared modules.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::ShaderCompose`] if a shared module does not
    /// parse.
    pub fn new() -> Result<Self, SdfViewError> {
        let mut composer = Composer::default();

        // No module imports another, so order is free.
        let modules: &[ModuleDef] = &[
            ModuleDef {
                source: include_str!(
                    "../../assets/shaders/modules/fullscreen.wgsl"
                ),
                file_path: "modules/fullscreen.wgsl",
            },
            ModuleDef {
                source: include_str!("../../assets/shaders/modules/sdf.wgsl"),
                file_path: "modules/sdf.wgsl",
            },
            ModuleDef {
                source: include_str!(
                    "../../assets/shaders/modules/volume.wgsl"
                ),
                file_path: "modules/volume.wgsl",
            },
        ];

        for m in modules {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| {
                    SdfViewError::ShaderCompose(format!(
                        "failed to register '{}': {e}",
                        m.file_path
                    ))
                })?;
        }

        Ok(Self { composer })
    }

    /// Compose a shader into a `wgpu::ShaderModule` ready for pipeline
    /// creation.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::ShaderCompose`] on a bad import, a missing
    /// shader def, or invalid WGSL.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        shader: ShaderSource,
        shader_defs: HashMap<String, ShaderDefValue>,
    ) -> Result<wgpu::ShaderModule, SdfViewError> {
        let naga_module = self.compose_naga(shader, shader_defs)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose a shader into a `naga::Module` without creating a wgpu shader
    /// module. Useful for testing shader composition without a GPU device.
    ///
    /// # Errors
    ///
    /// Same as [`compose`](Self::compose).
    pub fn compose_naga(
        &mut self,
        shader: ShaderSource,
        shader_defs: HashMap<String, ShaderDefValue>,
    ) -> Result<naga::Module, SdfViewError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source: shader.source,
                file_path: shader.file_path,
                shader_type: ShaderType::Wgsl,
                shader_defs,
                ..Default::default()
            })
            .map_err(|e| {
                SdfViewError::ShaderCompose(e.emit_to_string(&self.composer))
            })
    }
}

/// Shader defs for the raymarch shader.
#[must_use]
pub fn raymarch_defs(max_steps: u32) -> HashMap<String, ShaderDefValue> {
    HashMap::from([(
        MAX_STEPS_DEF.to_owned(),
        ShaderDefValue::UInt(max_steps),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn all_shaders_compose() {
        let mut composer = ShaderComposer::new().unwrap();
        let shaders = [
            (VOLUME_RAYMARCH, raymarch_defs(128)),
            (DEPTH_COMPOSITE, HashMap::new()),
            (COPY, HashMap::new()),
        ];
        for (shader, defs) in shaders {
            let module = composer
                .compose_naga(shader, defs)
                .unwrap_or_else(|e| panic!("{}: {e}", shader.file_path));
            let names = entry_points(&module);
            assert!(names.contains(&"vs_main"), "{}", shader.file_path);
            assert!(names.contains(&"fs_main"), "{}", shader.file_path);
        }
    }

    #[test]
    fn composed_raymarch_validates() {
        let mut composer = ShaderComposer::new().unwrap();
        let module = composer
            .compose_naga(VOLUME_RAYMARCH, raymarch_defs(32))
            .unwrap();
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        );
        assert!(validator.validate(&module).is_ok());
    }

    #[test]
    fn missing_step_def_is_an_error() {
        let mut composer = ShaderComposer::new().unwrap();
        let err = composer
            .compose_naga(VOLUME_RAYMARCH, HashMap::new())
            .unwrap_err();
        assert!(matches!(err, SdfViewError::ShaderCompose(_)));
    }
}
