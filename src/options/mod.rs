//! Renderer options with TOML preset support.
//!
//! Options serialize to/from TOML. Every section uses `#[serde(default)]`
//! so partial files (e.g. only overriding `[raymarch]`) work.

mod camera;
mod raymarch;
mod volume;

use std::path::Path;

pub use camera::CameraOptions;
pub use raymarch::RaymarchOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use volume::VolumeOptions;

use crate::error::SdfViewError;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Volume appearance and render target.
    pub volume: VolumeOptions,
    /// Sphere-tracing tunables.
    pub raymarch: RaymarchOptions,
    /// Camera projection parameters.
    pub camera: CameraOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::Io`] if the file cannot be read and
    /// [`SdfViewError::OptionsParse`] if it is not valid TOML for these
    /// options.
    pub fn load(path: &Path) -> Result<Self, SdfViewError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| SdfViewError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::OptionsParse`] on serialization failure and
    /// [`SdfViewError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SdfViewError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SdfViewError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
