//! Crate-level error types.

use std::fmt;

use glam::UVec3;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the sdfview crate.
#[derive(Debug)]
pub enum SdfViewError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Sample buffer length does not match the grid resolution.
    GridLength {
        /// Number of samples implied by the resolution.
        expected: usize,
        /// Number of samples supplied.
        actual: usize,
    },
    /// A grid axis has fewer than two samples, so the texel pitch
    /// `1 / (resolution - 1)` is undefined.
    DegenerateResolution(UVec3),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// WGSL composition failure (bad `#import` or shader def).
    ShaderCompose(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for SdfViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::GridLength { expected, actual } => write!(
                f,
                "grid sample count mismatch: expected {expected}, got {actual}"
            ),
            Self::DegenerateResolution(res) => write!(
                f,
                "grid resolution {}x{}x{} needs at least 2 samples per axis",
                res.x, res.y, res.z
            ),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::ShaderCompose(msg) => {
                write!(f, "shader composition error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for SdfViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for SdfViewError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for SdfViewError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
