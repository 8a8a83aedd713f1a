//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization, pipeline boilerplate,
//! color + depth render targets, and shader composition.

/// Shared wgpu boilerplate helpers for the renderer's pipelines.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Color + depth render-target pairs.
pub mod texture;
