// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Depth-composited signed-distance-field volume renderer built on wgpu.
//!
//! The crate sphere-traces a dense SDF grid inside its bounding box and
//! merges the result, per pixel and by depth, with an opaque image rendered
//! elsewhere (typically a triangle-mesh scene).
//!
//! # Key entry points
//!
//! - [`volume::SdfGrid`] - the CPU-side grid resource (create / update)
//! - [`frame::VolumeRenderPass`] - the per-frame GPU orchestrator
//! - [`raymarch::kernel`] - the sphere-tracing kernel shared by the
//!   software reference path and mirrored by the WGSL shader
//! - [`composite::composite_texel`] - the depth-composite rule
//! - [`options::Options`] - TOML-backed configuration
//!
//! # Frame flow
//!
//! Every frame the orchestrator raymarches the volume into a fixed-size
//! colour+depth target, composites it against the opaque colour+depth
//! buffer (the nearer sample wins, the volume wins ties), and copies through
//! a transient buffer when the destination aliases one of the inputs. The
//! same sequence is described by a [`frame::FramePlan`] that the
//! [`frame::software::SoftwareFrame`] executes on the CPU.

pub mod camera;
pub mod composite;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod options;
pub mod raymarch;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;
pub mod volume;

pub use error::SdfViewError;
