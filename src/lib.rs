#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod analyzer;
pub mod error;
pub mod markers;
pub mod report;
pub mod types;

// "Expert" modules – still public, but considered unstable internals.
pub mod anatomy;
pub mod descriptors;
pub mod io;
pub mod render;
pub mod rigid;
pub mod spline;

// --- High-level re-exports -------------------------------------------------

// Main entry points: analyzer + results.
pub use crate::analyzer::{AngleDef, SpineAnalyzer, SpineParams};
pub use crate::error::{SpineError, ValidationIssue};
pub use crate::report::{AngleSeries, SpineResult};

// Core data types referenced by the public API.
pub use crate::markers::{MarkerSet, Trajectory};
pub use crate::render::RenderOptions;
pub use crate::types::{Plane, Pose};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::markers::{MarkerSet, Trajectory};
    pub use crate::types::Plane;
    pub use crate::{AngleDef, SpineAnalyzer, SpineParams, SpineResult};
}
