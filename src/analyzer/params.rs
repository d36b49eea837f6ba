//! Parameter types configuring the analysis pipeline.
//!
//! All knobs live in [`SpineParams`]: the ordered landmark list, custom angle
//! definitions, the optional frame subset, per-plane spline orders, descriptor
//! file locations and the output/rendering configuration. Defaults give a
//! cubic sagittal and frontal fit, no corrections (no descriptors), all
//! frames, and no figure rendering.

use crate::render::RenderOptions;
use crate::types::Plane;
use std::path::PathBuf;

/// A user-defined angle between the normals at two (possibly non-adjacent)
/// spine landmarks in one anatomical plane.
#[derive(Clone, Debug)]
pub struct AngleDef {
    pub name: String,
    pub plane: Plane,
    /// Landmark names as they appear in the spine point list.
    pub upper: String,
    pub lower: String,
}

/// Analyzer-wide parameters.
#[derive(Clone, Debug)]
pub struct SpineParams {
    /// Ordered vertebral landmark names (top to bottom). Adjacent pairs
    /// define the angle taxonomy.
    pub spine_point_names: Vec<String>,
    /// Additional angles beyond the adjacent-pair set.
    pub custom_angles: Vec<AngleDef>,
    /// Explicit frame indices to process; `None` processes all frames.
    pub frames: Option<Vec<usize>>,
    /// Polynomial order of the sagittal-plane spine fit.
    pub sagittal_order: usize,
    /// Polynomial order of the frontal-plane spine fit.
    pub frontal_order: usize,
    /// Single-marker descriptor file; `None` skips single-marker correction.
    pub single_markers_desc: Option<PathBuf>,
    /// Segment/cluster descriptor file; `None` skips cluster correction.
    pub segments_desc: Option<PathBuf>,
    /// Directory holding `<cluster_type>.json` canonical layouts.
    pub clusters_desc_dir: Option<PathBuf>,
    /// Output directory for `results.mat` and the `figures` subdirectory.
    pub results_dir: PathBuf,
    /// Diagnostic figure rendering configuration.
    pub render: RenderOptions,
}

impl Default for SpineParams {
    fn default() -> Self {
        Self {
            spine_point_names: Vec::new(),
            custom_angles: Vec::new(),
            frames: None,
            sagittal_order: 3,
            frontal_order: 3,
            single_markers_desc: None,
            segments_desc: None,
            clusters_desc_dir: None,
            results_dir: PathBuf::from("results"),
            render: RenderOptions::default(),
        }
    }
}
