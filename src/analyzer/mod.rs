//! Analysis pipeline orchestrating dual-system spinal angle computation.
//!
//! The [`SpineAnalyzer`] exposes a simple API: feed the two marker sets and
//! get a [`SpineResult`] with corrected markers and angle time series.
//! Internally it coordinates input validation, anatomical frame construction,
//! the two correction stages, landmark resolution, pelvis-frame projection,
//! per-frame spline/angle computation and the MATLAB export.
//!
//! Stages
//! - Validation: collect every missing/invalid input before any computation.
//! - Frames: thorax/pelvis poses per system; system 1 is best-effort.
//! - Corrections: single-marker and cluster-based re-expression into system 2.
//! - Resolution: spine landmark lookup with "True "-prefix fallback.
//! - Projection: landmark trajectories into the system-2 pelvis frame.
//! - Angles: per-frame plane splines, normal slopes, inter-segment angles.
//! - Export: sanitized `results.mat`, optional per-frame figures.

mod angles;
mod correction;
mod params;
mod validation;

pub use params::{AngleDef, SpineParams};

use crate::anatomy::{pelvis_pose, thorax_pose};
use crate::descriptors;
use crate::error::SpineError;
use crate::io::mat::write_mat;
use crate::markers::MarkerSet;
use crate::report::{AngleSeries, SpineResult};
use angles::{AngleConfig, RenderPlan};
use correction::AnatomicalFrames;
use log::{debug, warn};
use nalgebra::Vector3;

/// Spine analysis procedure over two acquisition systems.
pub struct SpineAnalyzer {
    params: SpineParams,
}

impl SpineAnalyzer {
    /// Creates an analyzer with the supplied parameters.
    pub fn new(params: SpineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SpineParams {
        &self.params
    }

    /// Runs the full pipeline.
    ///
    /// `markers1` is the reference capture used for corrections (best-effort);
    /// `markers2` must carry the thorax and pelvis anatomical markers and is
    /// the system the results are expressed in.
    pub fn process(
        &self,
        markers1: &MarkerSet,
        markers2: &MarkerSet,
    ) -> Result<SpineResult, SpineError> {
        validation::validate(markers2, &self.params)?;

        let frames = self.build_frames(markers1, markers2)?;
        let corrections = self.collect_corrections(markers1, markers2, &frames)?;
        let (corrected, records) = markers2.with_corrections(corrections);
        debug!("applied {} marker corrections", records.len());

        let resolved = self.resolve_landmarks(&corrected)?;
        let frame_indices = self.frame_indices(&corrected, &resolved);
        let spine_data = project_landmarks(&corrected, &resolved, &frame_indices, &frames.pelvis2)?;
        debug!(
            "processing {} frames over {} landmarks",
            frame_indices.len(),
            resolved.len()
        );

        let custom = self.index_custom_angles();
        let cfg = AngleConfig {
            custom: &custom,
            sagittal_order: self.params.sagittal_order,
            frontal_order: self.params.frontal_order,
        };
        let render_plan = self.params.render.save_plots.then(|| RenderPlan {
            figures_dir: self.params.results_dir.join("figures"),
            options: self.params.render.clone(),
        });
        let frame_angles =
            angles::compute_frames(&spine_data, &frame_indices, &cfg, render_plan.as_ref())?;

        let result = assemble_result(corrected, records, resolved, &custom, frame_angles);
        let mat_path = self.params.results_dir.join("results.mat");
        write_mat(&mat_path, "results", &result.to_mat_value())?;
        debug!("results written to {}", mat_path.display());
        Ok(result)
    }

    fn build_frames(
        &self,
        markers1: &MarkerSet,
        markers2: &MarkerSet,
    ) -> Result<AnatomicalFrames, SpineError> {
        let thorax2 =
            thorax_pose(markers2).ok_or(SpineError::DegenerateFrame { segment: "thorax" })?;
        let pelvis2 =
            pelvis_pose(markers2).ok_or(SpineError::DegenerateFrame { segment: "pelvis" })?;

        let thorax1 = thorax_pose(markers1);
        if thorax1.is_none() {
            warn!("system-1 thorax frame unavailable; thorax corrections will be skipped");
        }
        let pelvis1 = pelvis_pose(markers1);
        if pelvis1.is_none() {
            warn!("system-1 pelvis frame unavailable; pelvis corrections will be skipped");
        }

        Ok(AnatomicalFrames {
            thorax1,
            pelvis1,
            thorax2,
            pelvis2,
        })
    }

    fn collect_corrections(
        &self,
        markers1: &MarkerSet,
        markers2: &MarkerSet,
        frames: &AnatomicalFrames,
    ) -> Result<Vec<crate::markers::Correction>, SpineError> {
        let mut corrections = Vec::new();

        if let Some(path) = &self.params.single_markers_desc {
            let desc = descriptors::load_single_marker_desc(path)?;
            corrections.extend(correction::single_marker_corrections(
                markers1, frames, &desc,
            )?);
        }

        match (&self.params.segments_desc, &self.params.clusters_desc_dir) {
            (Some(seg_path), Some(clusters_dir)) => {
                if frames.thorax1.is_some() && frames.pelvis1.is_some() {
                    let desc = descriptors::load_segments_desc(seg_path)?;
                    corrections.extend(correction::cluster_corrections(
                        markers1,
                        markers2,
                        &desc,
                        clusters_dir,
                    )?);
                } else {
                    warn!("cluster-based correction skipped: system-1 anatomical frames unavailable");
                }
            }
            (None, None) => {}
            _ => {
                warn!("cluster-based correction skipped: segments descriptor and clusters directory must both be configured");
            }
        }

        Ok(corrections)
    }

    /// Resolves every spine point name against the corrected set, stripping
    /// the "True " prefix as a fallback. Angle keys are built from the
    /// resolved names.
    fn resolve_landmarks(&self, corrected: &MarkerSet) -> Result<Vec<String>, SpineError> {
        self.params
            .spine_point_names
            .iter()
            .map(|name| {
                corrected
                    .resolve(name)
                    .ok_or_else(|| SpineError::UnknownLandmark { name: name.clone() })
            })
            .collect()
    }

    /// The caller-specified frame subset, or all frames covered by every
    /// resolved landmark (static-only landmark sets count as one frame).
    fn frame_indices(&self, corrected: &MarkerSet, resolved: &[String]) -> Vec<usize> {
        if let Some(frames) = &self.params.frames {
            return frames.clone();
        }
        let total = resolved
            .iter()
            .filter_map(|name| corrected.get(name).and_then(|t| t.frames()))
            .min()
            .unwrap_or(1);
        (0..total).collect()
    }

    /// Maps custom-angle endpoint names to landmark indices. Validation has
    /// already checked membership.
    fn index_custom_angles(&self) -> Vec<(AngleDef, usize, usize)> {
        let index_of = |name: &str| {
            self.params
                .spine_point_names
                .iter()
                .position(|n| n == name)
                .unwrap_or_default()
        };
        self.params
            .custom_angles
            .iter()
            .map(|def| (def.clone(), index_of(&def.upper), index_of(&def.lower)))
            .collect()
    }
}

/// Expresses every resolved landmark in the system-2 pelvis frame for every
/// selected frame index.
fn project_landmarks(
    corrected: &MarkerSet,
    resolved: &[String],
    frame_indices: &[usize],
    pelvis2: &crate::types::Pose,
) -> Result<Vec<Vec<Vector3<f64>>>, SpineError> {
    frame_indices
        .iter()
        .map(|&frame| {
            resolved
                .iter()
                .map(|name| {
                    let position = corrected
                        .get(name)
                        .and_then(|t| t.at(frame))
                        .ok_or_else(|| SpineError::FrameOutOfRange {
                            frame,
                            marker: name.clone(),
                        })?;
                    Ok(pelvis2.to_local(&position))
                })
                .collect()
        })
        .collect()
}

fn assemble_result(
    markers: MarkerSet,
    corrections: Vec<crate::markers::CorrectionRecord>,
    landmarks: Vec<String>,
    custom: &[(AngleDef, usize, usize)],
    frame_angles: Vec<angles::FrameAngles>,
) -> SpineResult {
    let column = |pick: fn(&angles::FrameAngles) -> &Vec<f64>, i: usize| -> Vec<f64> {
        frame_angles.iter().map(|f| pick(f)[i]).collect()
    };

    let mut sagittal = AngleSeries::default();
    let mut frontal = AngleSeries::default();
    for (i, pair) in landmarks.windows(2).enumerate() {
        let key = format!("{}_{}", pair[0], pair[1]);
        sagittal.push(key.clone(), column(|f| &f.sagittal, i));
        frontal.push(key, column(|f| &f.frontal, i));
    }

    let mut custom_series = AngleSeries::default();
    for (i, (def, _, _)) in custom.iter().enumerate() {
        custom_series.push(def.name.clone(), column(|f| &f.custom, i));
    }

    SpineResult {
        markers,
        corrections,
        landmarks,
        sagittal,
        frontal,
        custom: custom_series,
    }
}
