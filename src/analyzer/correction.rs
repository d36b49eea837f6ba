//! Marker correction stages.
//!
//! Both stages re-express geometry captured in system 1 into system 2:
//! - single-marker correction routes a marker's "base" and "True" positions
//!   through the matching anatomical frame pair;
//! - cluster correction rigid-fits a canonical cluster layout in both systems
//!   and carries the base marker and true landmark through the cluster frame.
//!
//! Missing system-1 prerequisites degrade with a warning; an unknown segment
//! category in the descriptor is fatal.

use crate::descriptors::{SegmentsDesc, SingleMarkerDesc};
use crate::error::SpineError;
use crate::markers::{base_name, Correction, CorrectionMethod, MarkerSet, Trajectory, TRUE_PREFIX};
use crate::rigid::fit_rigid_body;
use crate::types::Pose;
use log::{debug, warn};
use nalgebra::Vector3;
use std::path::Path;

/// Thorax and pelvis poses per acquisition system. System-1 poses are
/// best-effort; system-2 poses are validated hard requirements.
pub(super) struct AnatomicalFrames {
    pub thorax1: Option<Pose>,
    pub pelvis1: Option<Pose>,
    pub thorax2: Pose,
    pub pelvis2: Pose,
}

impl AnatomicalFrames {
    fn segment_pair(&self, segment: &str) -> Option<(Option<&Pose>, &Pose)> {
        match segment {
            "thorax" => Some((self.thorax1.as_ref(), &self.thorax2)),
            "pelvis" => Some((self.pelvis1.as_ref(), &self.pelvis2)),
            _ => None,
        }
    }
}

/// Builds single-marker corrections for every descriptor entry that has its
/// prerequisites; entries are processed in name order for determinism.
pub(super) fn single_marker_corrections(
    markers1: &MarkerSet,
    frames: &AnatomicalFrames,
    desc: &SingleMarkerDesc,
) -> Result<Vec<Correction>, SpineError> {
    let mut entries: Vec<_> = desc.iter().collect();
    entries.sort_by_key(|(marker, _)| marker.as_str());

    let mut corrections = Vec::new();
    for (marker, segment) in entries {
        let (pose1, pose2) =
            frames
                .segment_pair(segment)
                .ok_or_else(|| SpineError::UnknownSegment {
                    marker: marker.clone(),
                    segment: segment.clone(),
                })?;
        let Some(pose1) = pose1 else {
            warn!("skipping single-marker correction for '{marker}': system-1 {segment} frame unavailable");
            continue;
        };

        for name in [base_name(marker), format!("{TRUE_PREFIX}{marker}")] {
            let Some(position) = markers1.mean_of(&name) else {
                warn!("skipping single-marker correction for '{name}': not present in system 1");
                continue;
            };
            let corrected = pose2.to_global(&pose1.to_local(&position));
            corrections.push(Correction {
                marker: name,
                trajectory: Trajectory::Static(corrected),
                method: CorrectionMethod::SingleMarker {
                    segment: segment.clone(),
                },
            });
        }
    }
    Ok(corrections)
}

/// Builds cluster-based corrections for every configured segment.
///
/// The caller gates this stage on both system-1 anatomical frames being
/// available. Descriptor/layout load failures are fatal configuration errors;
/// missing cluster markers or failed fits degrade per segment with a warning.
pub(super) fn cluster_corrections(
    markers1: &MarkerSet,
    markers2: &MarkerSet,
    desc: &SegmentsDesc,
    clusters_dir: &Path,
) -> Result<Vec<Correction>, SpineError> {
    let mut entries: Vec<_> = desc.iter().collect();
    entries.sort_by_key(|(segment, _)| segment.as_str());

    let mut corrections = Vec::new();
    for (segment, seg_desc) in entries {
        let layout = crate::descriptors::load_cluster_layout(clusters_dir, &seg_desc.cluster_type)?;
        let observed_name =
            |name: &str| seg_desc.renames.get(name).cloned().unwrap_or_else(|| name.to_string());

        // The base marker is carried through the cluster frame, not fitted.
        let mut fit_names: Vec<&String> = layout
            .markers
            .keys()
            .filter(|n| **n != seg_desc.base_marker)
            .collect();
        fit_names.sort();

        let canonical: Vec<Vector3<f64>> = fit_names
            .iter()
            .filter_map(|n| layout.position(n))
            .collect();

        let observe = |set: &MarkerSet, system: &str| -> Option<Vec<Vector3<f64>>> {
            let mut observed = Vec::with_capacity(fit_names.len());
            for name in &fit_names {
                let resolved = observed_name(name);
                match set.mean_of(&resolved) {
                    Some(p) => observed.push(p),
                    None => {
                        warn!(
                            "cluster correction skipped for segment '{segment}': marker '{resolved}' missing in {system}"
                        );
                        return None;
                    }
                }
            }
            Some(observed)
        };

        let Some(observed1) = observe(markers1, "system 1") else {
            continue;
        };
        let Some(fit1) = fit_rigid_body(&canonical, &observed1) else {
            warn!("cluster correction skipped for segment '{segment}': degenerate system-1 fit");
            continue;
        };
        debug!(
            "segment '{segment}': system-1 cluster fit rms = {:.4}",
            fit1.rms
        );

        let base_obs_name = observed_name(&seg_desc.base_marker);
        let carried: Vec<(String, Vector3<f64>)> = [&base_obs_name, &seg_desc.true_marker]
            .into_iter()
            .filter_map(|name| {
                let Some(p) = markers1.mean_of(name) else {
                    warn!(
                        "cluster correction for segment '{segment}': marker '{name}' missing in system 1"
                    );
                    return None;
                };
                Some((name.clone(), fit1.pose.to_local(&p)))
            })
            .collect();

        let Some(observed2) = observe(markers2, "system 2") else {
            continue;
        };
        let Some(fit2) = fit_rigid_body(&canonical, &observed2) else {
            warn!("cluster correction skipped for segment '{segment}': degenerate system-2 fit");
            continue;
        };
        debug!(
            "segment '{segment}': system-2 cluster fit rms = {:.4}",
            fit2.rms
        );

        for (name, local) in carried {
            corrections.push(Correction {
                marker: name,
                trajectory: Trajectory::Static(fit2.pose.to_global(&local)),
                method: CorrectionMethod::Cluster {
                    segment: segment.clone(),
                },
            });
        }
    }
    Ok(corrections)
}
