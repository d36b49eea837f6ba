//! Per-frame spline fitting and angle computation.
//!
//! Every frame is independent: the landmark chain (already in the system-2
//! pelvis frame) is projected onto the sagittal and frontal planes, a
//! polynomial spine curve is fitted per plane, and inter-segment angles are
//! derived from the slopes of the curve normals at the landmark points. With
//! the `parallel` feature enabled frames are mapped with rayon; results land
//! in disjoint slots so both paths are bit-identical.

use super::params::AngleDef;
use crate::error::SpineError;
use crate::render::{render_frame, PanelData, RenderOptions};
use crate::spline::{interline_angle_deg, normal_slope, PlaneSpline};
use crate::types::Plane;
use nalgebra::Vector3;
use std::path::PathBuf;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Angle outputs for one processed frame.
pub(super) struct FrameAngles {
    pub sagittal: Vec<f64>,
    pub frontal: Vec<f64>,
    pub custom: Vec<f64>,
}

/// Configuration shared by every frame computation.
pub(super) struct AngleConfig<'a> {
    /// Indices of custom-angle endpoints in the landmark list.
    pub custom: &'a [(AngleDef, usize, usize)],
    pub sagittal_order: usize,
    pub frontal_order: usize,
}

/// Figure output destination, present only when plots are requested.
pub(super) struct RenderPlan {
    pub figures_dir: PathBuf,
    pub options: RenderOptions,
}

/// Computes angles for every selected frame, in selection order.
pub(super) fn compute_frames(
    spine_data: &[Vec<Vector3<f64>>],
    frame_indices: &[usize],
    cfg: &AngleConfig<'_>,
    render: Option<&RenderPlan>,
) -> Result<Vec<FrameAngles>, SpineError> {
    let jobs: Vec<(usize, &Vec<Vector3<f64>>)> = frame_indices
        .iter()
        .copied()
        .zip(spine_data.iter())
        .collect();

    #[cfg(feature = "parallel")]
    {
        jobs.par_iter()
            .map(|(frame, points)| compute_one(*frame, points, cfg, render))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        jobs.iter()
            .map(|(frame, points)| compute_one(*frame, points, cfg, render))
            .collect()
    }
}

fn compute_one(
    frame: usize,
    points: &[Vector3<f64>],
    cfg: &AngleConfig<'_>,
    render: Option<&RenderPlan>,
) -> Result<FrameAngles, SpineError> {
    // Sagittal view: (anterior, up). Frontal view: (right, up).
    let sag_points: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
    let fro_points: Vec<[f64; 2]> = points.iter().map(|p| [p.z, p.y]).collect();

    let (sag_spline, sag_normals) = plane_normals(&sag_points, cfg.sagittal_order);
    let (fro_spline, fro_normals) = plane_normals(&fro_points, cfg.frontal_order);

    let adjacent = |normals: &[f64]| -> Vec<f64> {
        normals
            .windows(2)
            .map(|w| interline_angle_deg(w[0], w[1]))
            .collect()
    };

    let custom = cfg
        .custom
        .iter()
        .map(|(def, upper, lower)| {
            let normals = match def.plane {
                Plane::Sagittal => &sag_normals,
                Plane::Frontal => &fro_normals,
            };
            interline_angle_deg(normals[*upper], normals[*lower])
        })
        .collect();

    if let Some(plan) = render {
        let path = plan.figures_dir.join(format!("tf_{frame:04}.png"));
        let sag_curve = curve_samples(&sag_spline, &sag_points);
        let fro_curve = curve_samples(&fro_spline, &fro_points);
        render_frame(
            &path,
            &PanelData {
                points: &sag_points,
                curve: &sag_curve,
                normal_slopes: &sag_normals,
            },
            &PanelData {
                points: &fro_points,
                curve: &fro_curve,
                normal_slopes: &fro_normals,
            },
            &plan.options,
        )?;
    }

    Ok(FrameAngles {
        sagittal: adjacent(&sag_normals),
        frontal: adjacent(&fro_normals),
        custom,
    })
}

/// Fits the plane curve and evaluates the normal slope at every landmark.
/// A failed fit yields NaN normals, which propagate into the angles.
fn plane_normals(points: &[[f64; 2]], order: usize) -> (Option<PlaneSpline>, Vec<f64>) {
    match PlaneSpline::fit(points, order) {
        Some(spline) => {
            let normals = points
                .iter()
                .map(|p| normal_slope(spline.tangent_slope(p[1])))
                .collect();
            (Some(spline), normals)
        }
        None => (None, vec![f64::NAN; points.len()]),
    }
}

fn curve_samples(spline: &Option<PlaneSpline>, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let Some(spline) = spline else {
        return Vec::new();
    };
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        lo = lo.min(p[1]);
        hi = hi.max(p[1]);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    spline.sample(lo, hi, 100)
}
