//! Rigid-body fitting of a canonical marker layout onto observed positions.
//!
//! The fit is the classic Kabsch solution: center both point sets, build the
//! cross-covariance matrix, take its SVD and correct the rotation sign so the
//! result is a proper rotation (no reflection). Applied to marker clusters it
//! recovers the cluster pose in an acquisition system from aggregate marker
//! positions.

use crate::types::Pose;
use nalgebra::{Matrix3, Vector3};

/// Rotation + translation mapping canonical layout coordinates onto observed
/// global positions, with the root-mean-square alignment residual.
#[derive(Clone, Debug)]
pub struct RigidBodyFit {
    pub pose: Pose,
    pub rms: f64,
}

/// Fits `observed ≈ R * canonical + t` over paired point lists.
///
/// Needs at least three non-degenerate point pairs; returns `None` otherwise
/// or when the SVD fails to produce both factors.
pub fn fit_rigid_body(canonical: &[Vector3<f64>], observed: &[Vector3<f64>]) -> Option<RigidBodyFit> {
    if canonical.len() < 3 || canonical.len() != observed.len() {
        return None;
    }
    let n = canonical.len() as f64;
    let c_centroid: Vector3<f64> = canonical.iter().sum::<Vector3<f64>>() / n;
    let o_centroid: Vector3<f64> = observed.iter().sum::<Vector3<f64>>() / n;

    let mut h = Matrix3::zeros();
    for (c, o) in canonical.iter().zip(observed) {
        h += (c - c_centroid) * (o - o_centroid).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = v_t.transpose() * u.transpose();
    if r.determinant() < 0.0 {
        // Reflection case: flip the axis of least variance.
        let mut v = v_t.transpose();
        v.column_mut(2).neg_mut();
        r = v * u.transpose();
    }
    let t = o_centroid - r * c_centroid;

    let pose = Pose { r, t };
    let sq_sum: f64 = canonical
        .iter()
        .zip(observed)
        .map(|(c, o)| (pose.to_global(c) - o).norm_squared())
        .sum();
    Some(RigidBodyFit {
        pose,
        rms: (sq_sum / n).sqrt(),
    })
}
