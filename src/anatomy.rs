//! ISB anatomical reference frames for thorax and pelvis.
//!
//! Frames follow the ISB axis convention: X anterior, Y up, Z right, with the
//! rotation columns holding the axes in global coordinates. Both builders work
//! from aggregate (mean) marker positions, so a frame is computed once per
//! acquisition system.
//!
//! A builder returns `None` when a required marker is absent or the geometry
//! is degenerate; callers decide whether that is fatal (system 2) or a
//! degraded feature (system 1).

use crate::markers::MarkerSet;
use crate::types::Pose;
use nalgebra::{Matrix3, Vector3};

/// Markers required for the thorax frame.
pub const THORAX_MARKERS: [&str; 4] = ["CLAV", "STRN", "C7", "T9"];

/// Markers required for the pelvis frame.
pub const PELVIS_MARKERS: [&str; 4] = ["RASI", "LASI", "RPSI", "LPSI"];

const DEGENERACY_EPS: f64 = 1e-9;

/// Thorax frame from CLAV/STRN/C7/T9.
///
/// Y runs from the mid-point of STRN/T9 up to the mid-point of CLAV/C7;
/// the anterior direction is seeded by CLAV − C7 and orthogonalized.
/// Origin: CLAV.
pub fn thorax_pose(markers: &MarkerSet) -> Option<Pose> {
    let clav = markers.mean_of("CLAV")?;
    let strn = markers.mean_of("STRN")?;
    let c7 = markers.mean_of("C7")?;
    let t9 = markers.mean_of("T9")?;

    let upper = (clav + c7) / 2.0;
    let lower = (strn + t9) / 2.0;
    let y = (upper - lower).try_normalize(DEGENERACY_EPS)?;
    let anterior_seed = clav - c7;
    orthonormal_pose(anterior_seed, y, clav)
}

/// Pelvis frame from RASI/LASI/RPSI/LPSI.
///
/// Z runs from LASI to RASI; the anterior direction is seeded by the ASIS
/// mid-point minus the PSIS mid-point. Origin: ASIS mid-point.
pub fn pelvis_pose(markers: &MarkerSet) -> Option<Pose> {
    let rasi = markers.mean_of("RASI")?;
    let lasi = markers.mean_of("LASI")?;
    let rpsi = markers.mean_of("RPSI")?;
    let lpsi = markers.mean_of("LPSI")?;

    let origin = (rasi + lasi) / 2.0;
    let z = (rasi - lasi).try_normalize(DEGENERACY_EPS)?;
    let anterior_seed = origin - (rpsi + lpsi) / 2.0;
    let y = z.cross(&anterior_seed).try_normalize(DEGENERACY_EPS)?;
    let x = y.cross(&z);
    Some(Pose {
        r: Matrix3::from_columns(&[x, y, z]),
        t: origin,
    })
}

/// Builds a right-handed pose from an anterior seed and an exact up axis.
fn orthonormal_pose(anterior_seed: Vector3<f64>, y: Vector3<f64>, origin: Vector3<f64>) -> Option<Pose> {
    let z = anterior_seed.cross(&y).try_normalize(DEGENERACY_EPS)?;
    let x = y.cross(&z);
    Some(Pose {
        r: Matrix3::from_columns(&[x, y, z]),
        t: origin,
    })
}
