use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Rigid pose of a body segment: rotation columns are the segment axes
/// expressed in global coordinates, `t` is the segment origin.
#[derive(Clone, Debug, Serialize)]
pub struct Pose {
    pub r: Matrix3<f64>,
    pub t: Vector3<f64>,
}

impl Pose {
    /// Expresses a global point in this pose's local frame.
    #[inline]
    pub fn to_local(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.r.transpose() * (p - self.t)
    }

    /// Expresses a local point back in global coordinates.
    #[inline]
    pub fn to_global(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.r * p + self.t
    }
}

/// Anatomical viewing plane used for 2D spine-curve projections.
///
/// Sagittal projects onto local pelvis axes (anterior, up); frontal onto
/// (right, up).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    Sagittal,
    Frontal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    #[test]
    fn pose_round_trips_points() {
        let r = Rotation3::from_euler_angles(0.3, -0.1, 0.7);
        let pose = Pose {
            r: *r.matrix(),
            t: Vector3::new(1.0, -2.0, 0.5),
        };
        let p = Vector3::new(0.25, 1.5, -0.75);
        let back = pose.to_global(&pose.to_local(&p));
        assert!((back - p).norm() < 1e-12);
    }
}
