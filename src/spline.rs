//! Polynomial spine-curve fitting and inter-line angles.
//!
//! A plane projection of the landmark chain is a list of (lateral, height)
//! pairs; the curve models lateral displacement as a polynomial in the height
//! coordinate, which is monotone along the vertebral chain. Tangent slopes are
//! the analytic derivative evaluated at the landmark heights; normal slopes
//! are negative reciprocals and may be IEEE infinite when a tangent is zero.
//! The inter-line angle is computed from arctangents of the slopes, so
//! infinite normal slopes still yield finite angles; NaN inputs propagate.

use nalgebra::{DMatrix, DVector};

/// Least-squares polynomial fit through ordered plane points.
#[derive(Clone, Debug)]
pub struct PlaneSpline {
    /// Coefficients, constant term first.
    coeffs: Vec<f64>,
}

impl PlaneSpline {
    /// Fits a polynomial of degree `order` mapping height → lateral through
    /// `points = [[lateral, height], ..]`. Returns `None` for an empty point
    /// list or a failed decomposition.
    pub fn fit(points: &[[f64; 2]], order: usize) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let rows = points.len();
        let cols = order + 1;
        let mut vandermonde = DMatrix::zeros(rows, cols);
        for (i, p) in points.iter().enumerate() {
            let mut pow = 1.0;
            for j in 0..cols {
                vandermonde[(i, j)] = pow;
                pow *= p[1];
            }
        }
        let rhs = DVector::from_iterator(rows, points.iter().map(|p| p[0]));
        let svd = vandermonde.svd(true, true);
        let solution = svd.solve(&rhs, 1e-12).ok()?;
        Some(Self {
            coeffs: solution.iter().copied().collect(),
        })
    }

    /// Lateral displacement at the given height.
    pub fn lateral(&self, height: f64) -> f64 {
        let mut acc = 0.0;
        for &c in self.coeffs.iter().rev() {
            acc = acc * height + c;
        }
        acc
    }

    /// Tangent slope d(lateral)/d(height) at the given height.
    pub fn tangent_slope(&self, height: f64) -> f64 {
        let mut acc = 0.0;
        for (k, &c) in self.coeffs.iter().enumerate().skip(1).rev() {
            acc = acc * height + c * k as f64;
        }
        acc
    }

    /// Dense curve samples over `[h0, h1]` for plotting.
    pub fn sample(&self, h0: f64, h1: f64, n: usize) -> Vec<[f64; 2]> {
        if n < 2 {
            return Vec::new();
        }
        let step = (h1 - h0) / (n - 1) as f64;
        (0..n)
            .map(|i| {
                let h = h0 + step * i as f64;
                [self.lateral(h), h]
            })
            .collect()
    }
}

/// Slope of the normal to a curve whose tangent slope is `tangent`.
/// A zero tangent yields an IEEE infinity, by design of the pipeline's
/// numerical edge-case policy.
#[inline]
pub fn normal_slope(tangent: f64) -> f64 {
    -1.0 / tangent
}

/// Signed angle between two lines given their slopes, in degrees.
///
/// Computed as the wrapped arctangent difference, folded into (−90°, 90°];
/// this agrees with `atan((m1 − m2) / (1 + m1·m2))` wherever that expression
/// is finite and stays total for infinite slopes. NaN propagates.
pub fn interline_angle_deg(m1: f64, m2: f64) -> f64 {
    let mut a = m1.atan() - m2.atan();
    if a > std::f64::consts::FRAC_PI_2 {
        a -= std::f64::consts::PI;
    } else if a <= -std::f64::consts::FRAC_PI_2 {
        a += std::f64::consts::PI;
    }
    a.to_degrees()
}
