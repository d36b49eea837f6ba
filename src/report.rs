//! Result bundle types and MATLAB-safe key sanitization.

use crate::io::mat::MatValue;
use crate::markers::{CorrectionRecord, MarkerSet, Trajectory};
use serde::Serialize;

/// Ordered named angle time series for one group (one plane, or custom).
///
/// Insertion order is preserved: adjacent-pair series are stored in landmark
/// order, which also fixes the field order in the MATLAB export.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AngleSeries {
    series: Vec<(String, Vec<f64>)>,
}

impl AngleSeries {
    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.push((name.into(), values));
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<f64>)> {
        self.series.iter().map(|(n, v)| (n, v))
    }
}

/// Output of one analysis run. The in-memory bundle keeps original marker and
/// angle names; only the `.mat` export applies the space → underscore
/// sanitization.
#[derive(Clone, Debug, Serialize)]
pub struct SpineResult {
    /// System-2 marker set after corrections were merged in.
    pub markers: MarkerSet,
    /// Audit log of every applied correction.
    pub corrections: Vec<CorrectionRecord>,
    /// Spine landmark names after "True "-prefix fallback resolution.
    pub landmarks: Vec<String>,
    pub sagittal: AngleSeries,
    pub frontal: AngleSeries,
    pub custom: AngleSeries,
}

/// MATLAB-compatible key: spaces become underscores. Lossy for names that
/// differ only in separator, but key count and values are preserved.
pub fn matlab_safe_key(name: &str) -> String {
    name.replace(' ', "_")
}

impl SpineResult {
    /// Builds the sanitized nested structure written to `results.mat`.
    pub fn to_mat_value(&self) -> MatValue {
        let mut markers = Vec::new();
        for (name, trajectory) in self.markers.iter() {
            markers.push((matlab_safe_key(name), trajectory_matrix(trajectory)));
        }
        // Field order inside the struct is deterministic for the export.
        markers.sort_by(|a, b| a.0.cmp(&b.0));

        let angles = MatValue::Struct(vec![
            ("sagittal".into(), series_struct(&self.sagittal)),
            ("frontal".into(), series_struct(&self.frontal)),
            ("custom".into(), series_struct(&self.custom)),
        ]);

        MatValue::Struct(vec![
            ("markers".into(), MatValue::Struct(markers)),
            ("spineAngles".into(), angles),
        ])
    }
}

fn series_struct(series: &AngleSeries) -> MatValue {
    MatValue::Struct(
        series
            .iter()
            .map(|(name, values)| (matlab_safe_key(name), MatValue::vector(values.clone())))
            .collect(),
    )
}

/// Frames × 3 matrix (column per spatial axis); static markers become 1 × 3.
fn trajectory_matrix(trajectory: &Trajectory) -> MatValue {
    let rows: Vec<[f64; 3]> = match trajectory {
        Trajectory::Static(p) => vec![[p.x, p.y, p.z]],
        Trajectory::Series(v) => v.iter().map(|p| [p.x, p.y, p.z]).collect(),
    };
    let n = rows.len();
    let mut data = Vec::with_capacity(n * 3);
    for axis in 0..3 {
        data.extend(rows.iter().map(|r| r[axis]));
    }
    MatValue::Matrix {
        rows: n,
        cols: 3,
        data,
    }
}
