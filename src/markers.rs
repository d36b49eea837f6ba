//! Marker sets and trajectories.
//!
//! A [`MarkerSet`] maps marker names to 3D trajectories. Calibration/base
//! markers are typically static (a single position); tracked markers carry a
//! per-frame series. The naming conventions handled here:
//! - `"True <name>"` – the anatomically corrected landmark for `<name>`;
//! - `"<name> base"` – the static base position associated with `<name>`.
//!
//! Corrections are applied immutably: [`MarkerSet::with_corrections`] returns
//! a new set plus an audit log of what was merged and from where.

use nalgebra::Vector3;
use serde::Serialize;
use std::collections::HashMap;

/// Prefix marking anatomically corrected ("true") landmark names.
pub const TRUE_PREFIX: &str = "True ";

/// Returns the "<name> base" companion name for a marker.
pub fn base_name(name: &str) -> String {
    format!("{name} base")
}

/// A marker's motion: one static position or one position per frame.
#[derive(Clone, Debug, Serialize)]
pub enum Trajectory {
    Static(Vector3<f64>),
    Series(Vec<Vector3<f64>>),
}

impl Trajectory {
    /// Position at frame `i`. Static trajectories answer every frame;
    /// series return `None` past their end.
    pub fn at(&self, i: usize) -> Option<Vector3<f64>> {
        match self {
            Trajectory::Static(p) => Some(*p),
            Trajectory::Series(v) => v.get(i).copied(),
        }
    }

    /// Number of recorded frames (`None` for static markers).
    pub fn frames(&self) -> Option<usize> {
        match self {
            Trajectory::Static(_) => None,
            Trajectory::Series(v) => Some(v.len()),
        }
    }

    /// Aggregate (mean) position, used for frame construction and rigid fits.
    pub fn mean(&self) -> Option<Vector3<f64>> {
        match self {
            Trajectory::Static(p) => Some(*p),
            Trajectory::Series(v) if v.is_empty() => None,
            Trajectory::Series(v) => {
                let sum: Vector3<f64> = v.iter().sum();
                Some(sum / v.len() as f64)
            }
        }
    }
}

/// How a corrected marker entered the merged set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CorrectionMethod {
    /// Re-expressed through an anatomical frame pair (thorax or pelvis).
    SingleMarker { segment: String },
    /// Carried through a rigid cluster fit for the named segment.
    Cluster { segment: String },
}

/// Audit record for one merged marker.
#[derive(Clone, Debug, Serialize)]
pub struct CorrectionRecord {
    pub marker: String,
    pub method: CorrectionMethod,
    /// Whether the merge overwrote a marker already present in system 2.
    pub replaced_existing: bool,
}

/// One pending correction produced by the correction stage.
#[derive(Clone, Debug)]
pub struct Correction {
    pub marker: String,
    pub trajectory: Trajectory,
    pub method: CorrectionMethod,
}

/// Named marker trajectories for one acquisition system.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MarkerSet {
    markers: HashMap<String, Trajectory>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, trajectory: Trajectory) {
        self.markers.insert(name.into(), trajectory);
    }

    pub fn get(&self, name: &str) -> Option<&Trajectory> {
        self.markers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Trajectory)> {
        self.markers.iter()
    }

    /// Mean position of a marker, if present and non-empty.
    pub fn mean_of(&self, name: &str) -> Option<Vector3<f64>> {
        self.get(name).and_then(Trajectory::mean)
    }

    /// Resolves a landmark name against this set: the exact name wins,
    /// otherwise the `"True "` prefix is stripped and the bare name tried.
    pub fn resolve(&self, name: &str) -> Option<String> {
        if self.contains(name) {
            return Some(name.to_string());
        }
        let bare = name.strip_prefix(TRUE_PREFIX)?;
        self.contains(bare).then(|| bare.to_string())
    }

    /// Applies corrections by merge, returning a new set and the audit log.
    /// A correction overwrites any existing entry of the same name.
    pub fn with_corrections(&self, corrections: Vec<Correction>) -> (MarkerSet, Vec<CorrectionRecord>) {
        let mut merged = self.clone();
        let mut records = Vec::with_capacity(corrections.len());
        for c in corrections {
            let replaced_existing = merged.contains(&c.marker);
            records.push(CorrectionRecord {
                marker: c.marker.clone(),
                method: c.method,
                replaced_existing,
            });
            merged.markers.insert(c.marker, c.trajectory);
        }
        (merged, records)
    }
}
