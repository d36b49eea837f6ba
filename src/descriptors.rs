//! Descriptor files driving the marker correction stages.
//!
//! Three JSON inputs:
//! - single-marker descriptor: marker name → segment category
//!   ("thorax"/"pelvis");
//! - segments descriptor: segment name → cluster configuration;
//! - cluster layout directory: one `<cluster_type>.json` per cluster type
//!   holding the canonical marker coordinates in the cluster frame.
//!
//! Load failures surface as [`SpineError::Descriptor`], a configuration error
//! distinct from missing-marker warnings.

use crate::error::SpineError;
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Marker name → segment category ("thorax" or "pelvis").
pub type SingleMarkerDesc = HashMap<String, String>;

/// Cluster configuration for one tracked segment.
#[derive(Clone, Debug, Deserialize)]
pub struct SegmentDesc {
    /// Cluster layout file stem under the clusters directory.
    pub cluster_type: String,
    /// Marker excluded from the rigid fit and carried through separately.
    pub base_marker: String,
    /// The "true" segment landmark to re-express in system 2.
    pub true_marker: String,
    /// Canonical layout name → observed marker name overrides.
    #[serde(default)]
    pub renames: HashMap<String, String>,
}

/// Segment name → cluster configuration.
pub type SegmentsDesc = HashMap<String, SegmentDesc>;

/// Canonical marker coordinates of one cluster type, in the cluster frame.
#[derive(Clone, Debug, Deserialize)]
pub struct ClusterLayout {
    pub markers: HashMap<String, [f64; 3]>,
}

impl ClusterLayout {
    pub fn position(&self, name: &str) -> Option<Vector3<f64>> {
        self.markers.get(name).map(|p| Vector3::new(p[0], p[1], p[2]))
    }
}

pub fn load_single_marker_desc(path: &Path) -> Result<SingleMarkerDesc, SpineError> {
    load_json(path)
}

pub fn load_segments_desc(path: &Path) -> Result<SegmentsDesc, SpineError> {
    load_json(path)
}

/// Loads `<dir>/<cluster_type>.json`.
pub fn load_cluster_layout(dir: &Path, cluster_type: &str) -> Result<ClusterLayout, SpineError> {
    load_json(&dir.join(format!("{cluster_type}.json")))
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SpineError> {
    let contents = fs::read_to_string(path).map_err(|e| SpineError::Descriptor {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| SpineError::Descriptor {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
