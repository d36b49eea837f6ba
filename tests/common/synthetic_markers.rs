//! Synthetic two-system subject used by the integration tests.

use nalgebra::Vector3;
use spine_analyzer::{MarkerSet, Trajectory};
use std::path::PathBuf;

/// Landmark names used by the synthetic subject, top to bottom.
pub const SPINE_POINTS: [&str; 4] = ["True L1", "True L2", "True L3", "True L4"];

fn insert_static(set: &mut MarkerSet, name: &str, x: f64, y: f64, z: f64) {
    set.insert(name, Trajectory::Static(Vector3::new(x, y, z)));
}

/// Adds the four system-2 pelvis markers (axis-aligned subject).
pub fn add_pelvis_markers(set: &mut MarkerSet) {
    insert_static(set, "RASI", 0.10, 1.00, 0.15);
    insert_static(set, "LASI", 0.10, 1.00, -0.15);
    insert_static(set, "RPSI", -0.10, 1.00, 0.06);
    insert_static(set, "LPSI", -0.10, 1.00, -0.06);
}

/// Adds the four system-2 thorax markers.
pub fn add_thorax_markers(set: &mut MarkerSet) {
    insert_static(set, "CLAV", 0.10, 1.50, 0.0);
    insert_static(set, "C7", -0.10, 1.52, 0.0);
    insert_static(set, "STRN", 0.12, 1.30, 0.0);
    insert_static(set, "T9", -0.11, 1.28, 0.0);
}

/// Deterministic landmark trajectory: gentle sagittal curve with a small
/// per-frame drift and a slight lateral offset per landmark.
pub fn landmark_series(index: usize, frames: usize) -> Trajectory {
    let i = index as f64;
    Trajectory::Series(
        (0..frames)
            .map(|t| {
                Vector3::new(
                    0.02 * (i - 1.5) * (i - 1.5) * 0.1 + 0.001 * t as f64,
                    1.10 + 0.10 * i,
                    0.005 * i,
                )
            })
            .collect(),
    )
}

/// Complete system-2 marker set: anatomical markers plus the spine landmark
/// chain recorded over `frames` frames.
pub fn system2_markers(frames: usize) -> MarkerSet {
    let mut set = MarkerSet::new();
    add_thorax_markers(&mut set);
    add_pelvis_markers(&mut set);
    for (i, name) in SPINE_POINTS.iter().enumerate() {
        set.insert(*name, landmark_series(i, frames));
    }
    set
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("spine-analyzer-e2e-{tag}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir
}
