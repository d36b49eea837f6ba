mod common;

use common::synthetic_markers::{
    add_thorax_markers, landmark_series, scratch_dir, system2_markers, SPINE_POINTS,
};
use nalgebra::Vector3;
use spine_analyzer::io::mat::MatValue;
use spine_analyzer::{
    AngleDef, MarkerSet, Plane, SpineAnalyzer, SpineError, SpineParams, Trajectory,
};

const FRAMES: usize = 5;

fn spine_point_names() -> Vec<String> {
    SPINE_POINTS.iter().map(|s| s.to_string()).collect()
}

fn base_params(tag: &str) -> SpineParams {
    SpineParams {
        spine_point_names: spine_point_names(),
        results_dir: scratch_dir(tag),
        ..Default::default()
    }
}

#[test]
fn adjacent_pair_angles_cover_every_segment() {
    let analyzer = SpineAnalyzer::new(base_params("pairs"));
    let result = analyzer
        .process(&MarkerSet::new(), &system2_markers(FRAMES))
        .expect("pipeline");

    assert_eq!(result.sagittal.len(), SPINE_POINTS.len() - 1);
    assert_eq!(result.frontal.len(), SPINE_POINTS.len() - 1);
    for pair in SPINE_POINTS.windows(2) {
        let key = format!("{}_{}", pair[0], pair[1]);
        let series = result.sagittal.get(&key).expect("sagittal pair series");
        assert_eq!(series.len(), FRAMES, "one angle per frame for {key}");
        assert!(result.frontal.get(&key).is_some());
    }
}

#[test]
fn repeated_runs_are_bit_identical() {
    let markers2 = system2_markers(FRAMES);
    let a = SpineAnalyzer::new(base_params("idem-a"))
        .process(&MarkerSet::new(), &markers2)
        .expect("first run");
    let b = SpineAnalyzer::new(base_params("idem-b"))
        .process(&MarkerSet::new(), &markers2)
        .expect("second run");

    for (series_a, series_b) in [
        (&a.sagittal, &b.sagittal),
        (&a.frontal, &b.frontal),
        (&a.custom, &b.custom),
    ] {
        let pairs: Vec<_> = series_a.iter().zip(series_b.iter()).collect();
        assert!(!pairs.is_empty() || series_a.is_empty());
        for ((name_a, values_a), (name_b, values_b)) in pairs {
            assert_eq!(name_a, name_b);
            let bits_a: Vec<u64> = values_a.iter().map(|v| v.to_bits()).collect();
            let bits_b: Vec<u64> = values_b.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_a, bits_b, "series '{name_a}' must be bit-identical");
        }
    }
}

#[test]
fn matlab_safe_transform_preserves_count_and_values() {
    let analyzer = SpineAnalyzer::new(base_params("sanitize"));
    let result = analyzer
        .process(&MarkerSet::new(), &system2_markers(FRAMES))
        .expect("pipeline");

    let MatValue::Struct(top) = result.to_mat_value() else {
        panic!("expected top-level struct")
    };
    let markers = top
        .iter()
        .find(|(n, _)| n == "markers")
        .map(|(_, v)| v)
        .expect("markers field");
    let MatValue::Struct(marker_fields) = markers else {
        panic!("expected marker struct")
    };
    assert_eq!(marker_fields.len(), result.markers.len());
    assert!(marker_fields.iter().all(|(n, _)| !n.contains(' ')));

    let angles = top
        .iter()
        .find(|(n, _)| n == "spineAngles")
        .map(|(_, v)| v)
        .expect("spineAngles field");
    let MatValue::Struct(groups) = angles else {
        panic!("expected angle struct")
    };
    let MatValue::Struct(sagittal) = &groups[0].1 else {
        panic!("expected sagittal struct")
    };
    assert_eq!(sagittal.len(), result.sagittal.len());
    // Leaf values survive the key transform untouched.
    for ((_, value), (_, original)) in sagittal.iter().zip(result.sagittal.iter()) {
        let MatValue::Matrix { data, .. } = value else {
            panic!("expected matrix leaf")
        };
        assert_eq!(data, original);
    }
}

#[test]
fn adjacent_custom_angle_matches_pair_series() {
    let mut params = base_params("custom");
    params.custom_angles.push(AngleDef {
        name: "mid lumbar".into(),
        plane: Plane::Sagittal,
        upper: SPINE_POINTS[1].into(),
        lower: SPINE_POINTS[2].into(),
    });
    let result = SpineAnalyzer::new(params)
        .process(&MarkerSet::new(), &system2_markers(FRAMES))
        .expect("pipeline");

    let key = format!("{}_{}", SPINE_POINTS[1], SPINE_POINTS[2]);
    let pair = result.sagittal.get(&key).expect("pair series");
    let custom = result.custom.get("mid lumbar").expect("custom series");
    assert_eq!(pair, custom, "same normals, same angle");
}

#[test]
fn missing_system2_thorax_marker_fails_before_processing() {
    let mut markers2 = system2_markers(FRAMES);
    markers2 = {
        let mut rebuilt = MarkerSet::new();
        for (name, trajectory) in markers2.iter() {
            if name != "C7" {
                rebuilt.insert(name.clone(), trajectory.clone());
            }
        }
        rebuilt
    };

    let params = base_params("fatal");
    let results_dir = params.results_dir.clone();
    let err = SpineAnalyzer::new(params)
        .process(&MarkerSet::new(), &markers2)
        .unwrap_err();
    assert!(matches!(err, SpineError::Validation(_)));
    assert!(
        !results_dir.join("results.mat").exists(),
        "no partial output may be written"
    );
}

#[test]
fn missing_system1_pelvis_marker_keeps_thorax_corrections() {
    // System 1 carries a full thorax but an incomplete pelvis.
    let mut markers1 = MarkerSet::new();
    add_thorax_markers(&mut markers1);
    markers1.insert("RASI", Trajectory::Static(Vector3::new(0.1, 1.0, 0.15)));
    markers1.insert("True T10", Trajectory::Static(Vector3::new(0.0, 1.35, 0.01)));
    markers1.insert("True SACR", Trajectory::Static(Vector3::new(-0.1, 1.0, 0.0)));

    let desc_dir = scratch_dir("degrade-desc");
    let desc_path = desc_dir.join("single_markers.json");
    std::fs::write(&desc_path, r#"{ "T10": "thorax", "SACR": "pelvis" }"#).expect("write desc");

    let mut params = base_params("degrade");
    params.single_markers_desc = Some(desc_path);
    let result = SpineAnalyzer::new(params)
        .process(&markers1, &system2_markers(FRAMES))
        .expect("degraded run succeeds");

    let corrected: Vec<_> = result.corrections.iter().map(|r| r.marker.as_str()).collect();
    assert!(corrected.contains(&"True T10"), "thorax correction applied");
    assert!(
        !corrected.contains(&"True SACR"),
        "pelvis correction skipped without a system-1 pelvis frame"
    );
    // The uncorrected system-2 set never contained SACR, and the merge must
    // not have invented it.
    assert!(!result.markers.contains("True SACR"));
}

#[test]
fn true_prefix_fallback_names_angle_keys() {
    let mut markers2 = system2_markers(FRAMES);
    // Replace "True L1" by its bare fallback name.
    markers2 = {
        let mut rebuilt = MarkerSet::new();
        for (name, trajectory) in markers2.iter() {
            if name != "True L1" {
                rebuilt.insert(name.clone(), trajectory.clone());
            }
        }
        rebuilt.insert("L1", landmark_series(0, FRAMES));
        rebuilt
    };

    let result = SpineAnalyzer::new(base_params("fallback"))
        .process(&MarkerSet::new(), &markers2)
        .expect("pipeline");

    assert_eq!(result.landmarks[0], "L1");
    // Key naming follows the resolved names, mixing bare and prefixed forms.
    assert!(result.sagittal.get("L1_True L2").is_some());
    assert!(result.sagittal.get("True L1_True L2").is_none());
}

#[test]
fn save_plots_writes_one_figure_per_frame() {
    let mut params = base_params("figures");
    params.render.save_plots = true;
    params.render.panel_width = 80;
    params.render.panel_height = 80;
    let results_dir = params.results_dir.clone();

    SpineAnalyzer::new(params)
        .process(&MarkerSet::new(), &system2_markers(3))
        .expect("pipeline");

    for frame in 0..3 {
        let path = results_dir.join("figures").join(format!("tf_{frame:04}.png"));
        assert!(path.exists(), "missing figure {}", path.display());
    }
    assert!(results_dir.join("results.mat").exists());
}

#[test]
fn explicit_frame_subset_limits_series_length() {
    let mut params = base_params("subset");
    params.frames = Some(vec![1, 3]);
    let result = SpineAnalyzer::new(params)
        .process(&MarkerSet::new(), &system2_markers(FRAMES))
        .expect("pipeline");

    let key = format!("{}_{}", SPINE_POINTS[0], SPINE_POINTS[1]);
    assert_eq!(result.sagittal.get(&key).expect("series").len(), 2);
}
