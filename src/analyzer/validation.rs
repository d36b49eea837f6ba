//! Up-front input validation.
//!
//! Collects every problem into one structured list before any computation
//! starts, so a misconfigured run fails with complete diagnostics instead of
//! stopping at the first missing key mid-pipeline.

use super::params::SpineParams;
use crate::anatomy::{PELVIS_MARKERS, THORAX_MARKERS};
use crate::error::{SpineError, ValidationIssue};
use crate::markers::MarkerSet;

pub(super) fn validate(markers2: &MarkerSet, params: &SpineParams) -> Result<(), SpineError> {
    let mut issues = Vec::new();

    for (segment, required) in [("thorax", &THORAX_MARKERS), ("pelvis", &PELVIS_MARKERS)] {
        for marker in required {
            if !markers2.contains(marker) {
                issues.push(ValidationIssue::MissingRequiredMarker {
                    segment,
                    marker: (*marker).to_string(),
                });
            }
        }
    }

    if params.spine_point_names.is_empty() {
        issues.push(ValidationIssue::EmptySpinePoints);
    }
    if params.sagittal_order == 0 {
        issues.push(ValidationIssue::ZeroSplineOrder { plane: "sagittal" });
    }
    if params.frontal_order == 0 {
        issues.push(ValidationIssue::ZeroSplineOrder { plane: "frontal" });
    }

    for def in &params.custom_angles {
        for landmark in [&def.upper, &def.lower] {
            if !params.spine_point_names.contains(landmark) {
                issues.push(ValidationIssue::UnknownAngleLandmark {
                    angle: def.name.clone(),
                    landmark: landmark.clone(),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(SpineError::Validation(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::Trajectory;
    use crate::types::Plane;
    use crate::AngleDef;
    use nalgebra::Vector3;

    fn complete_markers2() -> MarkerSet {
        let mut set = MarkerSet::new();
        for name in THORAX_MARKERS.iter().chain(PELVIS_MARKERS.iter()) {
            set.insert(*name, Trajectory::Static(Vector3::zeros()));
        }
        set
    }

    fn base_params() -> SpineParams {
        SpineParams {
            spine_point_names: vec!["True L1".into(), "True L3".into()],
            ..Default::default()
        }
    }

    #[test]
    fn complete_input_passes() {
        assert!(validate(&complete_markers2(), &base_params()).is_ok());
    }

    #[test]
    fn collects_all_issues_at_once() {
        let markers2 = MarkerSet::new();
        let params = SpineParams {
            spine_point_names: Vec::new(),
            sagittal_order: 0,
            ..Default::default()
        };
        let err = validate(&markers2, &params).unwrap_err();
        let SpineError::Validation(issues) = err else {
            panic!("expected validation error")
        };
        // 8 required markers + empty spine points + zero order.
        assert_eq!(issues.len(), 10);
    }

    #[test]
    fn custom_angle_must_reference_spine_points() {
        let mut params = base_params();
        params.custom_angles.push(AngleDef {
            name: "lumbar".into(),
            plane: Plane::Sagittal,
            upper: "True L1".into(),
            lower: "True L9".into(),
        });
        let err = validate(&complete_markers2(), &params).unwrap_err();
        let SpineError::Validation(issues) = err else {
            panic!("expected validation error")
        };
        assert_eq!(
            issues,
            vec![ValidationIssue::UnknownAngleLandmark {
                angle: "lumbar".into(),
                landmark: "True L9".into(),
            }]
        );
    }
}
