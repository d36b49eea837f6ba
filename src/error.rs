//! Error taxonomy for the analysis pipeline.
//!
//! Fatal configuration problems abort before any frame is processed;
//! degraded-feature conditions (missing system-1 frames, skipped corrections)
//! are reported through `log::warn!` and the correction audit log instead.

use std::fmt;
use std::path::PathBuf;

/// A single problem found during up-front input validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A marker required for a system-2 anatomical frame is absent.
    MissingRequiredMarker { segment: &'static str, marker: String },
    /// The spine landmark list is empty.
    EmptySpinePoints,
    /// A spline order of zero was configured for the named plane.
    ZeroSplineOrder { plane: &'static str },
    /// A custom angle definition references a landmark that is not in the
    /// spine point list.
    UnknownAngleLandmark { angle: String, landmark: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingRequiredMarker { segment, marker } => {
                write!(f, "system-2 {segment} marker '{marker}' is missing")
            }
            ValidationIssue::EmptySpinePoints => write!(f, "spine point list is empty"),
            ValidationIssue::ZeroSplineOrder { plane } => {
                write!(f, "{plane} spline order must be positive")
            }
            ValidationIssue::UnknownAngleLandmark { angle, landmark } => {
                write!(
                    f,
                    "custom angle '{angle}' references unknown landmark '{landmark}'"
                )
            }
        }
    }
}

/// Errors surfaced by [`crate::SpineAnalyzer::process`].
#[derive(Debug, thiserror::Error)]
pub enum SpineError {
    /// One or more input problems, collected before any computation starts.
    #[error("input validation failed: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),
    /// A single-marker descriptor entry names a segment category other than
    /// "thorax" or "pelvis".
    #[error("marker '{marker}' maps to unknown segment category '{segment}'")]
    UnknownSegment { marker: String, segment: String },
    /// A spine landmark could not be resolved in the corrected marker set,
    /// even after stripping the "True " prefix.
    #[error("spine landmark '{name}' not found in corrected marker set")]
    UnknownLandmark { name: String },
    /// A descriptor file could not be read or parsed.
    #[error("failed to load descriptor {}: {detail}", path.display())]
    Descriptor { path: PathBuf, detail: String },
    /// The marker geometry for a required frame is degenerate (collinear or
    /// coincident landmarks).
    #[error("degenerate {segment} geometry in system-2 markers")]
    DegenerateFrame { segment: &'static str },
    /// A requested frame index exceeds a landmark trajectory length.
    #[error("frame {frame} out of range for marker '{marker}'")]
    FrameOutOfRange { frame: usize, marker: String },
    /// Failure while writing the results file or a diagnostic figure.
    #[error("failed to write {}: {detail}", path.display())]
    Io { path: PathBuf, detail: String },
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
