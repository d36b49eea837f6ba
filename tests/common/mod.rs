pub mod synthetic_markers;
