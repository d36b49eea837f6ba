//! File output: MATLAB Level-5 `.mat` export.

pub mod mat;
