#![warn(clippy::all)]
//! Shared code of the shoreline command line tools

/// Synthetic coastal point clouds for trying out the detection pipelines
pub mod scene;
