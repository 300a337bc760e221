#![warn(clippy::all)]

//! Core data structures for shoreline extraction from coastal point clouds
//!
//! `sline-core` holds everything the detection stages share: the [Point](crate::layout::Point) record
//! and the [PointCloud](crate::containers::PointCloud) container, the [DensityGrid](crate::raster::DensityGrid)
//! raster, small statistics helpers in [math](crate::math) and the typed [ShorelineError](crate::error::ShorelineError).
//! The algorithms themselves live in `sline-algorithms`.

pub extern crate nalgebra;

/// Point cloud containers
pub mod containers;
/// Error type shared by all detection stages
pub mod error;
/// Defines the attributes of a single laser return
pub mod layout;
/// Useful mathematical tools when working with point cloud data
pub mod math;
/// Regular 2D rasters binned from point data
pub mod raster;

#[cfg(test)]
pub(crate) mod test_utils;
