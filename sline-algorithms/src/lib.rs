#![warn(clippy::all)]
//! Algorithms that extract shorelines from coastal point clouds.
//!
//! A detection selects the points on one side of the land/water boundary (by intensity, classification or
//! color), rasterizes the selection into boundary candidates, orders the candidates into a single curve and
//! smooths it. The [pipeline] module wires these stages together, the remaining modules expose each stage.

// Threshold suggestions derived from the attribute distributions of a point cloud.
pub mod advisor;
// Distances between two shorelines sampled along a reference curve.
pub mod change;
// Point selection by intensity, scan angle, classification and color.
pub mod classify;
// Outlier rejection and ordering of boundary candidates into a curve.
pub mod curve;
// Canny-style edge detection on density grids.
pub mod edges;
// k-nearest-neighbour graphs with connected components and shortest paths.
pub mod graph;
// Complete detections, one per selection strategy.
pub mod pipeline;
// Boundary candidates from density edges or scanline extrema.
pub mod rasterize;
// Savitzky-Golay, Gaussian and jump filtering of curves.
pub mod smooth;
// Nearest neighbour and radius queries over 2D positions.
pub mod spatial;
