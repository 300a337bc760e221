use std::collections::BTreeMap;

use float_ord::FloatOrd;
use log::debug;
use sline_core::{
    containers::PointCloud,
    error::{ensure_positive, Result, ShorelineError},
    layout::Point,
    nalgebra::Vector2,
    raster::{DensityGrid, GridGeometry},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    edges::{detect_edges, EdgeDetectorParams},
    spatial::SpatialIndex,
};

/// A raw boundary location together with an elevation sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundaryCandidate {
    pub position: Vector2<f64>,
    pub elevation: f64,
}

impl BoundaryCandidate {
    pub fn new(position: Vector2<f64>, elevation: f64) -> Self {
        Self {
            position,
            elevation,
        }
    }
}

/// Parameters of the density-edge rasterizer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DensityEdgeParams {
    pub cell_size: f64,
    pub edges: EdgeDetectorParams,
}

impl Default for DensityEdgeParams {
    fn default() -> Self {
        Self {
            cell_size: 0.5,
            edges: Default::default(),
        }
    }
}

pub(crate) fn check_mask(cloud: &PointCloud, mask: &[bool]) -> Result<()> {
    if mask.len() != cloud.len() {
        return Err(ShorelineError::InvalidParameter {
            name: "mask",
            value: format!("{} entries", mask.len()),
            reason: format!("must have one entry per point ({} points)", cloud.len()),
        });
    }
    Ok(())
}

/// Counts the selected points per cell of a grid over the extent of the *whole* cloud
///
/// # Errors
///
/// `GridTooCoarse` if the cloud extent is smaller than one cell along x or y (this includes empty clouds),
/// `InvalidParameter` if the cell size is not positive or `mask` does not match the cloud
pub fn selection_density(cloud: &PointCloud, mask: &[bool], cell_size: f64) -> Result<DensityGrid> {
    ensure_positive("cell_size", cell_size)?;
    check_mask(cloud, mask)?;
    let bounds = cloud.bounds().ok_or(ShorelineError::GridTooCoarse {
        cell_size,
        extent_x: 0.0,
        extent_y: 0.0,
    })?;
    let geometry = GridGeometry::covering(&bounds, cell_size)?;
    let selected = cloud
        .iter()
        .zip(mask)
        .filter(|(_, selected)| **selected)
        .map(|(point, _)| point.xy());
    Ok(DensityGrid::count(geometry, selected))
}

/// Finds boundary candidates as edges in the density raster of the selected points. Each edge cell yields
/// one candidate at the cell center, with the elevation of the selected point nearest to that center.
/// Candidates come in column-major cell order. An empty selection or a raster without edges yields no
/// candidates
pub fn density_edge_candidates(
    cloud: &PointCloud,
    mask: &[bool],
    params: &DensityEdgeParams,
) -> Result<Vec<BoundaryCandidate>> {
    let density = selection_density(cloud, mask, params.cell_size)?;
    debug!(
        "Density grid of {}x{} cells, {} occupied",
        density.nx(),
        density.ny(),
        density.occupied_cells()
    );
    let edges = detect_edges(&density, &params.edges)?;

    let selected = cloud.select(mask);
    let index = SpatialIndex::new(selected.positions_2d());

    let geometry = edges.geometry();
    let candidates = edges
        .edge_cells()
        .into_iter()
        .filter_map(|(ix, iy)| {
            let center = geometry.cell_center(ix, iy);
            index
                .nearest(&center)
                .map(|nearest| BoundaryCandidate::new(center, selected.points()[nearest].z()))
        })
        .collect::<Vec<_>>();
    Ok(candidates)
}

/// Which extremum of the secondary coordinate a scanline keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScanlineMode {
    Upper,
    Lower,
}

/// Primary axis along which scanlines are binned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn primary(&self, position: &Vector2<f64>) -> f64 {
        match self {
            Axis::X => position.x,
            Axis::Y => position.y,
        }
    }

    pub fn secondary(&self, position: &Vector2<f64>) -> f64 {
        match self {
            Axis::X => position.y,
            Axis::Y => position.x,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanlineParams {
    pub resolution: f64,
    pub mode: ScanlineMode,
    pub axis: Axis,
}

impl Default for ScanlineParams {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            mode: ScanlineMode::Upper,
            axis: Axis::X,
        }
    }
}

/// Bins `points` along the primary axis (bin key `round_half_even(primary / resolution)`) and keeps the point
/// with the largest ([ScanlineMode::Upper]) or smallest ([ScanlineMode::Lower]) secondary coordinate per bin.
/// Among equal extrema, the point that comes first when ordered by primary coordinate (then by index) wins.
/// The candidates are ordered by increasing bin key and carry the elevation of their point
/// ```
/// # use sline_core::layout::Point;
/// # use sline_algorithms::rasterize::{scanline_candidates, ScanlineParams};
/// let points = [Point::at(0.1, 1.0, 0.0), Point::at(-0.2, 3.0, 1.0), Point::at(2.0, 0.5, 2.0)];
/// let candidates = scanline_candidates(&points, &ScanlineParams::default()).unwrap();
/// assert_eq!(candidates.len(), 2);
/// assert_eq!(candidates[0].position.y, 3.0);
/// assert_eq!(candidates[1].elevation, 2.0);
/// ```
pub fn scanline_candidates(points: &[Point], params: &ScanlineParams) -> Result<Vec<BoundaryCandidate>> {
    ensure_positive("resolution", params.resolution)?;
    let axis = params.axis;

    let mut order = (0..points.len()).collect::<Vec<_>>();
    order.sort_by_key(|idx| (FloatOrd(axis.primary(&points[*idx].xy())), *idx));

    let mut extrema: BTreeMap<i64, usize> = BTreeMap::new();
    for idx in order {
        let position = points[idx].xy();
        let key = (axis.primary(&position) / params.resolution).round_ties_even() as i64;
        let secondary = axis.secondary(&position);
        extrema
            .entry(key)
            .and_modify(|current| {
                let current_secondary = axis.secondary(&points[*current].xy());
                let replace = match params.mode {
                    ScanlineMode::Upper => secondary > current_secondary,
                    ScanlineMode::Lower => secondary < current_secondary,
                };
                if replace {
                    *current = idx;
                }
            })
            .or_insert(idx);
    }

    debug!(
        "Scanline extraction over {} points produced {} bins",
        points.len(),
        extrema.len()
    );
    Ok(extrema
        .into_values()
        .map(|idx| BoundaryCandidate::new(points[idx].xy(), points[idx].z()))
        .collect())
}
