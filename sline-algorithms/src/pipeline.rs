//! Entry points that run a complete shoreline detection, one per point selection strategy.
//!
//! The intensity strategy uses the density-edge rasterizer followed by the curve builder and Savitzky-Golay
//! smoothing. The classification and color strategies use the scanline rasterizer, whose candidates are
//! already ordered, optionally followed by scanline smoothing.

use log::info;
use sline_core::{
    containers::PointCloud,
    error::{Result, ShorelineError},
    math::minmax,
    nalgebra::Vector2,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    classify::{ClassFilter, ColorFilter, IntensityFilter},
    curve::{build_curve, CurveParams},
    rasterize::{
        density_edge_candidates, scanline_candidates, BoundaryCandidate, DensityEdgeParams,
        ScanlineParams,
    },
    smooth::{smooth_savitzky_golay, smooth_scanline, ScanlineSmoothing},
};

/// A detected shoreline: an ordered 2D polyline with one elevation sample per vertex
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shoreline {
    pub vertices: Vec<Vector2<f64>>,
    pub elevations: Vec<f64>,
    /// Coordinate reference system of the source point cloud
    pub crs: Option<String>,
}

impl Shoreline {
    pub fn from_candidates(candidates: &[BoundaryCandidate], crs: Option<&str>) -> Self {
        Self {
            vertices: candidates.iter().map(|c| c.position).collect(),
            elevations: candidates.iter().map(|c| c.elevation).collect(),
            crs: crs.map(str::to_owned),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Length of the polyline
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|segment| (segment[1] - segment[0]).norm())
            .sum()
    }
}

fn check_stride(decimation: usize) -> Result<()> {
    if decimation == 0 {
        return Err(ShorelineError::InvalidParameter {
            name: "decimation",
            value: "0".into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}

/// Configuration of [detect_by_intensity]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensityDetection {
    pub filter: IntensityFilter,
    pub density: DensityEdgeParams,
    pub curve: CurveParams,
}

/// Detects the shoreline as the edge of the density of points selected by intensity
///
/// # Errors
///
/// `GridTooCoarse` if the cloud is smaller than one raster cell, `InsufficientBoundary` if the selection
/// yields no usable boundary (this includes an empty selection), `InvalidParameter` for invalid parameters
pub fn detect_by_intensity(cloud: &PointCloud, config: &IntensityDetection) -> Result<Shoreline> {
    let selection = config.filter.select(cloud);
    let candidates = density_edge_candidates(cloud, &selection.mask, &config.density)?;
    info!("{} boundary candidates from density edges", candidates.len());
    let curve = build_curve(&candidates, &config.curve)?;
    let smoothed = smooth_savitzky_golay(&curve);
    Ok(Shoreline::from_candidates(&smoothed, cloud.crs()))
}

/// Configuration of [detect_by_classification]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassDetection {
    pub classes: ClassFilter,
    pub scanline: ScanlineParams,
    /// Only every `decimation`-th ground point is used
    pub decimation: usize,
    pub smoothing: Option<ScanlineSmoothing>,
}

impl Default for ClassDetection {
    fn default() -> Self {
        Self {
            classes: Default::default(),
            scanline: Default::default(),
            decimation: 2,
            smoothing: None,
        }
    }
}

/// Detects the shoreline as the scanline extremum of the ground points, restricted to the stretch of the
/// primary axis where ground and water points overlap
///
/// # Errors
///
/// `EmptyClass` if there are no ground or no water points, `InsufficientBoundary` if no candidate lies within
/// the overlap, `InvalidParameter` for invalid parameters
pub fn detect_by_classification(cloud: &PointCloud, config: &ClassDetection) -> Result<Shoreline> {
    check_stride(config.decimation)?;
    let selection = config.classes.select(cloud)?;
    let ground = cloud.select(&selection.ground);
    let water = cloud.select(&selection.water);

    let axis = config.scanline.axis;
    let primary_range = |cloud: &PointCloud| minmax(cloud.iter().map(|p| axis.primary(&p.xy())));
    let (ground_range, water_range) = match (primary_range(&ground), primary_range(&water)) {
        (Some(ground_range), Some(water_range)) => (ground_range, water_range),
        _ => return Err(ShorelineError::InsufficientBoundary { nodes: 0 }),
    };
    let overlap = ground_range.0.max(water_range.0)..=ground_range.1.min(water_range.1);

    let decimated = ground.decimate(config.decimation);
    let candidates = scanline_candidates(decimated.points(), &config.scanline)?
        .into_iter()
        .filter(|candidate| overlap.contains(&axis.primary(&candidate.position)))
        .collect::<Vec<_>>();
    info!(
        "{} scanline candidates within the ground/water overlap {:.2}..{:.2}",
        candidates.len(),
        overlap.start(),
        overlap.end()
    );
    if candidates.is_empty() {
        return Err(ShorelineError::InsufficientBoundary { nodes: 0 });
    }

    let curve = match &config.smoothing {
        Some(smoothing) => smooth_scanline(&candidates, axis, smoothing),
        None => candidates,
    };
    Ok(Shoreline::from_candidates(&curve, cloud.crs()))
}

/// Configuration of [detect_by_color]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorDetection {
    pub filter: ColorFilter,
    pub scanline: ScanlineParams,
    /// Only every `decimation`-th selected point is used
    pub decimation: usize,
    pub smoothing: Option<ScanlineSmoothing>,
}

impl Default for ColorDetection {
    fn default() -> Self {
        Self {
            filter: ColorFilter::sandy_beach(),
            scanline: Default::default(),
            decimation: 2,
            smoothing: Some(Default::default()),
        }
    }
}

/// Detects the shoreline as the scanline extremum of the points selected by color and elevation
///
/// # Errors
///
/// `InsufficientBoundary` if no point is selected, `InvalidParameter` for invalid parameters
pub fn detect_by_color(cloud: &PointCloud, config: &ColorDetection) -> Result<Shoreline> {
    check_stride(config.decimation)?;
    let selected = cloud
        .select(&config.filter.select(cloud))
        .decimate(config.decimation);
    let candidates = scanline_candidates(selected.points(), &config.scanline)?;
    info!(
        "{} scanline candidates from {} color-selected points",
        candidates.len(),
        selected.len()
    );
    if candidates.is_empty() {
        return Err(ShorelineError::InsufficientBoundary { nodes: 0 });
    }

    let curve = match &config.smoothing {
        Some(smoothing) => smooth_scanline(&candidates, config.scanline.axis, smoothing),
        None => candidates,
    };
    Ok(Shoreline::from_candidates(&curve, cloud.crs()))
}
