//! Canny-style edge detection on density rasters.
//!
//! The detector runs in four stages: Gaussian smoothing, Sobel gradients with clamped borders, non-maximum
//! suppression along the gradient direction quantized to four orientations, and hysteresis thresholding.
//! The outermost one-cell frame of the raster never contains edges, so that neighbour lookups during
//! suppression stay in bounds.

use std::collections::VecDeque;

use log::debug;
use sline_core::{
    error::{Result, ShorelineError},
    raster::{DensityGrid, GridGeometry},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const TAN_22_5_DEG: f64 = 0.414_213_562_373_095;

/// How the Gaussian filter samples cells beyond the raster border
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BorderMode {
    /// Repeat the closest border cell
    Nearest,
    /// Treat all cells outside of the raster as having the given value
    Constant(f64),
}

/// Parameters of the Canny edge detector. Thresholds are in units of the Sobel gradient magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeDetectorParams {
    pub sigma: f64,
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub border_mode: BorderMode,
}

impl Default for EdgeDetectorParams {
    fn default() -> Self {
        Self {
            sigma: 2.0,
            low_threshold: 0.1,
            high_threshold: 0.2,
            border_mode: BorderMode::Nearest,
        }
    }
}

impl EdgeDetectorParams {
    fn validate(&self) -> Result<()> {
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(ShorelineError::InvalidParameter {
                name: "sigma",
                value: self.sigma.to_string(),
                reason: "must be a finite, non-negative value".into(),
            });
        }
        if self.low_threshold > self.high_threshold {
            return Err(ShorelineError::InvalidParameter {
                name: "low_threshold",
                value: self.low_threshold.to_string(),
                reason: format!(
                    "must not exceed the high threshold ({})",
                    self.high_threshold
                ),
            });
        }
        Ok(())
    }
}

/// Binary edge raster produced by [detect_edges]
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    geometry: GridGeometry,
    edges: Vec<bool>,
}

impl EdgeMap {
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn is_edge(&self, ix: usize, iy: usize) -> bool {
        self.edges[ix * self.geometry.ny() + iy]
    }

    /// Number of edge cells
    pub fn len(&self) -> usize {
        self.edges.iter().filter(|e| **e).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All edge cells as `(ix, iy)`, for each column from bottom to top
    pub fn edge_cells(&self) -> Vec<(usize, usize)> {
        let ny = self.geometry.ny();
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, is_edge)| **is_edge)
            .map(|(idx, _)| (idx / ny, idx % ny))
            .collect()
    }
}

/// Sobel gradients of a raster
#[derive(Debug, Clone)]
pub struct Gradients {
    pub gx: DensityGrid,
    pub gy: DensityGrid,
    pub magnitude: DensityGrid,
}

/// Normalized 1D Gaussian kernel with a radius of `round(4 * sigma)` cells
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as i64;
    let weights = (-radius..=radius)
        .map(|offset| (-0.5 * (offset as f64 / sigma).powi(2)).exp())
        .collect::<Vec<_>>();
    let sum = weights.iter().sum::<f64>();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable Gaussian smoothing of `grid`. NaN cells are treated as zero. A `sigma` of zero returns the
/// raster unchanged
pub fn gaussian_blur(grid: &DensityGrid, sigma: f64, border_mode: BorderMode) -> DensityGrid {
    let source = grid.nan_to_zero();
    if sigma == 0.0 {
        return source;
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;
    let (nx, ny) = (source.nx() as i64, source.ny() as i64);

    let sample = |grid: &DensityGrid, ix: i64, iy: i64| -> f64 {
        if (0..nx).contains(&ix) && (0..ny).contains(&iy) {
            return grid.get(ix as usize, iy as usize);
        }
        match border_mode {
            BorderMode::Nearest => grid.get(ix.clamp(0, nx - 1) as usize, iy.clamp(0, ny - 1) as usize),
            BorderMode::Constant(value) => value,
        }
    };

    let mut along_x = DensityGrid::filled(*source.geometry(), 0.0);
    for ix in 0..nx {
        for iy in 0..ny {
            let value = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * sample(&source, ix + k as i64 - radius, iy))
                .sum();
            along_x.set(ix as usize, iy as usize, value);
        }
    }
    let mut blurred = DensityGrid::filled(*source.geometry(), 0.0);
    for ix in 0..nx {
        for iy in 0..ny {
            let value = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * sample(&along_x, ix, iy + k as i64 - radius))
                .sum();
            blurred.set(ix as usize, iy as usize, value);
        }
    }
    blurred
}

/// Sobel gradients along x and y, sampling clamped indices at the raster border
pub fn sobel(grid: &DensityGrid) -> Gradients {
    let geometry = *grid.geometry();
    let (nx, ny) = (grid.nx(), grid.ny());
    let mut gx = DensityGrid::filled(geometry, 0.0);
    let mut gy = DensityGrid::filled(geometry, 0.0);
    let mut magnitude = DensityGrid::filled(geometry, 0.0);

    for ix in 0..nx {
        let x_idx = [ix.saturating_sub(1), ix, (ix + 1).min(nx - 1)];
        for iy in 0..ny {
            let y_idx = [iy.saturating_sub(1), iy, (iy + 1).min(ny - 1)];
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (k, smoothing) in [1.0, 2.0, 1.0].iter().enumerate() {
                sum_x += smoothing * (grid.get(x_idx[2], y_idx[k]) - grid.get(x_idx[0], y_idx[k]));
                sum_y += smoothing * (grid.get(x_idx[k], y_idx[2]) - grid.get(x_idx[k], y_idx[0]));
            }
            gx.set(ix, iy, sum_x);
            gy.set(ix, iy, sum_y);
            magnitude.set(ix, iy, sum_x.hypot(sum_y));
        }
    }

    Gradients { gx, gy, magnitude }
}

/// Keeps the gradient magnitude of cells that are at least as large as both of their neighbours along the
/// quantized gradient direction and sets all other cells to zero. The one-cell frame is always zero
pub fn non_maximum_suppression(gradients: &Gradients) -> DensityGrid {
    let magnitude = &gradients.magnitude;
    let (nx, ny) = (magnitude.nx(), magnitude.ny());
    let mut suppressed = DensityGrid::filled(*magnitude.geometry(), 0.0);
    if nx < 3 || ny < 3 {
        return suppressed;
    }

    for ix in 1..nx - 1 {
        for iy in 1..ny - 1 {
            let mag = magnitude.get(ix, iy);
            if mag <= 0.0 {
                continue;
            }
            let gx = gradients.gx.get(ix, iy);
            let gy = gradients.gy.get(ix, iy);
            let (abs_gx, abs_gy) = (gx.abs(), gy.abs());
            let same_sign = (gx >= 0.0 && gy >= 0.0) || (gx <= 0.0 && gy <= 0.0);

            let ((ax, ay), (bx, by)) = if abs_gy <= abs_gx * TAN_22_5_DEG {
                ((ix - 1, iy), (ix + 1, iy))
            } else if abs_gx <= abs_gy * TAN_22_5_DEG {
                ((ix, iy - 1), (ix, iy + 1))
            } else if same_sign {
                ((ix - 1, iy - 1), (ix + 1, iy + 1))
            } else {
                ((ix - 1, iy + 1), (ix + 1, iy - 1))
            };

            if mag >= magnitude.get(ax, ay) && mag >= magnitude.get(bx, by) {
                suppressed.set(ix, iy, mag);
            }
        }
    }
    suppressed
}

/// Marks all cells `>= high` as edges, plus every cell `>= low` that is 8-connected to such a cell through
/// other cells `>= low`
pub fn hysteresis(suppressed: &DensityGrid, low: f64, high: f64) -> EdgeMap {
    let geometry = *suppressed.geometry();
    let (nx, ny) = (suppressed.nx(), suppressed.ny());
    let is_weak = |ix: usize, iy: usize| {
        let value = suppressed.get(ix, iy);
        value > 0.0 && value >= low
    };

    let mut edges = vec![false; geometry.len()];
    let mut queue = VecDeque::new();
    for ix in 0..nx {
        for iy in 0..ny {
            let value = suppressed.get(ix, iy);
            if value > 0.0 && value >= high {
                edges[ix * ny + iy] = true;
                queue.push_back((ix, iy));
            }
        }
    }

    while let Some((ix, iy)) = queue.pop_front() {
        for nx_idx in ix.saturating_sub(1)..=(ix + 1).min(nx - 1) {
            for ny_idx in iy.saturating_sub(1)..=(iy + 1).min(ny - 1) {
                let idx = nx_idx * ny + ny_idx;
                if !edges[idx] && is_weak(nx_idx, ny_idx) {
                    edges[idx] = true;
                    queue.push_back((nx_idx, ny_idx));
                }
            }
        }
    }

    EdgeMap { geometry, edges }
}

/// Runs the full edge detector on `grid`
///
/// # Errors
///
/// `InvalidParameter` if `sigma` is negative or the low threshold exceeds the high threshold
pub fn detect_edges(grid: &DensityGrid, params: &EdgeDetectorParams) -> Result<EdgeMap> {
    params.validate()?;
    let blurred = gaussian_blur(grid, params.sigma, params.border_mode);
    let gradients = sobel(&blurred);
    let suppressed = non_maximum_suppression(&gradients);
    let edges = hysteresis(&suppressed, params.low_threshold, params.high_threshold);
    debug!(
        "Edge detection on {}x{} raster found {} edge cells",
        grid.nx(),
        grid.ny(),
        edges.len()
    );
    Ok(edges)
}
