//! Curve smoothing: Savitzky-Golay filtering for graph-ordered curves, jump removal and Gaussian filtering for
//! scanline curves

use log::debug;
use sline_core::{
    math::percentile,
    nalgebra::{Matrix3, Vector3},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rasterize::{Axis, BoundaryCandidate};

const MAX_SAVGOL_WINDOW: usize = 21;
const MIN_SAVGOL_WINDOW: usize = 5;

/// Window length of the Savitzky-Golay filter for a curve with `len` vertices: the largest odd number that is
/// not larger than `len` or 21. Returns `None` if that window would be shorter than 5
pub fn savgol_window(len: usize) -> Option<usize> {
    let window = if len % 2 == 1 { len } else { len.saturating_sub(1) };
    let window = window.min(MAX_SAVGOL_WINDOW);
    if window < MIN_SAVGOL_WINDOW {
        None
    } else {
        Some(window)
    }
}

/// Savitzky-Golay filter with a quadratic polynomial and an odd `window`. Each output sample is the value of the
/// least-squares parabola through the window centered on it. Near the borders, where no centered window fits,
/// the parabola of the first (or last) full window is evaluated instead
pub fn savitzky_golay(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if window < 3 || window > n {
        return values.to_vec();
    }
    let half = window / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half).min(n - window);
            let mut normal = Matrix3::zeros();
            let mut rhs = Vector3::zeros();
            for (j, value) in values.iter().enumerate().skip(start).take(window) {
                let t = j as f64 - i as f64;
                let row = Vector3::new(1.0, t, t * t);
                normal += row * row.transpose();
                rhs += row * *value;
            }
            // The parabola evaluated at t = 0 is its constant coefficient
            normal
                .lu()
                .solve(&rhs)
                .map(|coefficients| coefficients[0])
                .unwrap_or(values[i])
        })
        .collect()
}

/// Applies [savitzky_golay] to the x and y coordinates of a curve. Elevations are kept. Curves too short for a
/// window of 5 vertices are returned unchanged
pub fn smooth_savitzky_golay(curve: &[BoundaryCandidate]) -> Vec<BoundaryCandidate> {
    let Some(window) = savgol_window(curve.len()) else {
        debug!("Curve of {} vertices is too short for smoothing", curve.len());
        return curve.to_vec();
    };
    let xs = savitzky_golay(&curve.iter().map(|c| c.position.x).collect::<Vec<_>>(), window);
    let ys = savitzky_golay(&curve.iter().map(|c| c.position.y).collect::<Vec<_>>(), window);
    curve
        .iter()
        .zip(xs.into_iter().zip(ys))
        .map(|(candidate, (x, y))| {
            let mut smoothed = *candidate;
            smoothed.position.x = x;
            smoothed.position.y = y;
            smoothed
        })
        .collect()
}

/// One-dimensional Gaussian filter. The kernel extends over `round(4 * sigma)` samples on each side, samples
/// beyond the ends are mirrored (`d c b a | a b c d | d c b a`)
pub fn gaussian_filter(values: &[f64], sigma: f64) -> Vec<f64> {
    let n = values.len() as i64;
    if n == 0 || sigma <= 0.0 {
        return values.to_vec();
    }
    let radius = (4.0 * sigma + 0.5) as i64;
    let weights = (-radius..=radius)
        .map(|offset| (-0.5 * (offset as f64 / sigma).powi(2)).exp())
        .collect::<Vec<_>>();
    let norm = weights.iter().sum::<f64>();

    let reflect = |idx: i64| -> usize {
        let period = 2 * n;
        let folded = idx.rem_euclid(period);
        (if folded < n { folded } else { period - 1 - folded }) as usize
    };

    (0..n)
        .map(|i| {
            weights
                .iter()
                .enumerate()
                .map(|(k, w)| w * values[reflect(i + k as i64 - radius)])
                .sum::<f64>()
                / norm
        })
        .collect()
}

/// Parameters for smoothing scanline curves
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanlineSmoothing {
    /// Standard deviation of the Gaussian filter, in vertices. Zero disables the filter
    pub sigma: f64,
    /// Jumps larger than `jump_factor` times the `jump_percentile` of all jumps are removed
    pub jump_factor: f64,
    pub jump_percentile: f64,
}

impl Default for ScanlineSmoothing {
    fn default() -> Self {
        Self {
            sigma: 2.0,
            jump_factor: 1.5,
            jump_percentile: 90.0,
        }
    }
}

/// Removes vertices whose secondary coordinate jumps away from the preceding vertex (in the unfiltered
/// sequence) by strictly more than `jump_factor` times the `jump_percentile` of all such jumps. The first
/// vertex is always kept. Sequences of 5 or fewer vertices are returned unchanged
pub fn remove_jumps(
    curve: &[BoundaryCandidate],
    axis: Axis,
    params: &ScanlineSmoothing,
) -> Vec<BoundaryCandidate> {
    if curve.len() <= 5 {
        return curve.to_vec();
    }
    let jumps = curve
        .windows(2)
        .map(|pair| (axis.secondary(&pair[1].position) - axis.secondary(&pair[0].position)).abs())
        .collect::<Vec<_>>();
    let Some(typical) = percentile(&jumps, params.jump_percentile) else {
        return curve.to_vec();
    };
    let limit = params.jump_factor * typical;

    let filtered = std::iter::once(curve[0])
        .chain(
            curve[1..]
                .iter()
                .zip(&jumps)
                .filter(|(_, jump)| **jump <= limit)
                .map(|(candidate, _)| *candidate),
        )
        .collect::<Vec<_>>();
    debug!(
        "Jump filter removed {} of {} vertices (limit {:.3})",
        curve.len() - filtered.len(),
        curve.len(),
        limit
    );
    filtered
}

/// Smooths a scanline curve: jump removal followed by a Gaussian filter on the secondary coordinate (if more
/// than 3 vertices remain). Curves with fewer than 3 vertices are returned unchanged
pub fn smooth_scanline(
    curve: &[BoundaryCandidate],
    axis: Axis,
    params: &ScanlineSmoothing,
) -> Vec<BoundaryCandidate> {
    if curve.len() < 3 {
        return curve.to_vec();
    }
    let mut filtered = remove_jumps(curve, axis, params);
    if filtered.len() > 3 && params.sigma > 0.0 {
        let secondary = filtered
            .iter()
            .map(|c| axis.secondary(&c.position))
            .collect::<Vec<_>>();
        for (candidate, value) in filtered
            .iter_mut()
            .zip(gaussian_filter(&secondary, params.sigma))
        {
            match axis {
                Axis::X => candidate.position.y = value,
                Axis::Y => candidate.position.x = value,
            }
        }
    }
    filtered
}
