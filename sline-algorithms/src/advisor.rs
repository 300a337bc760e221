//! Threshold suggestions for the intensity filter, derived from the value distributions of the low zone.
//!
//! All functions are pure. The result of [suggest_thresholds] is handed to the classifier explicitly through
//! [ThresholdSuggestions::apply_to].

use float_ord::FloatOrd;
use itertools::Itertools;
use log::{info, warn};
use sline_core::{
    containers::PointCloud,
    error::{Result, ShorelineError},
    math::{local_maxima, local_minima, percentile, Histogram},
    raster::{DensityGrid, GridGeometry},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::classify::{derive_sign, IntensityCut, IntensityFilter, IntensityThreshold, ThresholdSign};

const OTSU_BINS: usize = 256;
const VALLEY_BINS: usize = 100;
const VALLEY_WINDOW: usize = 10;
const ELEVATION_CEILING_PERCENTILE: f64 = 10.0;

/// Otsu's threshold: the split of a 256-bin histogram over `[min, max]` of `values` that maximizes the
/// between-class variance. If several consecutive splits reach the maximum, the threshold lies in the middle
/// of them. A constant sample yields that constant, an empty sample (or one with only NaN values) `None`
/// ```
/// # use sline_algorithms::advisor::otsu_threshold;
/// let values = [vec![50.0; 100], vec![200.0; 100]].concat();
/// let threshold = otsu_threshold(&values).unwrap();
/// assert!((threshold - 125.0).abs() < 1.0);
/// ```
pub fn otsu_threshold(values: &[f64]) -> Option<f64> {
    let (min, max) = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .minmax_by_key(|v| FloatOrd(*v))
        .into_option()?;
    if min == max {
        return Some(min);
    }
    let histogram = Histogram::new(values, OTSU_BINS)?;
    let edges = histogram.edges();

    let counts = histogram.counts().iter().map(|c| *c as f64).collect::<Vec<_>>();
    let centers = edges
        .windows(2)
        .map(|edge| (edge[0] + edge[1]) / 2.0)
        .collect::<Vec<_>>();
    let total = counts.iter().sum::<f64>();
    let total_moment = counts.iter().zip(&centers).map(|(c, x)| c * x).sum::<f64>();

    // variances[i] is the between-class variance when bins 0..=i form the lower class
    let mut variances = Vec::with_capacity(OTSU_BINS - 1);
    let mut weight_low = 0.0;
    let mut moment_low = 0.0;
    for i in 0..OTSU_BINS - 1 {
        weight_low += counts[i];
        moment_low += counts[i] * centers[i];
        let weight_high = total - weight_low;
        if weight_low == 0.0 || weight_high == 0.0 {
            variances.push(0.0);
            continue;
        }
        let mean_low = moment_low / weight_low;
        let mean_high = (total_moment - moment_low) / weight_high;
        variances.push(weight_low * weight_high * (mean_low - mean_high).powi(2));
    }

    let best = variances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let is_best = |v: f64| (best - v).abs() <= best.abs() * 1e-12;
    let first = variances.iter().position(|v| is_best(*v))?;
    let plateau_len = variances[first..].iter().take_while(|v| is_best(**v)).count();
    let last = first + plateau_len - 1;
    Some((centers[first] + centers[last]) / 2.0)
}

/// The lower edge of the least populated bin of a 100-bin histogram within 10 bins around the bin of `otsu`.
/// The search window is `[b - 10, b + 10)` clamped to the histogram, where `b` is the bin of `otsu`, and the
/// first bin with the minimum count wins. Returns `None` for an empty sample
pub fn intensity_valley(values: &[f64], otsu: f64) -> Option<f64> {
    let histogram = Histogram::new(values, VALLEY_BINS)?;
    let otsu_bin = histogram.bin_of(otsu);
    let start = otsu_bin.saturating_sub(VALLEY_WINDOW);
    let end = (otsu_bin + VALLEY_WINDOW).min(VALLEY_BINS);
    let valley = histogram.counts()[start..end].iter().position_min()?;
    Some(histogram.lower_edge(start + valley))
}

/// The lower edge of the first local minimum after the dominant peak of a 100-bin scan angle histogram. The
/// dominant peak is the highest local maximum, the first one if several are equally high
///
/// # Errors
///
/// `NoValleyFound` if the histogram has no local maximum, or no local minimum after the dominant peak
pub fn scan_angle_valley(scan_angles: &[f64]) -> Result<f64> {
    let histogram = Histogram::new(scan_angles, VALLEY_BINS).ok_or(ShorelineError::NoValleyFound)?;
    let counts = histogram.counts().iter().map(|c| *c as f64).collect::<Vec<_>>();
    let peak = local_maxima(&counts)
        .into_iter()
        .rev()
        .max_by(|a, b| counts[*a].total_cmp(&counts[*b]))
        .ok_or(ShorelineError::NoValleyFound)?;
    let valley = local_minima(&counts)
        .into_iter()
        .find(|idx| *idx > peak)
        .ok_or(ShorelineError::NoValleyFound)?;
    Ok(histogram.lower_edge(valley))
}

/// Suggested elevation ceiling: the 10th percentile of the elevations of high-intensity points
pub fn elevation_ceiling(elevations: &[f64]) -> Option<f64> {
    percentile(elevations, ELEVATION_CEILING_PERCENTILE)
}

/// Parameters of [suggest_thresholds]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdvisorParams {
    /// Only points at or below this elevation are analyzed
    pub z_ceiling: f64,
    /// Only points with an intensity within this inclusive range are analyzed
    pub intensity_range: (u16, u16),
}

impl Default for AdvisorParams {
    fn default() -> Self {
        Self {
            z_ceiling: 2.0,
            intensity_range: (0, 255),
        }
    }
}

impl AdvisorParams {
    fn analyzed_mask(&self, cloud: &PointCloud) -> Vec<bool> {
        let (min, max) = self.intensity_range;
        cloud
            .iter()
            .map(|p| p.z() <= self.z_ceiling && (min..=max).contains(&p.intensity))
            .collect()
    }
}

/// Thresholds suggested for an [IntensityFilter]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdSuggestions {
    pub otsu: f64,
    pub intensity_valley: f64,
    /// Direction of the intensity threshold, derived like the automatic mode of the intensity filter
    pub sign: ThresholdSign,
    pub scan_angle: Option<f64>,
    pub z_dynamic: Option<f64>,
}

impl ThresholdSuggestions {
    /// Configures `filter` to use the suggested thresholds: a manual intensity threshold at the histogram valley,
    /// and the suggested scan angle threshold and elevation ceiling where they could be derived
    pub fn apply_to(&self, filter: &mut IntensityFilter) {
        filter.threshold = IntensityThreshold::Manual(IntensityCut {
            value: self.intensity_valley,
            sign: self.sign,
        });
        if let Some(scan_angle) = self.scan_angle {
            filter.scan_angle_threshold = scan_angle;
        }
        if let Some(z_dynamic) = self.z_dynamic {
            filter.z_dynamic = Some(z_dynamic);
        }
    }
}

/// Analyzes the low zone of `cloud` and suggests thresholds for the intensity filter. Returns `None` if no
/// point lies within the low zone and the intensity range
pub fn suggest_thresholds(cloud: &PointCloud, params: &AdvisorParams) -> Option<ThresholdSuggestions> {
    let analyzed = cloud.select(&params.analyzed_mask(cloud));
    let intensities = analyzed
        .iter()
        .map(|p| p.intensity as f64)
        .collect::<Vec<_>>();
    let Some(otsu) = otsu_threshold(&intensities) else {
        warn!("No intensity values in the analyzed range");
        return None;
    };
    let intensity_valley = intensity_valley(&intensities, otsu)?;

    let scan_angles = analyzed
        .iter()
        .map(|p| p.scan_angle as f64)
        .collect::<Vec<_>>();
    let scan_angle = match scan_angle_valley(&scan_angles) {
        Ok(angle) => Some(angle),
        Err(err) => {
            warn!("{}", err);
            None
        }
    };

    let high_intensity_elevations = analyzed
        .iter()
        .filter(|p| p.intensity as f64 > otsu)
        .map(|p| p.z())
        .collect::<Vec<_>>();
    let suggestions = ThresholdSuggestions {
        otsu,
        intensity_valley,
        sign: derive_sign(&intensities, otsu),
        scan_angle,
        z_dynamic: elevation_ceiling(&high_intensity_elevations),
    };
    info!(
        "Suggested thresholds over {} points: Otsu {:.1}, valley {:.1}, scan angle {:?}, z {:?}",
        analyzed.len(),
        suggestions.otsu,
        suggestions.intensity_valley,
        suggestions.scan_angle,
        suggestions.z_dynamic
    );
    Some(suggestions)
}

/// Mean intensity per cell of the analyzed low-zone points, on a grid over the extent of the low zone.
/// Cells without analyzed points are NaN
///
/// # Errors
///
/// `GridTooCoarse` if the low zone is empty or smaller than one cell, `InvalidParameter` for a non-positive
/// cell size
pub fn intensity_map(cloud: &PointCloud, params: &AdvisorParams, cell_size: f64) -> Result<DensityGrid> {
    let low_zone = cloud.select(
        &cloud
            .iter()
            .map(|p| p.z() <= params.z_ceiling)
            .collect::<Vec<_>>(),
    );
    let bounds = low_zone.bounds().ok_or(ShorelineError::GridTooCoarse {
        cell_size,
        extent_x: 0.0,
        extent_y: 0.0,
    })?;
    let geometry = GridGeometry::covering(&bounds, cell_size)?;
    let analyzed = low_zone.select(&params.analyzed_mask(&low_zone));
    Ok(DensityGrid::mean(
        geometry,
        analyzed.iter().map(|p| (p.xy(), p.intensity as f64)),
    ))
}
