//! Shoreline change between two detected curves, measured at regularly spaced stations along a reference curve

use log::debug;
use sline_core::{
    error::{ensure_positive, Result, ShorelineError},
    nalgebra::Vector2,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distances measured at one station along the reference curve
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvelopeSample {
    pub position: Vector2<f64>,
    pub to_reference: f64,
    pub to_comparison: f64,
    /// Larger of the two distances
    pub max: f64,
    /// Mean of the two distances
    pub mean: f64,
}

/// Largest `max` and average `mean` over all samples
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvelopeSummary {
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChangeEnvelope {
    pub samples: Vec<EnvelopeSample>,
    pub summary: EnvelopeSummary,
}

fn polyline_length(polyline: &[Vector2<f64>]) -> f64 {
    polyline
        .windows(2)
        .map(|segment| (segment[1] - segment[0]).norm())
        .sum()
}

/// The point at arc length `distance` along `polyline`, clamped to its end
fn interpolate(polyline: &[Vector2<f64>], distance: f64) -> Vector2<f64> {
    let mut remaining = distance;
    for segment in polyline.windows(2) {
        let length = (segment[1] - segment[0]).norm();
        if remaining <= length {
            if length == 0.0 {
                return segment[0];
            }
            return segment[0] + (segment[1] - segment[0]) * (remaining / length);
        }
        remaining -= length;
    }
    polyline[polyline.len() - 1]
}

fn distance_to_segment(point: &Vector2<f64>, from: &Vector2<f64>, to: &Vector2<f64>) -> f64 {
    let direction = to - from;
    let length_squared = direction.norm_squared();
    if length_squared == 0.0 {
        return (point - from).norm();
    }
    let t = ((point - from).dot(&direction) / length_squared).clamp(0.0, 1.0);
    (point - (from + direction * t)).norm()
}

/// Shortest distance from `point` to any segment of `polyline`
pub fn distance_to_polyline(point: &Vector2<f64>, polyline: &[Vector2<f64>]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [single] => (point - single).norm(),
        _ => polyline
            .windows(2)
            .map(|segment| distance_to_segment(point, &segment[0], &segment[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

fn ensure_polyline(polyline: &[Vector2<f64>]) -> Result<()> {
    if polyline.len() < 2 {
        return Err(ShorelineError::InsufficientBoundary {
            nodes: polyline.len(),
        });
    }
    Ok(())
}

/// Samples stations along `reference` every `spacing` units, starting at its first vertex, and measures the
/// distance of each station to both curves. A reference of length `len` yields `floor(len / spacing) + 1`
/// stations
///
/// # Errors
///
/// `InvalidParameter` if `spacing` is not positive, `InsufficientBoundary` if either curve has fewer than two
/// vertices
///
/// ```
/// # use sline_algorithms::change::change_envelope;
/// # use sline_core::nalgebra::Vector2;
/// let reference = [Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0)];
/// let comparison = [Vector2::new(0.0, 2.0), Vector2::new(10.0, 2.0)];
/// let envelope = change_envelope(&reference, &comparison, 2.5).unwrap();
/// assert_eq!(5, envelope.samples.len());
/// assert_eq!(2.0, envelope.summary.max);
/// ```
pub fn change_envelope(
    reference: &[Vector2<f64>],
    comparison: &[Vector2<f64>],
    spacing: f64,
) -> Result<ChangeEnvelope> {
    ensure_positive("spacing", spacing)?;
    ensure_polyline(reference)?;
    ensure_polyline(comparison)?;

    let length = polyline_length(reference);
    let stations = (length / spacing).floor() as usize + 1;
    let samples = (0..stations)
        .map(|station| {
            let position = interpolate(reference, station as f64 * spacing);
            let to_reference = distance_to_polyline(&position, reference);
            let to_comparison = distance_to_polyline(&position, comparison);
            EnvelopeSample {
                position,
                to_reference,
                to_comparison,
                max: to_reference.max(to_comparison),
                mean: (to_reference + to_comparison) / 2.0,
            }
        })
        .collect::<Vec<_>>();

    let summary = EnvelopeSummary {
        max: samples.iter().map(|s| s.max).fold(f64::NEG_INFINITY, f64::max),
        mean: samples.iter().map(|s| s.mean).sum::<f64>() / samples.len() as f64,
    };
    debug!(
        "{} stations along a reference of length {:.2}: max {:.3}, mean {:.3}",
        samples.len(),
        length,
        summary.max,
        summary.mean
    );
    Ok(ChangeEnvelope { samples, summary })
}
