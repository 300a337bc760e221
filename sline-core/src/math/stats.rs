use float_ord::FloatOrd;
use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Computes the `q`-th percentile (`0 <= q <= 100`) of `values` using linear interpolation between the
/// two closest ranks. NaN values are ignored. Returns `None` if there are no (non-NaN) values
/// ```
/// # use sline_core::math::percentile;
/// assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), Some(2.5));
/// assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 100.0), Some(4.0));
/// assert_eq!(percentile(&[], 10.0), None);
/// ```
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .collect::<Vec<_>>();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable_by_key(|v| FloatOrd(*v));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// The median of `values`, i.e. the 50th [percentile]
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Equal-width histogram over the value range of a sample
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram {
    counts: Vec<usize>,
    edges: Vec<f64>,
}

impl Histogram {
    /// Bins `values` into `num_bins` equal-width bins spanning `[min, max]` of the values. The last bin
    /// includes its upper edge. A constant sample is spread over `[value - 0.5, value + 0.5]`. NaN values are
    /// skipped. Returns `None` if there are no values or `num_bins` is zero
    pub fn new(values: &[f64], num_bins: usize) -> Option<Self> {
        if num_bins == 0 {
            return None;
        }
        let (min, max) = values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .minmax_by_key(|v| FloatOrd(*v))
            .into_option()?;
        let (low, high) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };

        let width = (high - low) / num_bins as f64;
        let edges = (0..=num_bins)
            .map(|idx| low + width * idx as f64)
            .collect::<Vec<_>>();
        let mut histogram = Self {
            counts: vec![0; num_bins],
            edges,
        };
        for value in values.iter().filter(|v| !v.is_nan()) {
            let bin = histogram.bin_of(*value);
            histogram.counts[bin] += 1;
        }
        Some(histogram)
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// The `num_bins + 1` bin edges in ascending order
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Lower edge of the bin with index `bin`
    pub fn lower_edge(&self, bin: usize) -> f64 {
        self.edges[bin]
    }

    /// Index of the bin that `value` falls into. Values outside of the histogram range are clamped to
    /// the first or last bin, so the result is always a valid bin index
    pub fn bin_of(&self, value: f64) -> usize {
        let low = self.edges[0];
        let high = self.edges[self.edges.len() - 1];
        let num_bins = self.counts.len();
        if value.is_nan() || value <= low {
            return 0;
        }
        let relative = (value - low) / (high - low) * num_bins as f64;
        (relative.floor() as usize).min(num_bins - 1)
    }
}

/// Finds the indices of all local maxima in `values`. A local maximum is a sample (or a run of equal
/// samples) that is strictly larger than its neighbours on both sides. For a run of equal samples, the
/// middle index (rounded down) is reported. The first and last sample are never local maxima
/// ```
/// # use sline_core::math::local_maxima;
/// assert_eq!(local_maxima(&[0.0, 2.0, 1.0, 3.0, 3.0, 3.0, 0.0]), vec![1, 4]);
/// assert!(local_maxima(&[1.0, 2.0, 3.0]).is_empty());
/// ```
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut maxima = vec![];
    if values.len() < 3 {
        return maxima;
    }
    let mut idx = 1;
    while idx < values.len() - 1 {
        if values[idx - 1] < values[idx] {
            let mut plateau_end = idx;
            while plateau_end + 1 < values.len() && values[plateau_end + 1] == values[idx] {
                plateau_end += 1;
            }
            if plateau_end + 1 < values.len() && values[plateau_end + 1] < values[idx] {
                maxima.push((idx + plateau_end) / 2);
            }
            idx = plateau_end + 1;
        } else {
            idx += 1;
        }
    }
    maxima
}

/// Finds the indices of all local minima in `values`, with the same plateau and boundary rules as [local_maxima]
pub fn local_minima(values: &[f64]) -> Vec<usize> {
    let negated = values.iter().map(|v| -v).collect::<Vec<_>>();
    local_maxima(&negated)
}
