//! Selection of the points that make up the land/water boundary zone.
//!
//! Three strategies are supported: thresholds on intensity, elevation, scan angle and return number
//! ([IntensityFilter]), discrete classification codes ([ClassFilter]) and color plus elevation ranges
//! ([ColorFilter]). All of them produce boolean masks with one entry per point of the cloud.

use log::{debug, info, warn};
use sline_core::{
    containers::PointCloud,
    error::{Result, ShorelineError},
    layout::{Point, CLASS_GROUND, CLASS_WATER},
    math::{median, percentile},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::advisor::otsu_threshold;

/// Elevation ceiling used when it can neither be taken from the configuration nor derived from the points
/// near the intensity threshold
pub const FALLBACK_Z_DYNAMIC: f64 = 1.0;
/// Points whose intensity is strictly within this distance of the threshold are used to derive the elevation ceiling
const Z_DYNAMIC_INTENSITY_BAND: f64 = 5.0;
const Z_DYNAMIC_PERCENTILE: f64 = 90.0;

/// Direction of an intensity threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThresholdSign {
    /// Keep intensities strictly above the threshold
    Greater,
    /// Keep intensities strictly below the threshold
    Less,
}

impl ThresholdSign {
    pub fn accepts(&self, value: f64, threshold: f64) -> bool {
        match self {
            ThresholdSign::Greater => value > threshold,
            ThresholdSign::Less => value < threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ThresholdSign::Greater => ">",
            ThresholdSign::Less => "<",
        }
    }
}

/// A concrete intensity threshold together with its direction
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensityCut {
    pub value: f64,
    pub sign: ThresholdSign,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntensityThreshold {
    /// Derive the threshold and its direction from the intensities of the low zone
    Auto,
    Manual(IntensityCut),
}

/// Selects boundary-zone points by intensity, elevation, scan angle and return number
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensityFilter {
    /// Only points at or below this elevation are used to derive thresholds
    pub z_ceiling: f64,
    /// Elevation ceiling of the final selection. `None` derives it from the points near the intensity threshold
    pub z_dynamic: Option<f64>,
    /// Only points with an absolute scan angle strictly above this value are selected
    pub scan_angle_threshold: f64,
    pub max_return_number: u8,
    pub threshold: IntensityThreshold,
}

impl Default for IntensityFilter {
    fn default() -> Self {
        Self {
            z_ceiling: 2.0,
            z_dynamic: None,
            scan_angle_threshold: 15.0,
            max_return_number: 1,
            threshold: IntensityThreshold::Auto,
        }
    }
}

/// The mask produced by an [IntensityFilter] together with the parameters that were actually applied
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensitySelection {
    pub mask: Vec<bool>,
    /// `None` if the threshold was to be derived automatically but the low zone is empty
    pub threshold: Option<IntensityCut>,
    pub z_dynamic: Option<f64>,
}

impl IntensitySelection {
    pub fn selected(&self) -> usize {
        self.mask.iter().filter(|s| **s).count()
    }
}

/// Derives the direction of an automatic threshold: `Greater` if the median of the intensities above the
/// threshold lies above the threshold
pub(crate) fn derive_sign(intensities: &[f64], threshold: f64) -> ThresholdSign {
    let above = intensities
        .iter()
        .copied()
        .filter(|i| *i > threshold)
        .collect::<Vec<_>>();
    match median(&above) {
        Some(median) if median > threshold => ThresholdSign::Greater,
        _ => ThresholdSign::Less,
    }
}

impl IntensityFilter {
    /// Computes the selection mask for `cloud`. An empty selection is a valid result
    pub fn select(&self, cloud: &PointCloud) -> IntensitySelection {
        let low_zone = cloud
            .iter()
            .filter(|p| p.z() <= self.z_ceiling)
            .collect::<Vec<_>>();
        let low_intensities = low_zone
            .iter()
            .map(|p| p.intensity as f64)
            .collect::<Vec<_>>();

        let cut = match self.threshold {
            IntensityThreshold::Manual(cut) => Some(cut),
            IntensityThreshold::Auto => otsu_threshold(&low_intensities).map(|value| IntensityCut {
                value,
                sign: derive_sign(&low_intensities, value),
            }),
        };
        let Some(cut) = cut else {
            warn!(
                "No points at or below z = {}, cannot derive an intensity threshold",
                self.z_ceiling
            );
            return IntensitySelection {
                mask: vec![false; cloud.len()],
                threshold: None,
                z_dynamic: self.z_dynamic,
            };
        };

        let z_dynamic = self.z_dynamic.unwrap_or_else(|| {
            let near_threshold = low_zone
                .iter()
                .filter(|p| (p.intensity as f64 - cut.value).abs() < Z_DYNAMIC_INTENSITY_BAND)
                .map(|p| p.z())
                .collect::<Vec<_>>();
            percentile(&near_threshold, Z_DYNAMIC_PERCENTILE).unwrap_or(FALLBACK_Z_DYNAMIC)
        });

        let mask = cloud
            .iter()
            .map(|point| {
                point.z() <= z_dynamic
                    && cut.sign.accepts(point.intensity as f64, cut.value)
                    && point.return_number <= self.max_return_number
                    && (point.scan_angle as f64).abs() > self.scan_angle_threshold
            })
            .collect::<Vec<_>>();

        let selection = IntensitySelection {
            mask,
            threshold: Some(cut),
            z_dynamic: Some(z_dynamic),
        };
        info!(
            "Intensity filter: intensity {} {:.1}, z <= {:.2}, {} of {} points selected",
            cut.sign.symbol(),
            cut.value,
            z_dynamic,
            selection.selected(),
            cloud.len()
        );
        selection
    }
}

/// Selects ground and water points by their classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassFilter {
    pub ground_class: u8,
    pub water_class: u8,
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self {
            ground_class: CLASS_GROUND,
            water_class: CLASS_WATER,
        }
    }
}

/// Masks of the ground and water points of a cloud
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSelection {
    pub ground: Vec<bool>,
    pub water: Vec<bool>,
}

impl ClassFilter {
    /// Computes the ground and water masks
    ///
    /// # Errors
    ///
    /// `EmptyClass` if there are no ground or no water points
    pub fn select(&self, cloud: &PointCloud) -> Result<ClassSelection> {
        let mask_of = |class: u8| -> Result<Vec<bool>> {
            let mask = cloud
                .iter()
                .map(|p| p.classification == class)
                .collect::<Vec<_>>();
            if mask.iter().any(|s| *s) {
                Ok(mask)
            } else {
                Err(ShorelineError::EmptyClass { class })
            }
        };
        let selection = ClassSelection {
            ground: mask_of(self.ground_class)?,
            water: mask_of(self.water_class)?,
        };
        debug!(
            "Class filter: {} ground and {} water points",
            selection.ground.iter().filter(|s| **s).count(),
            selection.water.iter().filter(|s| **s).count()
        );
        Ok(selection)
    }
}

/// Selects points whose color channels and elevation lie within inclusive ranges
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorFilter {
    pub red: (u16, u16),
    pub green: (u16, u16),
    pub blue: (u16, u16),
    pub z: (f64, f64),
}

impl ColorFilter {
    /// Bright, slightly blueish returns close to the water level, typical for wet sand
    pub fn sandy_beach() -> Self {
        Self {
            red: (30000, 65535),
            green: (30000, 65535),
            blue: (40000, 65535),
            z: (0.0, 1.0),
        }
    }

    pub fn accepts(&self, point: &Point) -> bool {
        let within = |value: u16, (min, max): (u16, u16)| (min..=max).contains(&value);
        within(point.red(), self.red)
            && within(point.green(), self.green)
            && within(point.blue(), self.blue)
            && (self.z.0..=self.z.1).contains(&point.z())
    }

    /// Computes the selection mask for `cloud`. An empty selection is a valid result
    pub fn select(&self, cloud: &PointCloud) -> Vec<bool> {
        let mask = cloud.iter().map(|p| self.accepts(p)).collect::<Vec<_>>();
        debug!(
            "Color filter selected {} of {} points",
            mask.iter().filter(|s| **s).count(),
            cloud.len()
        );
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    /// Low-lying points with two intensity populations, plus some high points
    fn two_populations() -> PointCloud {
        let mut points = vec![];
        for idx in 0..50 {
            let x = idx as f64;
            points.push(
                Point::at(x, 0.0, 0.5)
                    .with_intensity(50)
                    .with_scan_angle(20.0)
                    .with_return_number(1),
            );
            points.push(
                Point::at(x, 1.0, 0.5)
                    .with_intensity(200)
                    .with_scan_angle(-20.0)
                    .with_return_number(1),
            );
            points.push(Point::at(x, 2.0, 10.0).with_intensity(200).with_scan_angle(20.0));
        }
        PointCloud::new(points)
    }

    #[test]
    fn test_auto_threshold_and_sign() {
        let cloud = two_populations();
        let selection = IntensityFilter::default().select(&cloud);
        let cut = selection.threshold.unwrap();
        assert_eq!(ThresholdSign::Greater, cut.sign);
        assert!(cut.value > 50.0 && cut.value < 200.0);
        assert_eq!(Some(FALLBACK_Z_DYNAMIC), selection.z_dynamic);
        assert_eq!(50, selection.selected());
        for (point, selected) in cloud.iter().zip(&selection.mask) {
            assert_eq!(*selected, point.intensity == 200 && point.z() < 1.0);
        }
    }

    #[test]
    fn test_z_dynamic_from_points_near_threshold() {
        let mut points = two_populations().points().to_vec();
        points.push(Point::at(0.0, 5.0, 0.3).with_intensity(125));
        points.push(Point::at(1.0, 5.0, 0.7).with_intensity(126));
        let filter = IntensityFilter {
            threshold: IntensityThreshold::Manual(IntensityCut {
                value: 125.0,
                sign: ThresholdSign::Greater,
            }),
            ..Default::default()
        };
        let selection = filter.select(&PointCloud::new(points));
        assert_approx_eq!(0.66, selection.z_dynamic.unwrap());
    }

    #[test]
    fn test_empty_low_zone_yields_empty_mask() {
        let cloud = PointCloud::new(vec![Point::at(0.0, 0.0, 5.0).with_intensity(100)]);
        let selection = IntensityFilter::default().select(&cloud);
        assert_eq!(vec![false], selection.mask);
        assert_eq!(None, selection.threshold);
    }

    #[test]
    fn test_mask_monotonicity() {
        let cloud = two_populations();
        let manual = |value: f64, z_dynamic: f64, scan_angle_threshold: f64| IntensityFilter {
            z_dynamic: Some(z_dynamic),
            scan_angle_threshold,
            threshold: IntensityThreshold::Manual(IntensityCut {
                value,
                sign: ThresholdSign::Greater,
            }),
            ..Default::default()
        };
        let loose = manual(40.0, 20.0, 5.0).select(&cloud).mask;
        let tighter_intensity = manual(100.0, 20.0, 5.0).select(&cloud).mask;
        let tighter_z = manual(40.0, 1.0, 5.0).select(&cloud).mask;
        let tighter_angle = manual(40.0, 20.0, 25.0).select(&cloud).mask;
        for tighter in [tighter_intensity, tighter_z, tighter_angle] {
            assert!(tighter.iter().zip(&loose).all(|(t, l)| !*t || *l));
        }
    }

    #[test]
    fn test_return_number_filter() {
        let cloud = PointCloud::new(vec![
            Point::at(0.0, 0.0, 0.0).with_intensity(200).with_scan_angle(30.0).with_return_number(1),
            Point::at(0.0, 0.0, 0.0).with_intensity(200).with_scan_angle(30.0).with_return_number(2),
        ]);
        let filter = IntensityFilter {
            threshold: IntensityThreshold::Manual(IntensityCut {
                value: 100.0,
                sign: ThresholdSign::Greater,
            }),
            ..Default::default()
        };
        assert_eq!(vec![true, false], filter.select(&cloud).mask);
    }

    #[test]
    fn test_less_sign_when_nothing_above() {
        assert_eq!(ThresholdSign::Less, derive_sign(&[1.0, 2.0], 2.0));
        assert_eq!(ThresholdSign::Greater, derive_sign(&[1.0, 3.0], 2.0));
    }

    #[test]
    fn test_class_filter() {
        let cloud = PointCloud::new(vec![
            Point::at(0.0, 0.0, 0.0).with_classification(CLASS_GROUND),
            Point::at(1.0, 0.0, 0.0).with_classification(CLASS_WATER),
            Point::at(2.0, 0.0, 0.0).with_classification(1),
        ]);
        let selection = ClassFilter::default().select(&cloud).unwrap();
        assert_eq!(vec![true, false, false], selection.ground);
        assert_eq!(vec![false, true, false], selection.water);
    }

    #[test]
    fn test_class_filter_missing_water() {
        let cloud = PointCloud::new(vec![Point::at(0.0, 0.0, 0.0).with_classification(CLASS_GROUND)]);
        assert_eq!(
            Err(ShorelineError::EmptyClass { class: CLASS_WATER }),
            ClassFilter::default().select(&cloud)
        );
    }

    #[test]
    fn test_color_filter_ranges_are_inclusive() {
        let filter = ColorFilter::sandy_beach();
        assert!(filter.accepts(&Point::at(0.0, 0.0, 1.0).with_color(30000, 65535, 40000)));
        assert!(!filter.accepts(&Point::at(0.0, 0.0, 1.0).with_color(29999, 65535, 40000)));
        assert!(!filter.accepts(&Point::at(0.0, 0.0, 1.01).with_color(30000, 30000, 40000)));
        let cloud = PointCloud::new(vec![Point::at(0.0, 0.0, 0.5).with_color(0, 0, 0)]);
        assert_eq!(vec![false], filter.select(&cloud));
    }
}
