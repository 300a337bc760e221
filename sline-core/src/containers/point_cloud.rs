use nalgebra::{Point3, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{layout::Point, math::AABB};

/// An ordered set of points that share one coordinate reference system. Algorithms treat the points as a
/// set, the order only matters for tie-breaking, where the point with the lower index wins
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointCloud {
    points: Vec<Point>,
    crs: Option<String>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points, crs: None }
    }

    /// Attaches a coordinate reference system identifier (e.g. `"EPSG:2180"`) to this point cloud
    pub fn with_crs<S: Into<String>>(mut self, crs: S) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// Calculate the bounding box of all points. Returns `None` if the point cloud is empty
    /// ```
    /// # use sline_core::{containers::PointCloud, layout::Point};
    /// let cloud = PointCloud::new(vec![Point::at(0.0, 5.0, 1.0), Point::at(2.0, 1.0, -1.0)]);
    /// let bounds = cloud.bounds().unwrap();
    /// assert_eq!(bounds.extent(), nalgebra::Vector3::new(2.0, 4.0, 2.0));
    /// ```
    pub fn bounds(&self) -> Option<AABB<f64>> {
        AABB::from_points(self.points.iter().map(|p| Point3::from(p.position)))
    }

    /// Returns a new point cloud with the points for which `mask` is `true`, keeping their order and the CRS
    ///
    /// # Panics
    ///
    /// If `mask` does not have one entry per point
    pub fn select(&self, mask: &[bool]) -> PointCloud {
        assert_eq!(
            self.points.len(),
            mask.len(),
            "Selection mask must have one entry per point"
        );
        PointCloud {
            points: self
                .points
                .iter()
                .zip(mask)
                .filter(|(_, selected)| **selected)
                .map(|(point, _)| *point)
                .collect(),
            crs: self.crs.clone(),
        }
    }

    /// Returns every `stride`-th point, starting with the first. A stride of 0 or 1 keeps all points
    pub fn decimate(&self, stride: usize) -> PointCloud {
        PointCloud {
            points: self.points.iter().step_by(stride.max(1)).copied().collect(),
            crs: self.crs.clone(),
        }
    }

    /// Planimetric (x, y) positions of all points
    pub fn positions_2d(&self) -> Vec<Vector2<f64>> {
        self.points.iter().map(|p| p.xy()).collect()
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
