use nalgebra::{ClosedSub, Point3, Scalar, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::MinMax;

/// 3D axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AABB<T: Scalar + PartialOrd> {
    min: Point3<T>,
    max: Point3<T>,
}

impl<T: Scalar + ClosedSub + PartialOrd + MinMax + Copy> AABB<T> {
    /// Creates a new AABB from the given minimum and maximum coordinates. Panics if the minimum position is
    /// not less than or equal to the maximum position
    /// ```
    /// # use sline_core::math::AABB;
    /// let bounds = AABB::from_min_max(nalgebra::Point3::new(0.0, 0.0, 0.0), nalgebra::Point3::new(1.0, 1.0, 1.0));
    /// ```
    pub fn from_min_max(min: Point3<T>, max: Point3<T>) -> Self {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            panic!("AABB::from_min_max: Minimum position must be <= maximum position!");
        }
        Self { min, max }
    }

    /// Creates a new AABB from the given minimum and maximum coordinates without checking that min <= max
    pub fn from_min_max_unchecked(min: Point3<T>, max: Point3<T>) -> Self {
        Self { min, max }
    }

    /// Computes the tightest AABB around the given positions. Returns `None` if `positions` is empty
    /// ```
    /// # use sline_core::math::AABB;
    /// # use nalgebra::Point3;
    /// let bounds = AABB::from_points([Point3::new(1.0, 5.0, 0.0), Point3::new(-1.0, 2.0, 3.0)]).unwrap();
    /// assert_eq!(*bounds.min(), Point3::new(-1.0, 2.0, 0.0));
    /// assert_eq!(*bounds.max(), Point3::new(1.0, 5.0, 3.0));
    /// ```
    pub fn from_points<I: IntoIterator<Item = Point3<T>>>(positions: I) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let bounds = Self::from_min_max_unchecked(first, first);
        Some(iter.fold(bounds, |bounds, point| {
            AABB::extend_with_point(&bounds, &point)
        }))
    }

    /// Returns the minimum point of this AABB
    pub fn min(&self) -> &Point3<T> {
        &self.min
    }

    /// Returns the maximum point of this AABB
    pub fn max(&self) -> &Point3<T> {
        &self.max
    }

    /// Returns the extent of this AABB. The extent is the size between the minimum and maximum position of this AABB
    /// ```
    /// # use sline_core::math::AABB;
    /// let bounds = AABB::from_min_max_unchecked(nalgebra::Point3::new(0.0, 0.0, 0.0), nalgebra::Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(bounds.extent(), nalgebra::Vector3::new(1.0, 2.0, 3.0));
    /// ```
    pub fn extent(&self) -> Vector3<T> {
        self.max - self.min
    }

    /// Returns true if the given point is contained within this AABB. Points right on the boundary
    /// of this AABB count as contained
    pub fn contains(&self, point: &Point3<T>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Extends the given AABB so that it contains the given point
    pub fn extend_with_point(bounds: &AABB<T>, point: &Point3<T>) -> AABB<T> {
        Self {
            min: Point3::new(
                bounds.min.x.infimum(&point.x),
                bounds.min.y.infimum(&point.y),
                bounds.min.z.infimum(&point.z),
            ),
            max: Point3::new(
                bounds.max.x.supremum(&point.x),
                bounds.max.y.supremum(&point.y),
                bounds.max.z.supremum(&point.z),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_empty() {
        let bounds = AABB::<f64>::from_points(std::iter::empty());
        assert!(bounds.is_none());
    }

    #[test]
    fn test_contains_boundary() {
        let bounds =
            AABB::from_points([Point3::new(0.0, 0.0, -1.0), Point3::new(10.0, 4.0, 2.0)]).unwrap();
        assert!(bounds.contains(&Point3::new(10.0, 4.0, 2.0)));
        assert!(bounds.contains(&Point3::new(5.0, 2.0, 0.0)));
        assert!(!bounds.contains(&Point3::new(10.5, 2.0, 0.0)));
    }

    #[test]
    #[should_panic]
    fn test_from_min_max_rejects_inverted() {
        AABB::from_min_max(Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0));
    }
}
