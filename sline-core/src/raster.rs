use nalgebra::Vector2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{ensure_positive, Result, ShorelineError},
    math::AABB,
};

/// Regular tiling of a rectangle into `nx * ny` cells. The number of cells per axis is
/// `floor(extent / cell_size)`, and the cells are stretched so that they cover the full extent exactly. Because of
/// this, the actual cell width can be slightly larger than the requested cell size. The last cell on each axis
/// includes its upper edge
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridGeometry {
    min: Vector2<f64>,
    max: Vector2<f64>,
    nx: usize,
    ny: usize,
}

impl GridGeometry {
    /// Creates the grid geometry covering the planimetric extent of `bounds` with cells of size `cell_size`
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `cell_size` is not positive, `GridTooCoarse` if the extent along x or y is smaller
    /// than one cell
    /// ```
    /// # use sline_core::{math::AABB, raster::GridGeometry};
    /// # use nalgebra::Point3;
    /// let bounds = AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 4.9, 1.0));
    /// let geometry = GridGeometry::covering(&bounds, 0.5).unwrap();
    /// assert_eq!((geometry.nx(), geometry.ny()), (20, 9));
    /// ```
    pub fn covering(bounds: &AABB<f64>, cell_size: f64) -> Result<Self> {
        ensure_positive("cell_size", cell_size)?;
        let extent = bounds.extent();
        let nx = (extent.x / cell_size).floor() as usize;
        let ny = (extent.y / cell_size).floor() as usize;
        if nx == 0 || ny == 0 {
            return Err(ShorelineError::GridTooCoarse {
                cell_size,
                extent_x: extent.x,
                extent_y: extent.y,
            });
        }
        Ok(Self {
            min: bounds.min().coords.xy(),
            max: bounds.max().coords.xy(),
            nx,
            ny,
        })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The actual width of the cells along x and y
    pub fn cell_width(&self) -> Vector2<f64> {
        Vector2::new(
            (self.max.x - self.min.x) / self.nx as f64,
            (self.max.y - self.min.y) / self.ny as f64,
        )
    }

    /// Returns the cell that contains `position`, or `None` if `position` lies outside of the grid
    pub fn cell_of(&self, position: &Vector2<f64>) -> Option<(usize, usize)> {
        let ix = Self::axis_index(position.x, self.min.x, self.max.x, self.nx)?;
        let iy = Self::axis_index(position.y, self.min.y, self.max.y, self.ny)?;
        Some((ix, iy))
    }

    fn axis_index(value: f64, min: f64, max: f64, count: usize) -> Option<usize> {
        if !(min..=max).contains(&value) {
            return None;
        }
        let relative = (value - min) / (max - min) * count as f64;
        Some((relative.floor() as usize).min(count - 1))
    }

    /// Center coordinate of the cell `(ix, iy)`
    pub fn cell_center(&self, ix: usize, iy: usize) -> Vector2<f64> {
        let width = self.cell_width();
        Vector2::new(
            self.min.x + (ix as f64 + 0.5) * width.x,
            self.min.y + (iy as f64 + 0.5) * width.y,
        )
    }
}

/// A 2D raster of per-cell statistics (point counts or mean attribute values) over a [GridGeometry].
/// Cells are addressed as `(ix, iy)`, with `ix` along the x axis
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DensityGrid {
    geometry: GridGeometry,
    values: Vec<f64>,
}

impl DensityGrid {
    /// Creates a grid with all cells set to `value`
    pub fn filled(geometry: GridGeometry, value: f64) -> Self {
        Self {
            values: vec![value; geometry.len()],
            geometry,
        }
    }

    /// Counts the positions per cell. Positions outside of the grid are ignored
    /// ```
    /// # use sline_core::{math::AABB, raster::{DensityGrid, GridGeometry}};
    /// # use nalgebra::{Point3, Vector2};
    /// let bounds = AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 0.0));
    /// let geometry = GridGeometry::covering(&bounds, 1.0).unwrap();
    /// let grid = DensityGrid::count(geometry, [Vector2::new(0.5, 0.5), Vector2::new(0.2, 0.9), Vector2::new(2.0, 2.0)]);
    /// assert_eq!(grid.get(0, 0), 2.0);
    /// assert_eq!(grid.get(1, 1), 1.0);
    /// ```
    pub fn count<I: IntoIterator<Item = Vector2<f64>>>(geometry: GridGeometry, positions: I) -> Self {
        let mut grid = Self::filled(geometry, 0.0);
        for position in positions {
            if let Some((ix, iy)) = geometry.cell_of(&position) {
                grid.values[ix * geometry.ny + iy] += 1.0;
            }
        }
        grid
    }

    /// Computes the mean of the sampled values per cell. Cells without samples are NaN
    pub fn mean<I: IntoIterator<Item = (Vector2<f64>, f64)>>(
        geometry: GridGeometry,
        samples: I,
    ) -> Self {
        let mut sums = vec![0.0; geometry.len()];
        let mut counts = vec![0usize; geometry.len()];
        for (position, value) in samples {
            if let Some((ix, iy)) = geometry.cell_of(&position) {
                sums[ix * geometry.ny + iy] += value;
                counts[ix * geometry.ny + iy] += 1;
            }
        }
        let values = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| {
                if count == 0 {
                    f64::NAN
                } else {
                    sum / count as f64
                }
            })
            .collect();
        Self { geometry, values }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn nx(&self) -> usize {
        self.geometry.nx
    }

    pub fn ny(&self) -> usize {
        self.geometry.ny
    }

    pub fn get(&self, ix: usize, iy: usize) -> f64 {
        self.values[ix * self.geometry.ny + iy]
    }

    pub fn set(&mut self, ix: usize, iy: usize, value: f64) {
        self.values[ix * self.geometry.ny + iy] = value;
    }

    /// Raw cell values, x-major (`ix * ny + iy`)
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns a copy of this grid where all NaN cells are zero
    pub fn nan_to_zero(&self) -> Self {
        Self {
            geometry: self.geometry,
            values: self
                .values
                .iter()
                .map(|v| if v.is_nan() { 0.0 } else { *v })
                .collect(),
        }
    }

    /// Number of cells with a non-zero, non-NaN value
    pub fn occupied_cells(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_nan() && **v != 0.0)
            .count()
    }
}
