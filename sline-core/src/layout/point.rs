use nalgebra::{Vector2, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single laser return, as acquired by airborne or UAV laser scanning. The attribute set mirrors the
/// LAS point record fields that shoreline detection relies on.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// Position in a projected coordinate system, `z` is the elevation
    pub position: Vector3<f64>,
    /// Return intensity
    pub intensity: u16,
    /// Scan angle in degrees, negative values are to the left of the flight direction
    pub scan_angle: f32,
    /// Return number, starting at 1 for the first return of a pulse
    pub return_number: u8,
    /// ASPRS classification code (2 = ground, 9 = water)
    pub classification: u8,
    /// RGB color with 16 bits per channel
    pub color: Vector3<u16>,
}

impl Point {
    /// Creates a point at the given position with all other attributes set to zero. Combine with the
    /// `with_*` methods to set up the remaining attributes
    /// ```
    /// # use sline_core::layout::Point;
    /// let point = Point::at(1.0, 2.0, 0.5).with_intensity(120).with_scan_angle(-14.0);
    /// assert_eq!(point.z(), 0.5);
    /// assert_eq!(point.intensity, 120);
    /// ```
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            intensity: 0,
            scan_angle: 0.0,
            return_number: 0,
            classification: 0,
            color: Vector3::new(0, 0, 0),
        }
    }

    pub fn with_intensity(mut self, intensity: u16) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_scan_angle(mut self, scan_angle: f32) -> Self {
        self.scan_angle = scan_angle;
        self
    }

    pub fn with_return_number(mut self, return_number: u8) -> Self {
        self.return_number = return_number;
        self
    }

    pub fn with_classification(mut self, classification: u8) -> Self {
        self.classification = classification;
        self
    }

    pub fn with_color(mut self, red: u16, green: u16, blue: u16) -> Self {
        self.color = Vector3::new(red, green, blue);
        self
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// The planimetric (x, y) part of the position
    pub fn xy(&self) -> Vector2<f64> {
        self.position.xy()
    }

    pub fn red(&self) -> u16 {
        self.color.x
    }

    pub fn green(&self) -> u16 {
        self.color.y
    }

    pub fn blue(&self) -> u16 {
        self.color.z
    }
}

/// ASPRS classification code for ground points
pub const CLASS_GROUND: u8 = 2;
/// ASPRS classification code for water points
pub const CLASS_WATER: u8 = 9;
