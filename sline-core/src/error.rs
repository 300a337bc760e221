//! Error types for shoreline detection

use thiserror::Error;

/// Failures of the classifier, rasterizer and curve builder stages. Degenerate but valid outcomes,
/// such as an empty selection mask, are not errors and are reported through the regular return values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShorelineError {
    /// A discrete class that the detection needs (ground or water) has no points
    #[error("No points with classification {class} in the point cloud")]
    EmptyClass { class: u8 },

    /// The cell size is larger than the extent of the point cloud along at least one axis
    #[error("Cell size {cell_size} is too coarse for an extent of {extent_x} x {extent_y}")]
    GridTooCoarse {
        cell_size: f64,
        extent_x: f64,
        extent_y: f64,
    },

    /// Not enough boundary candidates survived filtering to form a line
    #[error("Insufficient boundary: {nodes} usable boundary node(s), at least 2 are required")]
    InsufficientBoundary { nodes: usize },

    /// The scan angle histogram has no valley after its dominant peak. Advisory only
    #[error("No valley found in the scan angle histogram")]
    NoValleyFound,

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ShorelineError {
    /// Shorthand for an `InvalidParameter` error on a value that has to be strictly positive
    pub fn not_positive(name: &'static str, value: f64) -> Self {
        ShorelineError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must be a finite value greater than zero".into(),
        }
    }
}

/// Result type alias for shoreline detection
pub type Result<T> = std::result::Result<T, ShorelineError>;

/// Returns `value` if it is finite and strictly positive, otherwise an `InvalidParameter` error
pub fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ShorelineError::not_positive(name, value))
    }
}
