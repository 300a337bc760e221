use rand::{rngs::StdRng, Rng, SeedableRng};
use sline_core::{
    containers::PointCloud,
    layout::{Point, CLASS_GROUND, CLASS_WATER},
};

/// Elevation of the land/water boundary in [intensity_beach], along y
pub const INTENSITY_BOUNDARY_Y: f64 = 30.0;

/// A 60 x 50 survey with 4 points per square unit. Points at `y >= 30` are bright, steeply scanned returns
/// (intensity 200, scan angle 20), the rest are dark and near nadir (intensity 50, scan angle 5). Two dark
/// sentinels pin the extent to `[0, 60] x [0, 50]`
pub fn intensity_beach() -> PointCloud {
    let mut points = vec![
        Point::at(0.0, 0.0, 0.0).with_intensity(50),
        Point::at(60.0, 50.0, 0.0).with_intensity(50),
    ];
    for ix in 0..120 {
        for iy in 0..100 {
            let (x, y) = (0.25 + ix as f64 * 0.5, 0.25 + iy as f64 * 0.5);
            let point = Point::at(x, y, 0.1 * (ix % 5) as f64);
            points.push(if y >= INTENSITY_BOUNDARY_Y {
                point.with_intensity(200).with_scan_angle(20.0)
            } else {
                point.with_intensity(50).with_scan_angle(5.0)
            });
        }
    }
    PointCloud::new(points).with_crs("EPSG:25833")
}

/// Ground below the line `y = 8 + x / 4`, water above it, for `x` in `0..40` and `y` in `0..20`
pub fn classified_coast() -> PointCloud {
    let mut points = vec![];
    for ix in 0..40 {
        for iy in 0..40 {
            let (x, y) = (ix as f64, iy as f64 * 0.5);
            let class = if y < coast_line(x) {
                CLASS_GROUND
            } else {
                CLASS_WATER
            };
            points.push(Point::at(x, y, 0.0).with_classification(class));
        }
    }
    PointCloud::new(points)
}

pub fn coast_line(x: f64) -> f64 {
    8.0 + x / 4.0
}

/// Point spacing of [jittered_coast]
pub const JITTERED_SPACING: f64 = 0.5;

/// The sine shaped land/water boundary of [jittered_coast]
pub fn jittered_shoreline(x: f64) -> f64 {
    15.0 + 3.0 * (x * std::f64::consts::TAU / 30.0).sin()
}

/// A 60 x 30 grid with a spacing of 0.5 where every point is moved by up to a quarter of the spacing along
/// both axes. Land lies below [jittered_shoreline] and rises away from it, its points are bright and steeply
/// scanned. Water points are dark, near nadir and at sea level
pub fn jittered_coast(seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = 0.25 * JITTERED_SPACING;
    let mut points = vec![];
    for ix in 0..120 {
        for iy in 0..60 {
            let x = (ix as f64 + 0.5) * JITTERED_SPACING + rng.gen_range(-jitter..jitter);
            let y = (iy as f64 + 0.5) * JITTERED_SPACING + rng.gen_range(-jitter..jitter);
            let distance = jittered_shoreline(x) - y;
            points.push(if distance > 0.0 {
                Point::at(x, y, 0.02 * distance + rng.gen_range(0.0..0.02))
                    .with_intensity(rng.gen_range(170..190))
                    .with_scan_angle(rng.gen_range(17.0..25.0))
                    .with_classification(CLASS_GROUND)
            } else {
                Point::at(x, y, rng.gen_range(-0.02..0.02))
                    .with_intensity(rng.gen_range(30..50))
                    .with_scan_angle(rng.gen_range(-8.0..8.0))
                    .with_classification(CLASS_WATER)
            });
        }
    }
    PointCloud::new(points)
}
