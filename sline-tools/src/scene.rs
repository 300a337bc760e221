use rand::{distributions::Uniform, rngs::SmallRng, Rng, SeedableRng};
use sline_algorithms::{
    curve::CurveParams, edges::EdgeDetectorParams, pipeline::IntensityDetection,
    rasterize::DensityEdgeParams,
};
use sline_core::{
    containers::PointCloud,
    layout::{Point, CLASS_GROUND, CLASS_WATER},
    nalgebra::Vector2,
};

/// A rectangular survey of a beach with the sea towards increasing y. The shoreline is a sine wave around
/// `shore_y`. Land points are bright sand on a gentle slope, scanned at steep angles; water points are dark,
/// lie at sea level and are scanned close to nadir
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoastalScene {
    pub width: f64,
    pub depth: f64,
    /// Average distance between neighbouring points
    pub spacing: f64,
    pub shore_y: f64,
    pub amplitude: f64,
    pub wavelength: f64,
    /// Rise of the beach per unit of distance from the shoreline
    pub slope: f64,
    pub seed: u64,
}

impl Default for CoastalScene {
    fn default() -> Self {
        Self {
            width: 100.0,
            depth: 60.0,
            spacing: 0.5,
            shore_y: 30.0,
            amplitude: 4.0,
            wavelength: 50.0,
            slope: 0.02,
            seed: 42,
        }
    }
}

impl CoastalScene {
    /// y coordinate of the true shoreline at `x`
    pub fn shoreline_at(&self, x: f64) -> f64 {
        self.shore_y + self.amplitude * (x * std::f64::consts::TAU / self.wavelength).sin()
    }

    /// The true shoreline as a polyline with one vertex per `spacing` along x
    pub fn true_shoreline(&self) -> Vec<Vector2<f64>> {
        let steps = (self.width / self.spacing) as usize;
        (0..=steps)
            .map(|step| {
                let x = step as f64 * self.spacing;
                Vector2::new(x, self.shoreline_at(x))
            })
            .collect()
    }

    /// Intensity detection matched to the sampling of the scene. Cells are one point spacing wide, so a
    /// cell holds about one point and the jitter alone moves counts between 0 and 2. The edge thresholds
    /// sit above the gradients of that noise and below the gradient of the land/water step. The beach rises
    /// away from the water, so the lowest candidates are the ones on the shoreline and no elevation cut is
    /// applied
    pub fn intensity_detection(&self) -> IntensityDetection {
        IntensityDetection {
            density: DensityEdgeParams {
                cell_size: self.spacing,
                edges: EdgeDetectorParams {
                    low_threshold: 0.4,
                    high_threshold: 0.8,
                    ..Default::default()
                },
            },
            curve: CurveParams {
                low_elevation_percentile: 0.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Samples the scene on a jittered grid
    pub fn generate(&self) -> PointCloud {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let jitter = Uniform::new(-0.25 * self.spacing, 0.25 * self.spacing);
        let nx = (self.width / self.spacing) as usize;
        let ny = (self.depth / self.spacing) as usize;

        let mut points = Vec::with_capacity(nx * ny);
        for ix in 0..nx {
            for iy in 0..ny {
                let x = (ix as f64 + 0.5) * self.spacing + rng.sample(jitter);
                let y = (iy as f64 + 0.5) * self.spacing + rng.sample(jitter);
                let distance = self.shoreline_at(x) - y;
                let point = if distance > 0.0 {
                    Point::at(x, y, self.slope * distance + rng.gen_range(0.0..0.02))
                        .with_intensity(rng.gen_range(170..190))
                        .with_scan_angle(rng.gen_range(17.0..25.0))
                        .with_classification(CLASS_GROUND)
                        .with_color(
                            rng.gen_range(44000..48000),
                            rng.gen_range(41000..45000),
                            rng.gen_range(46000..50000),
                        )
                } else {
                    Point::at(x, y, rng.gen_range(-0.02..0.02))
                        .with_intensity(rng.gen_range(30..50))
                        .with_scan_angle(rng.gen_range(-8.0..8.0))
                        .with_classification(CLASS_WATER)
                        .with_color(
                            rng.gen_range(6000..10000),
                            rng.gen_range(14000..18000),
                            rng.gen_range(24000..28000),
                        )
                };
                points.push(point.with_return_number(1));
            }
        }
        PointCloud::new(points).with_crs("EPSG:25833")
    }
}
