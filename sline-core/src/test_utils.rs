use nalgebra::Vector3;
use rand::{prelude::Distribution, rngs::StdRng, Rng, SeedableRng};

use crate::{containers::PointCloud, layout::Point};

pub(crate) struct DefaultPointDistribution;

impl Distribution<Point> for DefaultPointDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        Point {
            position: Vector3::new(
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..100.0),
                rng.gen_range(-2.0..5.0),
            ),
            intensity: rng.gen(),
            scan_angle: rng.gen_range(-30.0..30.0),
            return_number: rng.gen_range(1..4),
            classification: rng.gen_range(0..10),
            color: Vector3::new(rng.gen(), rng.gen(), rng.gen()),
        }
    }
}

/// `count` points on the x axis at x = 0, 1, 2, ...
pub(crate) fn line_of_points(count: usize) -> PointCloud {
    (0..count)
        .map(|idx| Point::at(idx as f64, 0.0, 0.0))
        .collect()
}

pub(crate) fn random_cloud(count: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    DefaultPointDistribution
        .sample_iter(&mut rng)
        .take(count)
        .collect()
}
