use criterion::{criterion_group, criterion_main, Criterion};
use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};
use sline_algorithms::{
    curve::{build_curve, CurveParams},
    edges::{detect_edges, EdgeDetectorParams},
    rasterize::BoundaryCandidate,
};
use sline_core::{
    math::AABB,
    nalgebra::{Point3, Vector2},
    raster::{DensityGrid, GridGeometry},
};

const NUM_CANDIDATES_SMALL: usize = 500;
const NUM_CANDIDATES_MEDIUM: usize = 2000;
const NUM_CANDIDATES_BIG: usize = 5000;

/// Candidates scattered in a 2 unit wide band along a gently curved shoreline
fn random_band<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<BoundaryCandidate> {
    let length = count as f64 / 4.0;
    (0..count)
        .map(|_| {
            let x = rng.sample(Uniform::new(0.0, length));
            let y = (x / 20.0).sin() * 5.0 + rng.sample(Uniform::new(-1.0, 1.0));
            BoundaryCandidate::new(Vector2::new(x, y), rng.sample(Uniform::new(0.0, 2.0)))
        })
        .collect()
}

/// Density raster with a diagonal step
fn step_raster(size: usize) -> DensityGrid {
    let bounds = AABB::from_min_max(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(size as f64, size as f64, 0.0),
    );
    let geometry = GridGeometry::covering(&bounds, 1.0).expect("raster geometry");
    let mut grid = DensityGrid::filled(geometry, 0.0);
    for ix in 0..size {
        for iy in ix..size {
            grid.set(ix, iy, 4.0);
        }
    }
    grid
}

fn bench(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(4711);
    for (testname, count) in [
        ("small", NUM_CANDIDATES_SMALL),
        ("medium", NUM_CANDIDATES_MEDIUM),
        ("big", NUM_CANDIDATES_BIG),
    ] {
        let candidates = random_band(&mut rng, count);
        c.bench_function(&format!("build_curve_{}", testname), |b| {
            b.iter(|| build_curve(&candidates, &CurveParams::default()))
        });
    }

    for size in [64, 256] {
        let grid = step_raster(size);
        c.bench_function(&format!("detect_edges_{}x{}", size, size), |b| {
            b.iter(|| detect_edges(&grid, &EdgeDetectorParams::default()))
        });
    }
}

criterion_group! {
    name = curve;
    config = Criterion::default().sample_size(20);
    targets = bench
}
criterion_main!(curve);
