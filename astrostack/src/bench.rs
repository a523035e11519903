//! Criterion benchmarks on synthetic star fields.
//!
//! Run with: `cargo bench -p astrostack --features bench --bench registration`

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::AstroImage;
use crate::registration::{
    AffineTransform, EstimatorConfig, TransformEstimator, TriangleFeatureIndex, WarpMethod,
    warp_image,
};
use crate::stacking::{FrameSupplier, IntegrationConfig, integrate};
use crate::star_detection::{Star, StarDetector};
use crate::synthetic::{random_stars, render_star_field, render_transformed_field};

const WIDTH: usize = 1024;
const HEIGHT: usize = 768;
const SIGMA: f64 = 1.5;
const BACKGROUND: f32 = 0.05;

fn field(count: usize) -> Vec<Star> {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    random_stars(&mut rng, count, WIDTH, HEIGHT, 40, 12.0)
}

fn drift() -> AffineTransform {
    AffineTransform::similarity(DVec2::new(7.0, -4.0), 0.01, 1.0)
}

/// Register all benchmarks with Criterion.
pub fn benchmarks(c: &mut Criterion) {
    let stars = field(50);
    let reference = AstroImage::from_gray(render_star_field(
        &stars, WIDTH, HEIGHT, SIGMA, BACKGROUND,
    ));
    let other = AstroImage::from_gray(render_transformed_field(
        &stars,
        &drift(),
        WIDTH,
        HEIGHT,
        SIGMA,
        BACKGROUND,
    ));

    let detector = StarDetector::default();
    c.bench_function("detect_stars", |b| {
        b.iter(|| black_box(detector.detect(black_box(&reference))))
    });

    let mut group = c.benchmark_group("triangle_index");
    for count in [20usize, 50] {
        let subset = &stars[..count];
        group.bench_with_input(BenchmarkId::from_parameter(count), &subset, |b, s| {
            b.iter(|| black_box(TriangleFeatureIndex::build(black_box(s))))
        });
    }
    group.finish();

    let reference_stars = detector.detect(&reference);
    let other_stars = detector.detect(&other);
    let config = EstimatorConfig {
        angle_tolerance: 0.02,
        seed: Some(1),
        ..Default::default()
    };
    let estimator = TransformEstimator::new(&reference_stars, WIDTH, HEIGHT, config);
    c.bench_function("estimate_transform", |b| {
        b.iter(|| {
            let mut rng = estimator.make_rng();
            black_box(estimator.estimate(black_box(&other_stars), &mut rng))
        })
    });

    let mut group = c.benchmark_group("warp_image");
    for method in [WarpMethod::InverseBilinear, WarpMethod::ForwardSplat] {
        group.bench_with_input(
            BenchmarkId::from_parameter(method),
            &method,
            |b, &method| b.iter(|| black_box(warp_image(black_box(&other), &drift(), method))),
        );
    }
    group.finish();

    let mut group = c.benchmark_group("integrate");
    group.sample_size(10);
    for frames in [4usize, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &frames| {
            b.iter(|| {
                let suppliers: Vec<FrameSupplier> = (0..frames)
                    .map(|_| {
                        let image = reference.clone();
                        Box::new(move || -> anyhow::Result<Option<AstroImage>> {
                            Ok(Some(image))
                        }) as FrameSupplier
                    })
                    .collect();
                black_box(integrate(suppliers, &IntegrationConfig::default()))
            })
        });
    }
    group.finish();
}
