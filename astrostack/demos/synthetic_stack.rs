//! Align and integrate a synthetic drifting star field.
//!
//! Run with: `cargo run -p astrostack --example synthetic_stack [config.json]`
//!
//! The optional argument is a JSON `PipelineConfig`; missing fields take
//! their defaults.

use std::path::PathBuf;

use anyhow::Context;
use astrostack::synthetic::{colour_frame, random_stars, render_star_field, render_transformed_field};
use astrostack::{
    AffineTransform, AstroImage, FrameSupplier, PipelineConfig, StackingProgress,
    align_and_integrate_with_progress,
};
use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const WIDTH: usize = 640;
const HEIGHT: usize = 480;
const FRAMES: usize = 8;
const SIGMA: f64 = 1.6;
const BACKGROUND: f32 = 0.08;
const GAINS: [f32; 3] = [1.0, 0.85, 0.7];

fn main() -> anyhow::Result<()> {
    let log_dir = std::env::temp_dir().join("astrostack_logs");
    common::log_setup::setup_logging("info", &log_dir, "synthetic_stack");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<PipelineConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let stars = random_stars(&mut rng, 60, WIDTH, HEIGHT, 40, 15.0);
    let reference = colour_frame(
        &render_star_field(&stars, WIDTH, HEIGHT, SIGMA, BACKGROUND),
        GAINS,
    );

    // Tracking drift: a few pixels of shift and a slow field rotation.
    let drifts: Vec<AffineTransform> = (1..FRAMES)
        .map(|i| {
            let t = i as f64;
            let jitter = DVec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            AffineTransform::similarity(DVec2::new(2.5 * t, -1.5 * t) + jitter, 0.002 * t, 1.0)
        })
        .collect();

    let others: Vec<FrameSupplier> = drifts
        .iter()
        .enumerate()
        .map(|(i, drift)| {
            let stars = &stars;
            Box::new(move || -> anyhow::Result<Option<AstroImage>> {
                tracing::info!(frame = i + 1, "Rendering frame");
                let plane = render_transformed_field(stars, drift, WIDTH, HEIGHT, SIGMA, BACKGROUND);
                Ok(Some(colour_frame(&plane, GAINS)))
            }) as FrameSupplier
        })
        .collect();

    let progress = Some(std::sync::Arc::new(|p: StackingProgress| {
        tracing::debug!(stage = %p.stage, completed = p.completed, total = p.total, "Progress");
    }) as std::sync::Arc<dyn Fn(StackingProgress) + Send + Sync>);

    let result = align_and_integrate_with_progress(&reference, others, &config, progress)?;

    let peak = result
        .image
        .channel(0)
        .iter()
        .copied()
        .fold(f32::MIN, f32::max);
    tracing::info!(
        integrated = result.integrated,
        dropped = ?result.dropped,
        peak,
        logs = %log_dir.display(),
        "Synthetic stack finished"
    );

    Ok(())
}
