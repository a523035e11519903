//! End-to-end registration and integration.
//!
//! The reference frame is detected once. Every other frame is loaded lazily,
//! aligned onto the reference and warped into its geometry inside its
//! supplier, so only the frames in flight are decoded at any time. Frames
//! may differ in size from the reference. Frames that cannot be aligned are
//! logged and excluded; they never abort the run. Pixels a warped frame does
//! not cover carry no weight in the stack.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::AstroImage;
use crate::registration::{
    AffineTransform, RegistrationConfig, TransformEstimator, WarpMethod, warp_image_to,
};
use crate::stacking::{
    CoveredFrame, CoveredFrameSupplier, Error, FrameIntegrator, FrameSupplier,
    IntegrationConfig, ProgressCallback,
};
use crate::star_detection::StarDetector;

/// Registration plus integration settings for one run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub registration: RegistrationConfig,
    pub integration: IntegrationConfig,
}

impl PipelineConfig {
    pub fn validate(&self) {
        self.registration.validate();
        self.integration.validate();
    }
}

/// Outcome of [`align_and_integrate`].
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The integrated image, in reference geometry.
    pub image: AstroImage,
    /// Frames that contributed, the reference included.
    pub integrated: usize,
    /// Indices into `others` of frames that were excluded, ascending.
    pub dropped: Vec<usize>,
}

/// Align every frame of `others` onto `reference` and integrate them
/// together with the reference.
///
/// A supplier returning `Ok(None)` and a frame whose alignment or warp fails
/// are both reported in [`PipelineResult::dropped`]. Supplier errors and
/// integration errors abort the run; frame indices in those errors count the
/// reference as frame 0.
pub fn align_and_integrate(
    reference: &AstroImage,
    others: Vec<FrameSupplier<'_>>,
    config: &PipelineConfig,
) -> Result<PipelineResult, Error> {
    align_and_integrate_with_progress(reference, others, config, None)
}

/// [`align_and_integrate`] with integration progress reporting.
pub fn align_and_integrate_with_progress(
    reference: &AstroImage,
    others: Vec<FrameSupplier<'_>>,
    config: &PipelineConfig,
    progress: ProgressCallback,
) -> Result<PipelineResult, Error> {
    config.validate();

    let registration = &config.registration;
    let detector = StarDetector::from_config(registration.detection);
    let reference_stars = detector.detect(reference);
    if reference_stars.len() < 3 {
        tracing::warn!(
            stars = reference_stars.len(),
            "Reference has too few stars, every other frame will be dropped"
        );
    }

    let estimator = TransformEstimator::new(
        &reference_stars,
        reference.width(),
        reference.height(),
        registration.estimator.clone(),
    );
    let base_seed = registration.estimator.seed.unwrap_or_else(rand::random);

    let frame_count = others.len() + 1;
    tracing::info!(
        frames = frame_count,
        reference_stars = reference_stars.len(),
        base_seed,
        warp = %registration.warp,
        "Starting alignment and integration"
    );

    let dropped = Arc::new(Mutex::new(Vec::new()));
    let mut suppliers: Vec<CoveredFrameSupplier<'_>> = Vec::with_capacity(frame_count);
    suppliers.push(Box::new(|| -> anyhow::Result<Option<CoveredFrame>> {
        Ok(Some(CoveredFrame::from(reference.clone())))
    }));

    for (index, load) in others.into_iter().enumerate() {
        let detector = &detector;
        let estimator = &estimator;
        let dropped = Arc::clone(&dropped);
        let warp = registration.warp;
        let target = (reference.width(), reference.height());
        suppliers.push(Box::new(move || -> anyhow::Result<Option<CoveredFrame>> {
            let Some(image) = load()? else {
                tracing::debug!(index, "Frame supplier produced no image");
                dropped.lock().push(index);
                return Ok(None);
            };

            let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(index as u64));
            let aligned = align_frame(detector, estimator, &image, target, warp, &mut rng, index);
            if aligned.is_none() {
                dropped.lock().push(index);
            }
            Ok(aligned)
        }));
    }

    let image = FrameIntegrator::new(config.integration.clone())
        .with_progress(progress)
        .integrate_covered(suppliers)?;

    let mut dropped = std::mem::take(&mut *dropped.lock());
    dropped.sort_unstable();
    let integrated = frame_count - dropped.len();

    tracing::info!(integrated, dropped = dropped.len(), "Pipeline complete");

    Ok(PipelineResult {
        image,
        integrated,
        dropped,
    })
}

/// Detect, estimate and warp one frame onto the `target` grid. `None` when
/// it cannot be aligned.
fn align_frame(
    detector: &StarDetector,
    estimator: &TransformEstimator,
    image: &AstroImage,
    target: (usize, usize),
    warp: WarpMethod,
    rng: &mut ChaCha8Rng,
    index: usize,
) -> Option<CoveredFrame> {
    let stars = detector.detect(image);
    let estimate = match estimator.estimate_frame(&stars, image.width(), image.height(), rng) {
        Ok(estimate) => estimate,
        Err(e) => {
            tracing::warn!(index, error = %e, "Frame alignment failed, dropping frame");
            return None;
        }
    };

    log_alignment(index, &estimate.transform, estimate.inliers, stars.len());

    match warp_image_to(image, &estimate.transform, warp, target.0, target.1) {
        Ok(warped) => Some(CoveredFrame::new(warped.image, Some(warped.coverage))),
        Err(e) => {
            tracing::warn!(index, error = %e, "Frame warp failed, dropping frame");
            None
        }
    }
}

fn log_alignment(index: usize, transform: &AffineTransform, inliers: usize, stars: usize) {
    let d = transform.decompose();
    tracing::debug!(
        index,
        inliers,
        stars,
        dx = d.translation.x,
        dy = d.translation.y,
        rotation_deg = d.rotation.to_degrees(),
        scale_x = d.scale.x,
        scale_y = d.scale.y,
        shear = d.shear,
        "Frame aligned"
    );
}
