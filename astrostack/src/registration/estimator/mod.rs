//! Randomized triangle-match search for the frame-to-reference transform.
//!
//! Each iteration draws one triangle of the frame at random, looks up every
//! reference triangle with matching angles and orientation, fits the exact
//! affine transform through each matched vertex triple and scores it against
//! all stars. Unlike classic RANSAC the hypotheses come from feature lookups,
//! not from uniform sampling of correspondences.

mod fit;
mod score;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::registration::config::EstimatorConfig;
use crate::registration::error::AlignmentError;
use crate::registration::transform::AffineTransform;
use crate::registration::triangle::{MIN_TRIANGLE_AREA, TriangleFeatureIndex};
use crate::star_detection::Star;

use fit::fit_affine;
use score::{Score, score_transform};

/// Squared error below which the search stops early.
const EXACT_FIT_ERROR: f64 = 1e-6;

/// Best transform found for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Maps frame coordinates onto reference coordinates (center-relative).
    pub transform: AffineTransform,
    /// Transformed frame stars landing within tolerance of a reference star.
    pub inliers: usize,
    /// Sum of squared nearest-reference distances over all frame stars.
    pub squared_error: f64,
    /// Iterations run before returning.
    pub iterations: usize,
}

/// Reference-side state of the search, built once and reused for every frame.
#[derive(Debug)]
pub struct TransformEstimator {
    config: EstimatorConfig,
    center: DVec2,
    star_count: usize,
    positions: Vec<DVec2>,
    index: TriangleFeatureIndex,
}

impl TransformEstimator {
    /// Index the reference stars of a `width` x `height` image.
    pub fn new(reference: &[Star], width: usize, height: usize, config: EstimatorConfig) -> Self {
        config.validate();
        let center = image_center(width, height);
        Self {
            center,
            star_count: reference.len(),
            positions: reference.iter().map(|s| s.pos() - center).collect(),
            index: TriangleFeatureIndex::build_with_bins(reference, config.hash_bins),
            config,
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Random generator for one run: seeded from the config when set.
    pub fn make_rng(&self) -> ChaCha8Rng {
        match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        }
    }

    /// Search for the transform mapping `other` onto the reference stars,
    /// for a frame the size of the reference.
    pub fn estimate<R: Rng>(
        &self,
        other: &[Star],
        rng: &mut R,
    ) -> Result<Estimate, AlignmentError> {
        self.estimate_about(other, self.center, rng)
    }

    /// Like [`estimate`](Self::estimate) for a `width` x `height` frame.
    /// Its stars are taken relative to its own center.
    pub fn estimate_frame<R: Rng>(
        &self,
        other: &[Star],
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> Result<Estimate, AlignmentError> {
        self.estimate_about(other, image_center(width, height), rng)
    }

    fn estimate_about<R: Rng>(
        &self,
        other: &[Star],
        other_center: DVec2,
        rng: &mut R,
    ) -> Result<Estimate, AlignmentError> {
        if self.star_count < 3 || other.len() < 3 {
            return Err(AlignmentError::InsufficientStars {
                reference: self.star_count,
                other: other.len(),
            });
        }

        let other_index = TriangleFeatureIndex::build_with_bins(other, self.config.hash_bins);
        let other_positions: Vec<DVec2> = other.iter().map(|s| s.pos() - other_center).collect();
        let other_features = other_index.features();

        let mut best: Option<(AffineTransform, Score)> = None;
        let mut matches: Vec<usize> = Vec::new();
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let query = &other_features[rng.random_range(0..other_features.len())];
            if query.area < MIN_TRIANGLE_AREA {
                tracing::trace!(indices = ?query.indices, "Skipping degenerate triangle");
                continue;
            }

            self.index
                .find_matches_into(query, self.config.angle_tolerance, &mut matches);

            for &ref_idx in &matches {
                let candidate = &self.index.features()[ref_idx];
                if candidate.area < MIN_TRIANGLE_AREA {
                    continue;
                }

                let from = query.by_angle.map(|i| other_positions[i]);
                let to = candidate.by_angle.map(|i| self.positions[i]);
                let Some(transform) = fit_affine(&from, &to) else {
                    tracing::trace!(
                        other = ?query.indices,
                        reference = ?candidate.indices,
                        "Singular fit, candidate skipped"
                    );
                    continue;
                };

                let score = score_transform(
                    &transform,
                    &other_positions,
                    &self.positions,
                    self.config.position_tolerance,
                );

                if best.is_none_or(|(_, b)| score.is_better_than(&b)) {
                    tracing::trace!(
                        iteration = iterations,
                        inliers = score.inliers,
                        squared_error = score.squared_error,
                        "New best candidate"
                    );
                    best = Some((transform, score));
                }
            }

            if best.is_some_and(|(_, b)| b.squared_error < EXACT_FIT_ERROR) {
                break;
            }
        }

        let Some((transform, score)) = best else {
            tracing::debug!(iterations, "No triangle correspondence found");
            return Err(AlignmentError::NoMatch { iterations });
        };

        tracing::debug!(
            iterations,
            inliers = score.inliers,
            stars = other.len(),
            squared_error = score.squared_error,
            %transform,
            "Transform estimated"
        );

        Ok(Estimate {
            transform,
            inliers: score.inliers,
            squared_error: score.squared_error,
            iterations,
        })
    }
}

/// Estimate the transform mapping `other` onto `reference` for images of
/// size `width` x `height`.
///
/// Fails with [`AlignmentError::InsufficientStars`] when either list has
/// fewer than three stars, and with [`AlignmentError::NoMatch`] when no
/// iteration produced a candidate. Runs at most `config.max_iterations`
/// iterations.
pub fn estimate_transform<R: Rng>(
    reference: &[Star],
    other: &[Star],
    width: usize,
    height: usize,
    config: &EstimatorConfig,
    rng: &mut R,
) -> Result<Estimate, AlignmentError> {
    TransformEstimator::new(reference, width, height, config.clone()).estimate(other, rng)
}

/// Center used for center-relative coordinates.
#[inline]
pub fn image_center(width: usize, height: usize) -> DVec2 {
    DVec2::new(width as f64 / 2.0, height as f64 / 2.0)
}
