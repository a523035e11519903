//! Configuration types for the registration module.

use serde::{Deserialize, Serialize};

use crate::registration::triangle::DEFAULT_HASH_BINS;
use crate::star_detection::StarDetectionConfig;

// =============================================================================
// Warp configuration
// =============================================================================

/// Pixel resampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum WarpMethod {
    /// Map every destination pixel back into the source and interpolate
    /// bilinearly. Covers the whole destination; needs an invertible
    /// transform.
    #[default]
    InverseBilinear,
    /// Push every source pixel to its rounded destination. Simple but lossy:
    /// rotations and shrinks leave zero-valued holes, expansions overwrite.
    ForwardSplat,
}

// =============================================================================
// Estimator configuration
// =============================================================================

/// Triangle-match search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Maximum per-angle difference in radians for two triangles to match.
    pub angle_tolerance: f64,
    /// A transformed star within this many pixels of a reference star is an inlier.
    pub position_tolerance: f64,
    /// Random triangle draws before giving up.
    pub max_iterations: usize,
    /// Bins per axis of the triangle lookup grid.
    pub hash_bins: usize,
    /// Random seed for reproducibility (None for OS entropy).
    pub seed: Option<u64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            angle_tolerance: 0.01,
            position_tolerance: 3.0,
            max_iterations: 1000,
            hash_bins: DEFAULT_HASH_BINS,
            seed: None,
        }
    }
}

impl EstimatorConfig {
    /// # Panics
    /// Panics if any parameter is out of range.
    pub fn validate(&self) {
        assert!(
            self.angle_tolerance.is_finite() && self.angle_tolerance > 0.0,
            "angle_tolerance must be positive, got {}",
            self.angle_tolerance
        );
        assert!(
            self.position_tolerance.is_finite() && self.position_tolerance > 0.0,
            "position_tolerance must be positive, got {}",
            self.position_tolerance
        );
        assert!(
            self.max_iterations > 0,
            "max_iterations must be positive, got {}",
            self.max_iterations
        );
        assert!(
            self.hash_bins > 0,
            "hash_bins must be positive, got {}",
            self.hash_bins
        );
    }
}

// =============================================================================
// Registration configuration
// =============================================================================

/// Everything needed to align one frame onto a reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub detection: StarDetectionConfig,
    pub estimator: EstimatorConfig,
    pub warp: WarpMethod,
}

impl RegistrationConfig {
    pub fn validate(&self) {
        self.detection.validate();
        self.estimator.validate();
    }
}
