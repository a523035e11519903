//! Configuration for star detection.

use serde::{Deserialize, Serialize};

/// Star detection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarDetectionConfig {
    /// Minimum pixel value for a local-maximum candidate, in `[0, 1]` units.
    pub threshold: f32,
    /// Keep only the brightest N stars. Triangle matching is cubic in the
    /// star count, so registration should always set this.
    pub max_stars: Option<usize>,
}

impl Default for StarDetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            max_stars: Some(50),
        }
    }
}

impl StarDetectionConfig {
    /// Validate all parameters.
    ///
    /// # Panics
    /// Panics with a descriptive message if any parameter is out of range.
    pub fn validate(&self) {
        assert!(
            self.threshold.is_finite() && self.threshold >= 0.0,
            "threshold must be finite and non-negative, got {}",
            self.threshold
        );
        if let Some(max) = self.max_stars {
            assert!(max >= 3, "max_stars must be at least 3, got {}", max);
        }
    }
}
