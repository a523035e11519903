//! Point-source detection on a single image plane.
//!
//! Registration only needs repeatable positions of the brightest sources,
//! not photometry.

mod config;
mod detector;
mod star;

#[cfg(test)]
mod tests;

pub use config::StarDetectionConfig;
pub use detector::detect_stars;
pub use star::{Star, sort_canonical, top_k};

use common::Buffer2;

use crate::AstroImage;

/// Star detector bound to a validated configuration.
#[derive(Debug, Clone)]
pub struct StarDetector {
    config: StarDetectionConfig,
}

impl Default for StarDetector {
    fn default() -> Self {
        Self::from_config(StarDetectionConfig::default())
    }
}

impl StarDetector {
    pub fn from_config(config: StarDetectionConfig) -> Self {
        config.validate();
        Self { config }
    }

    pub fn config(&self) -> &StarDetectionConfig {
        &self.config
    }

    /// Detect on an image's luminance, capped at `max_stars`.
    pub fn detect(&self, image: &AstroImage) -> Vec<Star> {
        self.detect_plane(&image.luminance())
    }

    /// Detect on a prepared plane, capped at `max_stars`.
    pub fn detect_plane(&self, plane: &Buffer2<f32>) -> Vec<Star> {
        let mut stars = detect_stars(plane, self.config.threshold);
        let found = stars.len();
        if let Some(max) = self.config.max_stars {
            stars.truncate(max);
        }
        tracing::debug!(
            found,
            kept = stars.len(),
            threshold = self.config.threshold,
            "Star detection complete"
        );
        stars
    }
}
