//! Astrostack - registration and integration of astrophotography frames.
//!
//! This library turns a sequence of single exposures of the same sky region
//! into one deeper image:
//! - Star detection on a luminance plane
//! - Triangle-invariant matching with a randomized transform search
//! - Affine resampling into the reference geometry
//! - Exposure-fusion weighted integration over an out-of-core tensor
//!
//! The crate works on in-memory images only; decoding and encoding are the
//! caller's job.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use astrostack::{PipelineConfig, align_and_integrate};
//!
//! let others: Vec<astrostack::FrameSupplier> = paths
//!     .iter()
//!     .map(|path| Box::new(move || Ok(Some(load(path)?))) as _)
//!     .collect();
//! let result = align_and_integrate(&reference, others, &PipelineConfig::default())?;
//! println!("Integrated {} frames, dropped {:?}", result.integrated, result.dropped);
//! ```

mod astro_image;
pub(crate) mod math;
mod pipeline;
pub mod registration;
pub mod stacking;
pub mod star_detection;
pub mod synthetic;

#[cfg(feature = "bench")]
pub mod bench;

#[cfg(test)]
pub mod testing;

pub mod prelude;

// ============================================================================
// Core image types
// ============================================================================

pub use astro_image::{AstroImage, ImageDimensions};

// ============================================================================
// Star detection
// ============================================================================

pub use star_detection::{Star, StarDetectionConfig, StarDetector, detect_stars};

// ============================================================================
// Registration
// ============================================================================

pub use registration::{
    AffineTransform, AlignmentError, Estimate, EstimatorConfig, RegistrationConfig,
    TransformEstimator, TriangleFeature, TriangleFeatureIndex, WarpError, WarpMethod,
    WarpedImage, estimate_transform, warp_image, warp_image_to, warp_stars,
};

// ============================================================================
// Stacking
// ============================================================================

pub use stacking::{
    CoveredFrame, CoveredFrameSupplier, Error as StackingError, FrameIntegrator, FrameSupplier, IntegrationConfig, OutOfCoreTensor,
    ProgressCallback, QualityWeights, StackingProgress, StackingStage, StorageMode,
    TensorConfig, TensorShape, integrate,
};

// ============================================================================
// Pipeline
// ============================================================================

pub use pipeline::{
    PipelineConfig, PipelineResult, align_and_integrate, align_and_integrate_with_progress,
};
