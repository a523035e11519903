//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use astrostack::prelude::*;
//! ```

// Core image types
pub use crate::{AstroImage, ImageDimensions};

// Star detection
pub use crate::{Star, StarDetectionConfig, StarDetector};

// Registration
pub use crate::{AffineTransform, AlignmentError, EstimatorConfig, RegistrationConfig, WarpMethod};

// Stacking
pub use crate::{
    FrameSupplier, IntegrationConfig, ProgressCallback, QualityWeights, StackingError,
    StackingProgress, StackingStage, StorageMode, TensorConfig,
};

// Pipeline
pub use crate::{PipelineConfig, PipelineResult, align_and_integrate};
