//! Star-based frame registration.
//!
//! # Workflow
//!
//! 1. Detect stars in the reference and in each frame ([`crate::star_detection`])
//! 2. Index triangle signatures of both star lists ([`TriangleFeatureIndex`])
//! 3. Search for the affine transform mapping the frame onto the reference
//!    ([`TransformEstimator`])
//! 4. Resample the frame into the reference geometry ([`warp_image_to`])
//!
//! Transforms act on image-center-relative coordinates: a pixel `p` of a
//! frame with center `c_f = (width/2, height/2)` maps to `T·(p − c_f) + c_r`,
//! where `c_r` is the reference center. Same-sized images share one center.

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod estimator;
pub(crate) mod transform;
pub(crate) mod triangle;
pub(crate) mod warp;

pub use config::{EstimatorConfig, RegistrationConfig, WarpMethod};
pub use error::{AlignmentError, WarpError};
pub use estimator::{Estimate, TransformEstimator, estimate_transform, image_center};
pub use transform::{AffineTransform, TransformDecomposition};
pub use triangle::{
    DEFAULT_HASH_BINS, Orientation, TriangleFeature, TriangleFeatureIndex, triangle_features,
};
pub use warp::{WarpedImage, warp_image, warp_image_to, warp_stars};
