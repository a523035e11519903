//! Error types for registration.

use thiserror::Error;

/// A frame that cannot be aligned. Callers drop the frame; it is not fatal
/// to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("Not enough stars to form a triangle: reference has {reference}, frame has {other}")]
    InsufficientStars { reference: usize, other: usize },

    #[error("No triangle correspondence produced a transform after {iterations} iterations")]
    NoMatch { iterations: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarpError {
    #[error("Transform is not invertible")]
    SingularTransform,
}
