//! Homogeneous 3x3 matrix for 2D transforms.

mod dmat3;

pub use dmat3::DMat3;
