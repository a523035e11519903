//! Affine transform between frame coordinate systems.

use glam::DVec2;

use crate::math::DMat3;

/// Bottom-row entries further than this from `(0, 0, 1)` are projective.
const BOTTOM_ROW_EPSILON: f64 = 1e-12;

/// 3x3 affine transform over image-center-relative coordinates.
///
/// ```text
/// | a  b  c |
/// | d  e  f |
/// | 0  0  1 |
/// ```
///
/// A pixel `p` of an image with center `k = (width/2, height/2)` maps to
/// `T·(p − k) + k`. The bottom row is always `(0, 0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: DMat3,
}

/// Geometric reading of an affine transform, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDecomposition {
    pub translation: DVec2,
    /// Per-axis scale. `y` is negative for mirrored transforms.
    pub scale: DVec2,
    /// Rotation in radians.
    pub rotation: f64,
    /// Shear factor along x.
    pub shear: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = self.decompose();
        write!(
            f,
            "Affine(dx={:.2}, dy={:.2}, rot={:.3}°, scale=({:.4}, {:.4}), shear={:.4})",
            d.translation.x,
            d.translation.y,
            d.rotation.to_degrees(),
            d.scale.x,
            d.scale.y,
            d.shear
        )
    }
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: DMat3::identity(),
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::from_params([1.0, 0.0, dx, 0.0, 1.0, dy])
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::from_params([sx, 0.0, 0.0, 0.0, sy, 0.0])
    }

    /// Rotation by `angle` radians and uniform `scale`, then translation.
    pub fn similarity(translation: DVec2, angle: f64, scale: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::from_params([
            cos * scale,
            -sin * scale,
            translation.x,
            sin * scale,
            cos * scale,
            translation.y,
        ])
    }

    /// From the six free parameters `[a, b, c, d, e, f]`.
    pub fn from_params(params: [f64; 6]) -> Self {
        let [a, b, c, d, e, f] = params;
        Self {
            matrix: DMat3::from_rows([a, b, c], [d, e, f], [0.0, 0.0, 1.0]),
        }
    }

    /// Wrap a 3x3 matrix, or `None` if its bottom row is not `(0, 0, 1)`.
    pub fn from_matrix(matrix: DMat3) -> Option<Self> {
        let affine = matrix[6].abs() < BOTTOM_ROW_EPSILON
            && matrix[7].abs() < BOTTOM_ROW_EPSILON
            && (matrix[8] - 1.0).abs() < BOTTOM_ROW_EPSILON;
        affine.then(|| Self::from_params(Self { matrix }.params()))
    }

    #[inline]
    pub fn matrix(&self) -> &DMat3 {
        &self.matrix
    }

    /// `[a, b, c, d, e, f]`.
    #[inline]
    pub fn params(&self) -> [f64; 6] {
        let m = self.matrix.as_array();
        [m[0], m[1], m[2], m[3], m[4], m[5]]
    }

    /// The `(c, f)` column.
    #[inline]
    pub fn translation_components(&self) -> DVec2 {
        DVec2::new(self.matrix[2], self.matrix[5])
    }

    /// Apply to a point already expressed relative to the image center.
    #[inline]
    pub fn apply(&self, p: DVec2) -> DVec2 {
        self.matrix.transform_point(p)
    }

    /// Apply to a pixel coordinate of an image centered at `center`.
    #[inline]
    pub fn apply_centered(&self, p: DVec2, center: DVec2) -> DVec2 {
        self.apply(p - center) + center
    }

    /// Inverse transform, or `None` if the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let inv = self.matrix.inverse()?;
        // Inverting an affine matrix keeps the bottom row; rebuild it exactly.
        Some(Self::from_params(Self { matrix: inv }.params()))
    }

    /// `self ∘ other`: apply `other` first.
    pub fn compose(&self, other: &AffineTransform) -> Self {
        Self::from_params(
            Self {
                matrix: self.matrix.mul_mat(&other.matrix),
            }
            .params(),
        )
    }

    /// Split into translation, per-axis scale, rotation and shear so that the
    /// linear part equals `R(rotation) · [[sx, sx·shear], [0, sy]]`.
    pub fn decompose(&self) -> TransformDecomposition {
        let [a, b, _, d, e, _] = self.params();
        let translation = self.translation_components();
        let sx = a.hypot(d);
        if sx < f64::EPSILON {
            return TransformDecomposition {
                translation,
                scale: DVec2::new(0.0, e.hypot(b)),
                rotation: 0.0,
                shear: 0.0,
            };
        }
        let det = a * e - b * d;
        TransformDecomposition {
            translation,
            scale: DVec2::new(sx, det / sx),
            rotation: d.atan2(a),
            shear: (a * b + d * e) / (sx * sx),
        }
    }
}
