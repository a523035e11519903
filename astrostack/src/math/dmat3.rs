//! Row-major 3x3 matrix of f64 values.

use glam::DVec2;
use std::ops::{Index, Mul};

/// Row-major 3x3 matrix of f64 values.
///
/// For 2D homogeneous transforms the layout is:
/// ```text
/// | a  b  c |   | m[0] m[1] m[2] |
/// | d  e  f | = | m[3] m[4] m[5] |
/// | 0  0  1 |   | m[6] m[7] m[8] |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DMat3 {
    data: [f64; 9],
}

impl DMat3 {
    #[inline]
    pub const fn from_array(data: [f64; 9]) -> Self {
        Self { data }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self {
            data: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    #[inline]
    pub const fn from_rows(row0: [f64; 3], row1: [f64; 3], row2: [f64; 3]) -> Self {
        Self {
            data: [
                row0[0], row0[1], row0[2], row1[0], row1[1], row1[2], row2[0], row2[1], row2[2],
            ],
        }
    }

    #[inline]
    pub const fn as_array(&self) -> &[f64; 9] {
        &self.data
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * 3 + col]
    }

    /// Matrix multiplication: `self * rhs`.
    pub fn mul_mat(&self, rhs: &DMat3) -> DMat3 {
        let mut data = [0.0; 9];
        for r in 0..3 {
            for c in 0..3 {
                data[r * 3 + c] = (0..3).map(|k| self.get(r, k) * rhs.get(k, c)).sum();
            }
        }
        DMat3 { data }
    }

    pub fn determinant(&self) -> f64 {
        let d = &self.data;
        d[0] * (d[4] * d[8] - d[5] * d[7]) - d[1] * (d[3] * d[8] - d[5] * d[6])
            + d[2] * (d[3] * d[7] - d[4] * d[6])
    }

    /// Matrix inverse, or `None` if singular.
    ///
    /// The 1e-12 determinant threshold suits pixel-scale coefficients.
    pub fn inverse(&self) -> Option<DMat3> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let d = &self.data;
        Some(DMat3 {
            data: [
                (d[4] * d[8] - d[5] * d[7]) * inv_det,
                (d[2] * d[7] - d[1] * d[8]) * inv_det,
                (d[1] * d[5] - d[2] * d[4]) * inv_det,
                (d[5] * d[6] - d[3] * d[8]) * inv_det,
                (d[0] * d[8] - d[2] * d[6]) * inv_det,
                (d[2] * d[3] - d[0] * d[5]) * inv_det,
                (d[3] * d[7] - d[4] * d[6]) * inv_det,
                (d[1] * d[6] - d[0] * d[7]) * inv_det,
                (d[0] * d[4] - d[1] * d[3]) * inv_det,
            ],
        })
    }

    /// Apply the upper two rows to a point. The bottom row is ignored, so this
    /// is only meaningful for affine matrices.
    #[inline]
    pub fn transform_point(&self, p: DVec2) -> DVec2 {
        let d = &self.data;
        DVec2::new(
            d[0] * p.x + d[1] * p.y + d[2],
            d[3] * p.x + d[4] * p.y + d[5],
        )
    }
}

impl Default for DMat3 {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 9]> for DMat3 {
    #[inline]
    fn from(data: [f64; 9]) -> Self {
        Self { data }
    }
}

impl Index<usize> for DMat3 {
    type Output = f64;
    #[inline]
    fn index(&self, idx: usize) -> &f64 {
        &self.data[idx]
    }
}

impl Mul for DMat3 {
    type Output = DMat3;
    #[inline]
    fn mul(self, rhs: DMat3) -> DMat3 {
        self.mul_mat(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    fn mat_approx_eq(a: &DMat3, b: &DMat3) -> bool {
        a.as_array()
            .iter()
            .zip(b.as_array().iter())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    #[test]
    fn test_from_rows_is_row_major() {
        let m = DMat3::from_rows([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]);
        assert_eq!(*m.as_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(m.get(1, 2), 6.0);
    }

    #[test]
    fn test_determinant_singular() {
        let m = DMat3::from_rows([1.0, 2.0, 3.0], [1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
        assert!(m.determinant().abs() < EPS);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_inverse_roundtrip() {
        let m = DMat3::from_rows([1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]);
        let inv = m.inverse().unwrap();
        assert!(mat_approx_eq(&(m * inv), &DMat3::identity()));
    }

    #[test]
    fn test_mul_mat_composes_translations() {
        let a = DMat3::from_rows([1.0, 0.0, 3.0], [0.0, 1.0, -2.0], [0.0, 0.0, 1.0]);
        let b = DMat3::from_rows([1.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]);
        let c = a * b;
        assert!((c[2] - 4.0).abs() < EPS);
        assert!((c[5] + 1.0).abs() < EPS);
    }

    #[test]
    fn test_transform_point_affine() {
        let m = DMat3::from_rows([2.0, 0.0, 1.0], [0.0, 3.0, -1.0], [0.0, 0.0, 1.0]);
        let p = m.transform_point(DVec2::new(1.0, 1.0));
        assert!((p.x - 3.0).abs() < EPS);
        assert!((p.y - 2.0).abs() < EPS);
    }
}
