//! Exact affine fit through three point pairs.

use glam::DVec2;
use nalgebra::{DMatrix, DVector};

use crate::registration::transform::AffineTransform;

/// Twice the source triangle's area below which the system counts as singular.
const MIN_DETERMINANT: f64 = 1e-9;

/// Solve for the affine transform mapping each `from[n]` onto `to[n]`.
///
/// Points are center-relative. The 6x6 system has two rows per pair:
/// ```text
/// | x  y  1  0  0  0 |   | a |   | x' |
/// | 0  0  0  x  y  1 | · | b | = | y' |
///                        | … |
/// ```
/// Returns `None` when the system is singular (collinear points).
pub(crate) fn fit_affine(from: &[DVec2; 3], to: &[DVec2; 3]) -> Option<AffineTransform> {
    // Up to row order the system is two copies of [x y 1]; its determinant is this one squared.
    if (from[1] - from[0]).perp_dot(from[2] - from[0]).abs() < MIN_DETERMINANT {
        return None;
    }

    let mut a_data = [0.0f64; 36];
    let mut rhs = [0.0f64; 6];

    for (n, (p, q)) in from.iter().zip(to.iter()).enumerate() {
        let rx = 2 * n;
        let ry = rx + 1;
        a_data[rx * 6..rx * 6 + 3].copy_from_slice(&[p.x, p.y, 1.0]);
        a_data[ry * 6 + 3..ry * 6 + 6].copy_from_slice(&[p.x, p.y, 1.0]);
        rhs[rx] = q.x;
        rhs[ry] = q.y;
    }

    let system = DMatrix::from_row_slice(6, 6, &a_data);
    let solution = system.lu().solve(&DVector::from_row_slice(&rhs))?;
    if solution.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut params = [0.0f64; 6];
    params.copy_from_slice(solution.as_slice());
    Some(AffineTransform::from_params(params))
}
