use std::f64::consts::PI;

use glam::DVec2;

/// Areas below this are collinear for fitting purposes.
pub(crate) const MIN_TRIANGLE_AREA: f64 = 1e-6;

/// Winding of a triangle's vertices, smallest angle first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
}

impl Orientation {
    /// `+1` for counter-clockwise, `-1` for clockwise.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Orientation::CounterClockwise => 1,
            Orientation::Clockwise => -1,
        }
    }

    fn from_signed_area(signed_area: f64) -> Self {
        if signed_area >= 0.0 {
            Orientation::CounterClockwise
        } else {
            Orientation::Clockwise
        }
    }
}

/// Similarity-invariant signature of a star triple.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleFeature {
    /// Star indices, strictly increasing.
    pub indices: [usize; 3],
    /// Interior angles in radians, ascending.
    pub angles: [f64; 3],
    /// Sign of the signed area with vertices taken in `by_angle` order.
    pub orientation: Orientation,
    /// `indices` reordered so that `by_angle[n]` is the vertex holding
    /// `angles[n]`. Pairs vertices between matched triangles.
    pub by_angle: [usize; 3],
    /// Absolute area.
    pub area: f64,
}

impl TriangleFeature {
    /// Build the signature for stars `indices` at `positions`.
    ///
    /// Degenerate triples are kept; they carry near-zero `area` and are
    /// rejected when a transform is fitted.
    pub fn from_positions(indices: [usize; 3], positions: [DVec2; 3]) -> Self {
        let [p0, p1, p2] = positions;

        // Side opposite each vertex.
        let a = (p1 - p2).length();
        let b = (p0 - p2).length();
        let c = (p0 - p1).length();

        let vertex_angles = [
            angle_from_sides(a, b, c),
            angle_from_sides(b, a, c),
            angle_from_sides(c, a, b),
        ];

        let mut order = [0usize, 1, 2];
        order.sort_by(|&l, &r| vertex_angles[l].total_cmp(&vertex_angles[r]));

        // Winding in angle order, so it does not depend on how the star list
        // happens to be sorted.
        let [q0, q1, q2] = order.map(|v| positions[v]);
        let signed_area = 0.5
            * (q0.x * q1.y - q1.x * q0.y + q1.x * q2.y - q2.x * q1.y + q2.x * q0.y
                - q0.x * q2.y);

        Self {
            indices,
            angles: order.map(|v| vertex_angles[v]),
            orientation: Orientation::from_signed_area(signed_area),
            by_angle: order.map(|v| indices[v]),
            area: signed_area.abs(),
        }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.area < MIN_TRIANGLE_AREA
    }

    /// Same orientation and every angle within `tolerance` radians.
    #[inline]
    pub fn matches(&self, other: &TriangleFeature, tolerance: f64) -> bool {
        self.orientation == other.orientation
            && self
                .angles
                .iter()
                .zip(other.angles.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Hash bin of the two smallest angles. The smallest angle lies in
    /// `[0, π/3]` and the middle one in `[0, π/2]`; both axes are normalised
    /// to `[0, 1]` before binning.
    pub(crate) fn hash_key(&self, bins: usize) -> (usize, usize) {
        (
            bin_of(self.angles[0] / (PI / 3.0), bins),
            bin_of(self.angles[1] / (PI / 2.0), bins),
        )
    }
}

/// Angle opposite side `opposite`, via the law of cosines.
#[inline]
fn angle_from_sides(opposite: f64, s1: f64, s2: f64) -> f64 {
    let denom = 2.0 * s1 * s2;
    if denom <= 0.0 {
        // Coincident vertices.
        return 0.0;
    }
    ((s1 * s1 + s2 * s2 - opposite * opposite) / denom)
        .clamp(-1.0, 1.0)
        .acos()
}

#[inline]
fn bin_of(normalized: f64, bins: usize) -> usize {
    let scaled = (normalized * bins as f64).floor();
    if scaled.is_nan() || scaled < 0.0 {
        0
    } else {
        (scaled as usize).min(bins - 1)
    }
}
