//! Candidate scoring against the reference star positions.

use glam::DVec2;

use crate::registration::transform::AffineTransform;

/// Quality of one candidate transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Score {
    pub inliers: usize,
    pub squared_error: f64,
}

impl Score {
    /// More inliers wins; equal inliers fall back to lower squared error.
    #[inline]
    pub fn is_better_than(&self, other: &Score) -> bool {
        self.inliers > other.inliers
            || (self.inliers == other.inliers && self.squared_error < other.squared_error)
    }
}

/// Transform every `other` position and compare with `reference`.
///
/// A transformed star is an inlier when some reference star lies within
/// `tolerance`. This is not a one-to-one assignment: a single reference star
/// may account for several transformed stars. The squared error sums, over
/// all transformed stars, the squared distance to the nearest reference star.
pub(crate) fn score_transform(
    transform: &AffineTransform,
    other: &[DVec2],
    reference: &[DVec2],
    tolerance: f64,
) -> Score {
    let tolerance_sq = tolerance * tolerance;
    let mut inliers = 0;
    let mut squared_error = 0.0;

    for &p in other {
        let mapped = transform.apply(p);
        let nearest = reference
            .iter()
            .map(|r| r.distance_squared(mapped))
            .fold(f64::INFINITY, f64::min);
        if nearest <= tolerance_sq {
            inliers += 1;
        }
        squared_error += nearest;
    }

    Score {
        inliers,
        squared_error,
    }
}
