//! Triangle signatures for star pattern matching.
//!
//! Every triple of stars yields a [`TriangleFeature`]: its sorted interior
//! angles, which do not change under translation, rotation or uniform
//! scaling, and its orientation, which flips under mirroring. Reference
//! features are bucketed by their two smallest angles so a lookup only
//! inspects nearby bins before the exact per-angle check.
//!
//! Feature count is cubic in the star count; callers cap star lists first.

mod geometry;
mod hash_table;
#[cfg(test)]
mod tests;

pub use geometry::{Orientation, TriangleFeature};

pub(crate) use geometry::MIN_TRIANGLE_AREA;

use hash_table::TriangleHashTable;

use crate::star_detection::Star;

/// Bins per angle axis of the lookup grid.
pub const DEFAULT_HASH_BINS: usize = 100;

/// All triangle features of a star list, indexed for angle lookups.
#[derive(Debug)]
pub struct TriangleFeatureIndex {
    features: Vec<TriangleFeature>,
    table: TriangleHashTable,
}

impl TriangleFeatureIndex {
    pub fn build(stars: &[Star]) -> Self {
        Self::build_with_bins(stars, DEFAULT_HASH_BINS)
    }

    pub fn build_with_bins(stars: &[Star], bins: usize) -> Self {
        let features = triangle_features(stars);
        let table = TriangleHashTable::build(&features, bins);
        Self { features, table }
    }

    pub fn features(&self) -> &[TriangleFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Indices of features whose orientation equals `query`'s and whose
    /// angles each differ by at most `tolerance` radians.
    pub fn find_matches(&self, query: &TriangleFeature, tolerance: f64) -> Vec<usize> {
        let mut out = Vec::new();
        self.find_matches_into(query, tolerance, &mut out);
        out
    }

    /// Like [`find_matches`](Self::find_matches) into a reusable buffer.
    pub fn find_matches_into(&self, query: &TriangleFeature, tolerance: f64, out: &mut Vec<usize>) {
        self.table.find_candidates_into(query, tolerance, out);
        out.retain(|&idx| self.features[idx].matches(query, tolerance));
    }
}

/// One feature per `i < j < k`, in lexicographic index order.
pub fn triangle_features(stars: &[Star]) -> Vec<TriangleFeature> {
    let n = stars.len();
    if n < 3 {
        return Vec::new();
    }
    let mut features = Vec::with_capacity(n * (n - 1) * (n - 2) / 6);
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                features.push(TriangleFeature::from_positions(
                    [i, j, k],
                    [stars[i].pos(), stars[j].pos(), stars[k].pos()],
                ));
            }
        }
    }
    features
}
