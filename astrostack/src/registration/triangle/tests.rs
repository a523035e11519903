//! Tests for triangle signatures and the feature index.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec2;

use super::geometry::{Orientation, TriangleFeature};
use super::hash_table::TriangleHashTable;
use super::{TriangleFeatureIndex, triangle_features};
use crate::star_detection::Star;

fn feature(points: [(f64, f64); 3]) -> TriangleFeature {
    TriangleFeature::from_positions(
        [0, 1, 2],
        points.map(|(x, y)| DVec2::new(x, y)),
    )
}

fn stars(points: &[(i32, i32)]) -> Vec<Star> {
    points
        .iter()
        .map(|&(x, y)| Star::new(x, y, 1.0))
        .collect()
}

// ============================================================================
// TriangleFeature::from_positions
// ============================================================================

#[test]
fn test_feature_3_4_5() {
    let f = feature([(0.0, 0.0), (3.0, 0.0), (0.0, 4.0)]);

    assert!((f.angles[0] - (3.0f64 / 4.0).atan()).abs() < 1e-12);
    assert!((f.angles[1] - (4.0f64 / 3.0).atan()).abs() < 1e-12);
    assert!((f.angles[2] - FRAC_PI_2).abs() < 1e-12);
    // Right angle sits at vertex 0, smallest angle at vertex 2.
    assert_eq!(f.by_angle, [2, 1, 0]);
    assert!((f.area - 6.0).abs() < 1e-12);
    // (0,4) -> (3,0) -> (0,0) winds negatively.
    assert_eq!(f.orientation, Orientation::Clockwise);
}

#[test]
fn test_angles_sum_to_pi() {
    let f = feature([(1.5, -2.0), (17.0, 3.25), (4.0, 11.0)]);
    let sum: f64 = f.angles.iter().sum();
    assert!((sum - PI).abs() < 1e-9, "sum = {}", sum);
    assert!(f.angles[0] <= f.angles[1] && f.angles[1] <= f.angles[2]);
}

#[test]
fn test_angles_invariant_under_translation() {
    let base = feature([(0.0, 0.0), (3.0, 0.0), (0.0, 4.0)]);
    let moved = feature([(100.0, -50.0), (103.0, -50.0), (100.0, -46.0)]);
    for (a, b) in base.angles.iter().zip(moved.angles.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
    assert_eq!(base.orientation, moved.orientation);
}

#[test]
fn test_angles_invariant_under_rotation_and_scale() {
    let base = [(0.0, 0.0), (5.0, 1.0), (2.0, 7.0)];
    let (s, c) = 0.7f64.sin_cos();
    let rotated = base.map(|(x, y)| (3.0 * (c * x - s * y), 3.0 * (s * x + c * y)));
    let a = feature(base);
    let b = feature(rotated);
    for (x, y) in a.angles.iter().zip(b.angles.iter()) {
        assert!((x - y).abs() < 1e-9);
    }
    assert_eq!(a.orientation, b.orientation);
}

#[test]
fn test_orientation_flips_under_mirror() {
    let base = feature([(0.0, 0.0), (3.0, 0.0), (0.0, 4.0)]);
    let mirrored = feature([(0.0, 0.0), (-3.0, 0.0), (0.0, 4.0)]);
    assert_eq!(base.orientation.sign(), -mirrored.orientation.sign());
    for (a, b) in base.angles.iter().zip(mirrored.angles.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_orientation_independent_of_vertex_order() {
    let a = TriangleFeature::from_positions(
        [0, 1, 2],
        [DVec2::new(0.0, 0.0), DVec2::new(3.0, 0.0), DVec2::new(0.0, 4.0)],
    );
    let b = TriangleFeature::from_positions(
        [0, 1, 2],
        [DVec2::new(3.0, 0.0), DVec2::new(0.0, 0.0), DVec2::new(0.0, 4.0)],
    );
    assert_eq!(a.orientation, b.orientation);
    assert_eq!(b.by_angle, [2, 0, 1]);
}

#[test]
fn test_collinear_kept_but_degenerate() {
    let f = feature([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    assert!(f.is_degenerate());
    assert!(f.angles.iter().all(|a| a.is_finite()));
}

#[test]
fn test_coincident_points_do_not_produce_nan() {
    let f = feature([(5.0, 5.0), (5.0, 5.0), (9.0, 1.0)]);
    assert!(f.is_degenerate());
    assert!(f.angles.iter().all(|a| a.is_finite()));
}

#[test]
fn test_matches_requires_same_orientation() {
    let base = feature([(0.0, 0.0), (3.0, 0.0), (0.0, 4.0)]);
    let mirrored = feature([(0.0, 0.0), (-3.0, 0.0), (0.0, 4.0)]);
    assert!(base.matches(&base, 0.01));
    assert!(!base.matches(&mirrored, 0.01));
}

// ============================================================================
// Feature enumeration and hash lookups
// ============================================================================

#[test]
fn test_one_feature_per_triple() {
    let s = stars(&[(0, 0), (10, 0), (0, 10), (10, 10), (5, 17)]);
    let features = triangle_features(&s);
    assert_eq!(features.len(), 10);
    for f in &features {
        assert!(f.indices[0] < f.indices[1] && f.indices[1] < f.indices[2]);
    }
}

#[test]
fn test_fewer_than_three_stars_has_no_features() {
    assert!(triangle_features(&stars(&[(0, 0), (1, 1)])).is_empty());
    assert!(TriangleFeatureIndex::build(&[]).is_empty());
}

#[test]
fn test_hash_table_holds_every_feature() {
    let s = stars(&[(0, 0), (10, 0), (0, 10), (10, 10), (5, 17), (23, 4)]);
    let features = triangle_features(&s);
    let table = TriangleHashTable::build(&features, 20);
    assert_eq!(table.len(), features.len());
}

#[test]
fn test_hash_table_bins_each_feature_once() {
    let s = stars(&[(0, 0), (10, 0), (0, 10), (10, 10), (5, 17), (23, 4)]);
    let features = triangle_features(&s);
    let table = TriangleHashTable::build(&features, 8);

    let mut per_bin = vec![0usize; 64];
    for f in &features {
        let (bx, by) = f.hash_key(8);
        per_bin[by * 8 + bx] += 1;
    }
    for by in 0..8 {
        for bx in 0..8 {
            assert_eq!(table.bin_len(bx, by), per_bin[by * 8 + bx], "bin ({}, {})", bx, by);
        }
    }
}

#[test]
fn test_hash_candidates_keep_feature_order_within_bin() {
    // Three congruent right isosceles triangles share one bin.
    let features = vec![
        feature([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]),
        feature([(5.0, 5.0), (25.0, 5.0), (5.0, 25.0)]),
        feature([(1.0, 1.0), (4.0, 1.0), (1.0, 4.0)]),
    ];
    let table = TriangleHashTable::build(&features, 50);
    let mut out = vec![99];
    table.find_candidates_into(&features[0], 1e-6, &mut out);
    assert_eq!(out, vec![0, 1, 2]);
}

#[test]
fn test_find_matches_locates_scaled_copy() {
    let reference = stars(&[(0, 0), (30, 2), (11, 25), (40, 40), (-7, 19)]);
    let scaled: Vec<Star> = reference
        .iter()
        .map(|s| Star::new(s.x * 2 + 5, s.y * 2 - 3, s.brightness))
        .collect();

    let index = TriangleFeatureIndex::build(&reference);
    let query_features = triangle_features(&scaled);

    for (q_idx, query) in query_features.iter().enumerate() {
        let hits = index.find_matches(query, 1e-9);
        assert!(
            hits.contains(&q_idx),
            "feature {:?} not found among {:?}",
            query.indices,
            hits
        );
    }
}

#[test]
fn test_find_matches_crosses_bin_boundaries() {
    // A tolerance wider than one bin must still reach the neighbouring bins.
    let reference = stars(&[(0, 0), (30, 0), (0, 40)]);
    let index = TriangleFeatureIndex::build_with_bins(&reference, 100);
    let query = feature([(0.0, 0.0), (30.0, 0.0), (0.5, 40.0)]);
    assert_eq!(index.find_matches(&query, 0.05), vec![0]);
    assert!(index.find_matches(&query, 1e-6).is_empty());
}

#[test]
fn test_find_matches_rejects_mirror_image() {
    let reference = stars(&[(0, 0), (30, 0), (0, 40)]);
    let index = TriangleFeatureIndex::build(&reference);
    let mirrored = feature([(0.0, 0.0), (-30.0, 0.0), (0.0, 40.0)]);
    assert!(index.find_matches(&mirrored, 0.01).is_empty());
}
