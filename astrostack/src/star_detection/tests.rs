//! Tests for star detection.

use common::Buffer2;

use super::*;
use crate::{AstroImage, ImageDimensions};

fn plane(width: usize, height: usize, points: &[(usize, usize, f32)]) -> Buffer2<f32> {
    let mut buf = Buffer2::new_default(width, height);
    for &(x, y, v) in points {
        *buf.get_mut(x, y) = v;
    }
    buf
}

// ============================================================================
// detect_stars
// ============================================================================

#[test]
fn test_single_bright_pixel() {
    let img = plane(10, 10, &[(4, 6, 0.9)]);
    let stars = detect_stars(&img, 0.5);
    assert_eq!(stars, vec![Star::new(4, 6, 0.9f32 as f64)]);
}

#[test]
fn test_below_threshold_is_ignored() {
    let img = plane(10, 10, &[(4, 6, 0.4)]);
    assert!(detect_stars(&img, 0.5).is_empty());
}

#[test]
fn test_empty_image() {
    let img = Buffer2::new_default(16, 16);
    assert!(detect_stars(&img, 0.1).is_empty());
}

#[test]
fn test_tiny_image_has_no_interior() {
    let img = Buffer2::new_filled(2, 2, 1.0);
    assert!(detect_stars(&img, 0.5).is_empty());
}

#[test]
fn test_border_pixels_are_never_candidates() {
    let img = plane(8, 8, &[(0, 3, 1.0), (7, 7, 1.0), (3, 0, 1.0)]);
    assert!(detect_stars(&img, 0.5).is_empty());
}

#[test]
fn test_tied_plateau_forms_one_star() {
    // Two equal adjacent maxima cluster into one star at their centroid.
    let img = plane(10, 10, &[(4, 4, 0.8), (5, 4, 0.8)]);
    let stars = detect_stars(&img, 0.5);
    assert_eq!(stars.len(), 1);
    // Centroid x = 4.5 truncates to 4.
    assert_eq!((stars[0].x, stars[0].y), (4, 4));
    assert!((stars[0].brightness - 0.8).abs() < 1e-6);
}

#[test]
fn test_brightness_is_cluster_mean() {
    let img = plane(10, 10, &[(3, 3, 0.7), (4, 4, 0.7), (8, 8, 0.0)]);
    let stars = detect_stars(&img, 0.5);
    assert_eq!(stars.len(), 1);
    assert_eq!((stars[0].x, stars[0].y), (3, 3));
    assert!((stars[0].brightness - 0.7).abs() < 1e-6);
}

#[test]
fn test_stars_sorted_brightest_first() {
    let img = plane(
        20,
        20,
        &[(3, 3, 0.6), (10, 10, 0.95), (15, 4, 0.8), (6, 15, 0.8)],
    );
    let stars = detect_stars(&img, 0.5);
    let positions: Vec<(i32, i32)> = stars.iter().map(|s| (s.x, s.y)).collect();
    // Equal brightness breaks ties by row, then column.
    assert_eq!(positions, vec![(10, 10), (15, 4), (6, 15), (3, 3)]);
}

#[test]
fn test_neighbour_shadowed_by_brighter_pixel() {
    let img = plane(10, 10, &[(4, 4, 0.9), (5, 4, 0.7)]);
    let stars = detect_stars(&img, 0.5);
    assert_eq!(stars.len(), 1);
    assert_eq!((stars[0].x, stars[0].y), (4, 4));
}

// ============================================================================
// StarDetector
// ============================================================================

#[test]
fn test_detector_caps_star_count() {
    let points: Vec<(usize, usize, f32)> = (0..6)
        .map(|i| (2 + i * 3, 5, 0.6 + i as f32 * 0.05))
        .collect();
    let img = plane(24, 12, &points);
    let detector = StarDetector::from_config(StarDetectionConfig {
        threshold: 0.5,
        max_stars: Some(3),
    });
    let stars = detector.detect_plane(&img);
    assert_eq!(stars.len(), 3);
    let xs: Vec<i32> = stars.iter().map(|s| s.x).collect();
    assert_eq!(xs, vec![17, 14, 11]);
}

#[test]
fn test_detector_uses_luminance() {
    let dims = ImageDimensions::new(10, 10, 3);
    let mut img = AstroImage::new(dims);
    // Green dominates Rec. 709 luminance; red alone stays below threshold.
    img.set(1, 3, 3, 1.0);
    img.set(0, 7, 7, 1.0);
    let detector = StarDetector::from_config(StarDetectionConfig {
        threshold: 0.5,
        max_stars: None,
    });
    let stars = detector.detect(&img);
    assert_eq!(stars.len(), 1);
    assert_eq!((stars[0].x, stars[0].y), (3, 3));
}

#[test]
#[should_panic(expected = "max_stars must be at least 3")]
fn test_config_rejects_tiny_cap() {
    StarDetector::from_config(StarDetectionConfig {
        threshold: 0.5,
        max_stars: Some(2),
    });
}
