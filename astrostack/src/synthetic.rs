//! Synthetic star fields for tests, benchmarks and demos.
//!
//! Stars are rendered as circular Gaussians on a flat background. Positions
//! are drawn uniformly inside a margin with a minimum separation so that
//! detection resolves every star.

use common::Buffer2;
use glam::DVec2;
use rand::Rng;

use crate::AstroImage;
use crate::registration::{AffineTransform, image_center};
use crate::star_detection::{Star, sort_canonical};

/// Placement attempts per requested star before giving up on the rest.
const MAX_ATTEMPTS_PER_STAR: usize = 1000;

/// Draw up to `count` stars at integer positions at least `margin` pixels
/// from every border and `min_separation` pixels from each other.
///
/// Brightness is uniform in `[0.6, 1.0)`. Returns canonical order. Fewer
/// stars come back when the field is too crowded to place all of them.
pub fn random_stars<R: Rng>(
    rng: &mut R,
    count: usize,
    width: usize,
    height: usize,
    margin: usize,
    min_separation: f64,
) -> Vec<Star> {
    assert!(
        width > 2 * margin && height > 2 * margin,
        "margin {} leaves no room in {}x{}",
        margin,
        width,
        height
    );

    let min_sep_sq = min_separation * min_separation;
    let mut stars: Vec<Star> = Vec::with_capacity(count);
    let mut attempts = 0;
    while stars.len() < count && attempts < count * MAX_ATTEMPTS_PER_STAR {
        attempts += 1;
        let x = rng.random_range(margin..width - margin) as i32;
        let y = rng.random_range(margin..height - margin) as i32;
        let candidate = Star::new(x, y, rng.random_range(0.6..1.0));
        let crowded = stars
            .iter()
            .any(|s| s.pos().distance_squared(candidate.pos()) < min_sep_sq);
        if !crowded {
            stars.push(candidate);
        }
    }

    sort_canonical(&mut stars);
    stars
}

/// Add a Gaussian of peak `amplitude` centred at `(x, y)`, clipped to
/// the plane.
pub fn render_gaussian_star(plane: &mut Buffer2<f32>, x: f64, y: f64, sigma: f64, amplitude: f32) {
    let width = plane.width() as i64;
    let height = plane.height() as i64;
    let radius = (4.0 * sigma).ceil() as i64;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let cx = x.round() as i64;
    let cy = y.round() as i64;
    for py in (cy - radius).max(0)..=(cy + radius).min(height - 1) {
        for px in (cx - radius).max(0)..=(cx + radius).min(width - 1) {
            let dx = px as f64 - x;
            let dy = py as f64 - y;
            let value = amplitude * (-(dx * dx + dy * dy) / two_sigma_sq).exp() as f32;
            *plane.get_mut(px as usize, py as usize) += value;
        }
    }
}

/// Render `stars` on a flat `background`.
pub fn render_star_field(
    stars: &[Star],
    width: usize,
    height: usize,
    sigma: f64,
    background: f32,
) -> Buffer2<f32> {
    render_positions(
        stars.iter().map(|s| (s.pos(), s.brightness as f32)),
        width,
        height,
        sigma,
        background,
    )
}

/// Render `stars` after moving every position through `transform` about the
/// image center. Positions stay sub-pixel.
pub fn render_transformed_field(
    stars: &[Star],
    transform: &AffineTransform,
    width: usize,
    height: usize,
    sigma: f64,
    background: f32,
) -> Buffer2<f32> {
    let center = image_center(width, height);
    render_positions(
        stars
            .iter()
            .map(|s| (transform.apply_centered(s.pos(), center), s.brightness as f32)),
        width,
        height,
        sigma,
        background,
    )
}

/// Three-channel image of the same field with a per-channel gain.
pub fn colour_frame(luminance: &Buffer2<f32>, gains: [f32; 3]) -> AstroImage {
    let dims = crate::ImageDimensions::new(luminance.width(), luminance.height(), 3);
    let planes = gains
        .iter()
        .map(|&g| luminance.iter().map(|&v| (v * g).min(1.0)).collect())
        .collect();
    AstroImage::from_planar_channels(dims, planes)
}

fn render_positions(
    positions: impl Iterator<Item = (DVec2, f32)>,
    width: usize,
    height: usize,
    sigma: f64,
    background: f32,
) -> Buffer2<f32> {
    let mut plane = Buffer2::new_filled(width, height, background);
    for (p, amplitude) in positions {
        render_gaussian_star(&mut plane, p.x, p.y, sigma, amplitude);
    }
    plane
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::star_detection::detect_stars;

    #[test]
    fn test_random_stars_respect_margin_and_separation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let stars = random_stars(&mut rng, 30, 400, 300, 20, 15.0);
        assert_eq!(stars.len(), 30);
        for (i, a) in stars.iter().enumerate() {
            assert!(a.x >= 20 && a.x < 380 && a.y >= 20 && a.y < 280);
            for b in &stars[i + 1..] {
                assert!(a.pos().distance(b.pos()) >= 15.0);
            }
        }
        assert!(stars.windows(2).all(|w| w[0].brightness >= w[1].brightness));
    }

    #[test]
    fn test_random_stars_gives_up_when_crowded() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let stars = random_stars(&mut rng, 50, 30, 30, 5, 15.0);
        assert!(!stars.is_empty());
        assert!(stars.len() < 50);
    }

    #[test]
    fn test_rendered_peak_is_detected() {
        let stars = vec![Star::new(40, 30, 0.9), Star::new(10, 12, 0.7)];
        let plane = render_star_field(&stars, 64, 48, 1.5, 0.05);
        assert!((plane.get(40, 30) - 0.95).abs() < 1e-5);

        let found = detect_stars(&plane, 0.5);
        let positions: Vec<(i32, i32)> = found.iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(positions, vec![(40, 30), (10, 12)]);
    }

    #[test]
    fn test_transformed_field_moves_peak() {
        let stars = vec![Star::new(20, 20, 1.0)];
        let t = AffineTransform::translation(5.0, -3.0);
        let plane = render_transformed_field(&stars, &t, 50, 50, 1.0, 0.0);
        assert!((plane.get(25, 17) - 1.0).abs() < 1e-6);
        assert!(*plane.get(20, 20) < 1e-6);
    }
}
