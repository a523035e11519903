use common::Buffer2;
use glam::DVec2;

use super::{Target, WarpedImage};
use crate::registration::transform::AffineTransform;
use crate::{AstroImage, ImageDimensions};

/// Push each source pixel to its rounded destination.
///
/// Runs in source row-major order so collisions resolve the same way every
/// time: the last source pixel written wins. Uncovered destinations stay 0.
pub(super) fn warp_forward(
    image: &AstroImage,
    transform: &AffineTransform,
    target: &Target,
) -> WarpedImage {
    let (width, height) = (target.width, target.height);
    let mut out = AstroImage::new(ImageDimensions::new(width, height, image.channels()));
    let mut coverage = Buffer2::new_filled(width, height, false);

    for y in 0..image.height() {
        for x in 0..image.width() {
            let dest =
                transform.apply(DVec2::new(x as f64, y as f64) - target.source_center) + target.center;
            let dx = dest.x.round();
            let dy = dest.y.round();
            if !(0.0..width as f64).contains(&dx) || !(0.0..height as f64).contains(&dy) {
                continue;
            }
            let (dx, dy) = (dx as usize, dy as usize);
            for c in 0..image.channels() {
                out.set(c, dx, dy, image.get(c, x, y));
            }
            *coverage.get_mut(dx, dy) = true;
        }
    }

    WarpedImage {
        image: out,
        coverage,
    }
}
