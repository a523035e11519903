//! Resampling images (and star lists) into the reference geometry.
//!
//! Two strategies, selected explicitly with [`WarpMethod`]:
//! inverse bilinear mapping samples every destination pixel and is the
//! default; forward splatting is cheaper but leaves holes and overwrites on
//! collisions. Pixels outside the source footprint read as 0 and are marked
//! uncovered in [`WarpedImage::coverage`].

mod forward;
mod inverse;

use common::Buffer2;
use glam::DVec2;

use crate::AstroImage;
use crate::registration::config::WarpMethod;
use crate::registration::error::WarpError;
use crate::registration::estimator::image_center;
use crate::registration::transform::AffineTransform;
use crate::star_detection::Star;

/// A resampled image and which of its pixels the source reached.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpedImage {
    pub image: AstroImage,
    /// Inverse mapping: the sample point lies inside the source.
    /// Forward splatting: some source pixel landed here.
    pub coverage: Buffer2<bool>,
}

/// Resample `image` so that pixel `p` lands at `T·(p − c) + c`.
///
/// The output has the input's dimensions. Inverse mapping needs `transform`
/// to be invertible and fails with [`WarpError::SingularTransform`]
/// otherwise; forward splatting never fails.
pub fn warp_image(
    image: &AstroImage,
    transform: &AffineTransform,
    method: WarpMethod,
) -> Result<AstroImage, WarpError> {
    warp_image_to(image, transform, method, image.width(), image.height()).map(|w| w.image)
}

/// Resample `image` onto a `width` x `height` grid.
///
/// Source pixel `p` lands at `T·(p − c_src) + c_dst`, each center taken
/// from its own image. The channel count is kept.
///
/// # Panics
///
/// Panics if `width` or `height` is 0.
pub fn warp_image_to(
    image: &AstroImage,
    transform: &AffineTransform,
    method: WarpMethod,
    width: usize,
    height: usize,
) -> Result<WarpedImage, WarpError> {
    let target = Target {
        width,
        height,
        source_center: image_center(image.width(), image.height()),
        center: image_center(width, height),
    };
    match method {
        WarpMethod::ForwardSplat => Ok(forward::warp_forward(image, transform, &target)),
        WarpMethod::InverseBilinear => {
            let inverse = transform.inverse().ok_or(WarpError::SingularTransform)?;
            Ok(inverse::warp_inverse(image, &inverse, &target))
        }
    }
}

/// Destination grid plus both centers.
struct Target {
    width: usize,
    height: usize,
    source_center: DVec2,
    center: DVec2,
}

/// Map star coordinates through `transform`, rounding to the nearest pixel.
/// Brightness is kept.
pub fn warp_stars(
    stars: &[Star],
    transform: &AffineTransform,
    width: usize,
    height: usize,
) -> Vec<Star> {
    let center = image_center(width, height);
    stars
        .iter()
        .map(|s| {
            let p = transform.apply_centered(s.pos(), center);
            Star::new(p.x.round() as i32, p.y.round() as i32, s.brightness)
        })
        .collect()
}
