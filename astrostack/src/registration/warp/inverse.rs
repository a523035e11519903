use common::Buffer2;
use glam::DVec2;
use rayon::prelude::*;

use super::{Target, WarpedImage};
use crate::registration::transform::AffineTransform;
use crate::{AstroImage, ImageDimensions};

/// Sample every destination pixel from the source through `inverse`.
pub(super) fn warp_inverse(
    image: &AstroImage,
    inverse: &AffineTransform,
    target: &Target,
) -> WarpedImage {
    let width = target.width;
    let dims = ImageDimensions::new(width, target.height, image.channels());
    let mut out = AstroImage::new(dims);

    for c in 0..dims.channels {
        let input = image.plane(c);
        out.channel_mut(c)
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let mut src = row_start(inverse, target, y);
                let [a, _, _, d, _, _] = inverse.params();
                for out_pixel in row.iter_mut() {
                    *out_pixel = bilinear_sample(input, src.x, src.y);
                    src.x += a;
                    src.y += d;
                }
            });
    }

    let (src_w, src_h) = ((image.width() - 1) as f64, (image.height() - 1) as f64);
    let mut coverage = vec![false; width * target.height];
    coverage
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let mut src = row_start(inverse, target, y);
            let [a, _, _, d, _, _] = inverse.params();
            for covered in row.iter_mut() {
                *covered = (0.0..=src_w).contains(&src.x) && (0.0..=src_h).contains(&src.y);
                src.x += a;
                src.y += d;
            }
        });

    WarpedImage {
        image: out,
        coverage: Buffer2::new(width, target.height, coverage),
    }
}

/// Source position of destination pixel `(0, y)`; later pixels step by the
/// first column of the inverse.
#[inline]
fn row_start(inverse: &AffineTransform, target: &Target, y: usize) -> DVec2 {
    inverse.apply(DVec2::new(0.0, y as f64) - target.center) + target.source_center
}

/// Bilinear sample; taps outside the image read as 0.
#[inline]
fn bilinear_sample(input: &Buffer2<f32>, x: f64, y: f64) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let tap = |tx: i64, ty: i64| input.get_checked(tx, ty).copied().unwrap_or(0.0);

    let p00 = tap(x0, y0);
    let p10 = tap(x0 + 1, y0);
    let p01 = tap(x0, y0 + 1);
    let p11 = tap(x0 + 1, y0 + 1);

    let top = p00 + fx * (p10 - p00);
    let bottom = p01 + fx * (p11 - p01);
    top + fy * (bottom - top)
}
