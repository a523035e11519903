//! Per-pixel exposure-fusion quality weights.
//!
//! `w = contrast·|∇²L| + saturation·blur3x3(σ_channels) + exposure·E^0.2`
//! with `E = exp(-(L - 0.5)² / 0.08)`. Sharp, colourful, mid-grey samples
//! dominate the weighted mean. Borders clamp to the nearest edge pixel.

use common::Buffer2;
use rayon::prelude::*;

use crate::AstroImage;
use crate::stacking::config::QualityWeights;

/// `2σ²` of the well-exposedness Gaussian centred at mid-grey.
const EXPOSURE_SPREAD: f32 = 0.08;

const EXPOSURE_EXPONENT: f32 = 0.2;

/// Quality weight of every pixel of `image`.
pub fn quality_weights(image: &AstroImage, weights: &QualityWeights) -> Buffer2<f32> {
    let luminance = image.luminance();
    let width = image.width();
    let height = image.height();

    let contrast = contrast_map(&luminance);
    let saturation = if image.channels() > 1 && weights.saturation > 0.0 {
        Some(box_blur_3x3(&channel_std_dev(image)))
    } else {
        None
    };

    let mut out = vec![0.0f32; width * height];
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let lum_row = luminance.row(y);
            let contrast_row = contrast.row(y);
            let saturation_row = saturation.as_ref().map(|s| s.row(y));
            for x in 0..width {
                let mut w = weights.contrast * contrast_row[x]
                    + weights.exposure * well_exposedness(lum_row[x]).powf(EXPOSURE_EXPONENT);
                if let Some(s) = saturation_row {
                    w += weights.saturation * s[x];
                }
                row[x] = w;
            }
        });

    Buffer2::new(width, height, out)
}

#[inline]
pub(crate) fn well_exposedness(l: f32) -> f32 {
    let d = l - 0.5;
    (-(d * d) / EXPOSURE_SPREAD).exp()
}

/// `|Laplacian|` with kernel `[0 1 0; 1 -4 1; 0 1 0]`.
pub(crate) fn contrast_map(luminance: &Buffer2<f32>) -> Buffer2<f32> {
    let width = luminance.width();
    let height = luminance.height();
    let mut out = vec![0.0f32; width * height];

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let up = luminance.row(y.saturating_sub(1));
            let mid = luminance.row(y);
            let down = luminance.row((y + 1).min(height - 1));
            for x in 0..width {
                let left = mid[x.saturating_sub(1)];
                let right = mid[(x + 1).min(width - 1)];
                let laplacian = up[x] + down[x] + left + right - 4.0 * mid[x];
                row[x] = laplacian.abs();
            }
        });

    Buffer2::new(width, height, out)
}

/// Population standard deviation across channels at every pixel.
pub(crate) fn channel_std_dev(image: &AstroImage) -> Buffer2<f32> {
    let width = image.width();
    let height = image.height();
    let channels = image.channels();
    let inv = 1.0 / channels as f32;
    let mut out = vec![0.0f32; width * height];

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let start = y * width;
            for (x, value) in row.iter_mut().enumerate() {
                let i = start + x;
                let mean = (0..channels).map(|c| image.channel(c)[i]).sum::<f32>() * inv;
                let variance = (0..channels)
                    .map(|c| {
                        let d = image.channel(c)[i] - mean;
                        d * d
                    })
                    .sum::<f32>()
                    * inv;
                *value = variance.sqrt();
            }
        });

    Buffer2::new(width, height, out)
}

/// 3x3 box mean.
pub(crate) fn box_blur_3x3(plane: &Buffer2<f32>) -> Buffer2<f32> {
    let width = plane.width();
    let height = plane.height();
    let mut out = vec![0.0f32; width * height];

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let rows = [
                plane.row(y.saturating_sub(1)),
                plane.row(y),
                plane.row((y + 1).min(height - 1)),
            ];
            for x in 0..width {
                let cols = [x.saturating_sub(1), x, (x + 1).min(width - 1)];
                let sum: f32 = rows
                    .iter()
                    .flat_map(|r| cols.iter().map(move |&c| r[c]))
                    .sum();
                row[x] = sum / 9.0;
            }
        });

    Buffer2::new(width, height, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageDimensions;

    fn gray(width: usize, height: usize, f: impl FnMut(usize, usize) -> f32) -> AstroImage {
        AstroImage::from_gray(Buffer2::from_fn(width, height, f))
    }

    #[test]
    fn test_well_exposedness_peaks_at_mid_gray() {
        assert!((well_exposedness(0.5) - 1.0).abs() < 1e-6);
        assert!((well_exposedness(0.0) - (-0.25f32 / 0.08).exp()).abs() < 1e-6);
        assert!(well_exposedness(0.9) < well_exposedness(0.6));
    }

    #[test]
    fn test_flat_gray_weight_is_exposure_only() {
        let img = gray(6, 5, |_, _| 0.3);
        let w = quality_weights(&img, &QualityWeights::default());
        let expected = well_exposedness(0.3).powf(0.2);
        for &v in w.iter() {
            assert!((v - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_contrast_of_single_spike() {
        let lum = Buffer2::from_fn(5, 5, |x, y| if (x, y) == (2, 2) { 1.0 } else { 0.0 });
        let c = contrast_map(&lum);
        assert_eq!(*c.get(2, 2), 4.0);
        assert_eq!(*c.get(1, 2), 1.0);
        assert_eq!(*c.get(2, 3), 1.0);
        assert_eq!(*c.get(1, 1), 0.0);
        assert_eq!(*c.get(0, 0), 0.0);
    }

    #[test]
    fn test_contrast_clamps_at_edges() {
        // Linear ramp: interior Laplacian is zero, clamped edges are not.
        let lum = Buffer2::from_fn(4, 1, |x, _| x as f32);
        let c = contrast_map(&lum);
        assert_eq!(c.row(0), &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_saturation_zero_for_equal_channels() {
        let dims = ImageDimensions::new(4, 4, 3);
        let img = AstroImage::from_planar_channels(dims, vec![vec![0.4; 16]; 3]);
        let s = channel_std_dev(&img);
        assert!(s.iter().all(|&v| v.abs() < 1e-7));
    }

    #[test]
    fn test_saturation_of_pure_red() {
        let dims = ImageDimensions::new(3, 3, 3);
        let img = AstroImage::from_planar_channels(
            dims,
            vec![vec![1.0; 9], vec![0.0; 9], vec![0.0; 9]],
        );
        let s = box_blur_3x3(&channel_std_dev(&img));
        let expected = (2.0f32 / 9.0).sqrt();
        for &v in s.iter() {
            assert!((v - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_box_blur_spreads_spike() {
        let plane = Buffer2::from_fn(5, 5, |x, y| if (x, y) == (2, 2) { 9.0 } else { 0.0 });
        let b = box_blur_3x3(&plane);
        assert!((b.get(2, 2) - 1.0).abs() < 1e-6);
        assert!((b.get(1, 3) - 1.0).abs() < 1e-6);
        assert_eq!(*b.get(0, 0), 0.0);
    }

    #[test]
    fn test_zero_coefficients_give_zero_weight() {
        let img = gray(3, 3, |x, y| (x + y) as f32 * 0.1);
        let zero = QualityWeights {
            contrast: 0.0,
            saturation: 0.0,
            exposure: 0.0,
        };
        let w = quality_weights(&img, &zero);
        assert!(w.iter().all(|&v| v == 0.0));
    }
}
