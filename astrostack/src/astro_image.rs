//! In-memory image model shared by every stage.
//!
//! Pixels are `f32`, nominally in `[0, 1]`, stored planar: one row-major
//! [`Buffer2`] per channel. Decoding and encoding happen outside this crate.

use common::Buffer2;
use rayon::prelude::*;

/// Rec. 709 luminance weights for RGB data.
const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Image dimensions: width, height, and number of channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageDimensions {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Number of channels (1 for grayscale, 3 for RGB)
    pub channels: usize,
}

impl ImageDimensions {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        assert!(width > 0, "Width must be positive");
        assert!(height > 0, "Height must be positive");
        assert!(channels > 0, "Channels must be positive");
        Self {
            width,
            height,
            channels,
        }
    }

    /// Pixels in one channel plane (width * height).
    pub fn pixels_per_channel(&self) -> usize {
        self.width * self.height
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    pub fn is_rgb(&self) -> bool {
        self.channels == 3
    }
}

/// A planar multi-channel image.
#[derive(Debug, Clone, PartialEq)]
pub struct AstroImage {
    dimensions: ImageDimensions,
    planes: Vec<Buffer2<f32>>,
}

impl AstroImage {
    /// Zero-filled image.
    pub fn new(dimensions: ImageDimensions) -> Self {
        let planes = (0..dimensions.channels)
            .map(|_| Buffer2::new_default(dimensions.width, dimensions.height))
            .collect();
        Self { dimensions, planes }
    }

    /// Build from one vector per channel, each `width * height` long.
    pub fn from_planar_channels(dimensions: ImageDimensions, channels: Vec<Vec<f32>>) -> Self {
        assert_eq!(
            channels.len(),
            dimensions.channels,
            "channel count must match dimensions"
        );
        let planes = channels
            .into_iter()
            .map(|data| Buffer2::new(dimensions.width, dimensions.height, data))
            .collect();
        Self { dimensions, planes }
    }

    /// Single-channel image from a plane.
    pub fn from_gray(plane: Buffer2<f32>) -> Self {
        let dimensions = ImageDimensions::new(plane.width(), plane.height(), 1);
        Self {
            dimensions,
            planes: vec![plane],
        }
    }

    pub fn dimensions(&self) -> ImageDimensions {
        self.dimensions
    }

    pub fn width(&self) -> usize {
        self.dimensions.width
    }

    pub fn height(&self) -> usize {
        self.dimensions.height
    }

    pub fn channels(&self) -> usize {
        self.dimensions.channels
    }

    /// Pixel data of one channel, row-major.
    pub fn channel(&self, c: usize) -> &[f32] {
        self.planes[c].pixels()
    }

    pub fn channel_mut(&mut self, c: usize) -> &mut [f32] {
        self.planes[c].pixels_mut()
    }

    pub fn plane(&self, c: usize) -> &Buffer2<f32> {
        &self.planes[c]
    }

    #[inline]
    pub fn get(&self, c: usize, x: usize, y: usize) -> f32 {
        *self.planes[c].get(x, y)
    }

    #[inline]
    pub fn set(&mut self, c: usize, x: usize, y: usize, value: f32) {
        *self.planes[c].get_mut(x, y) = value;
    }

    /// Luminance plane. Grayscale images return a copy of their only channel;
    /// RGB uses Rec. 709 weights; any other layout averages its channels.
    pub fn luminance(&self) -> Buffer2<f32> {
        let dims = self.dimensions;
        if dims.is_grayscale() {
            return self.planes[0].clone();
        }

        let mut out = vec![0.0f32; dims.pixels_per_channel()];
        if dims.is_rgb() {
            let (r, g, b) = (self.channel(0), self.channel(1), self.channel(2));
            out.par_iter_mut().enumerate().for_each(|(i, l)| {
                *l = LUMA_WEIGHTS[0] * r[i] + LUMA_WEIGHTS[1] * g[i] + LUMA_WEIGHTS[2] * b[i];
            });
        } else {
            let inv = 1.0 / dims.channels as f32;
            out.par_iter_mut().enumerate().for_each(|(i, l)| {
                *l = self.planes.iter().map(|p| p.pixels()[i]).sum::<f32>() * inv;
            });
        }
        Buffer2::new(dims.width, dims.height, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let img = AstroImage::new(ImageDimensions::new(3, 2, 3));
        assert_eq!(img.channels(), 3);
        for c in 0..3 {
            assert!(img.channel(c).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_get_set_per_channel() {
        let mut img = AstroImage::new(ImageDimensions::new(4, 4, 3));
        img.set(1, 2, 3, 0.5);
        assert_eq!(img.get(1, 2, 3), 0.5);
        assert_eq!(img.get(0, 2, 3), 0.0);
        assert_eq!(img.channel(1)[3 * 4 + 2], 0.5);
    }

    #[test]
    fn test_luminance_rgb_weights() {
        let dims = ImageDimensions::new(1, 1, 3);
        let img = AstroImage::from_planar_channels(dims, vec![vec![1.0], vec![0.0], vec![0.0]]);
        assert!((img.luminance()[(0, 0)] - 0.2126).abs() < 1e-6);

        let white =
            AstroImage::from_planar_channels(dims, vec![vec![1.0], vec![1.0], vec![1.0]]);
        assert!((white.luminance()[(0, 0)] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_luminance_gray_is_copy() {
        let plane = Buffer2::new(2, 1, vec![0.25, 0.75]);
        let img = AstroImage::from_gray(plane.clone());
        assert_eq!(img.luminance(), plane);
    }

    #[test]
    #[should_panic(expected = "channel count must match dimensions")]
    fn test_from_planar_channels_count_mismatch() {
        AstroImage::from_planar_channels(ImageDimensions::new(1, 1, 3), vec![vec![0.0]]);
    }

    #[test]
    #[should_panic(expected = "Width must be positive")]
    fn test_dimensions_reject_zero_width() {
        ImageDimensions::new(0, 4, 1);
    }

    #[test]
    #[should_panic(expected = "Channels must be positive")]
    fn test_dimensions_reject_zero_channels() {
        ImageDimensions::new(4, 4, 0);
    }
}
