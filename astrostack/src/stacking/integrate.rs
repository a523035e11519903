//! Quality-weighted integration of aligned frames.
//!
//! Frames are pulled from lazy suppliers, written with their weight map into
//! an [`OutOfCoreTensor`], and reduced per channel and row chunk into
//! `Σ(v·w) / Σw`. Pixels whose weights sum to zero take the plain mean.
//!
//! A frame may carry a coverage mask; its weight is zero wherever the mask is
//! false, so warp borders do not darken the stack.

use common::Buffer2;
use common::parallel::try_for_each_limited;
use rayon::prelude::*;

use crate::stacking::config::{
    IntegrationConfig, QualityWeights, compute_optimal_chunk_rows_with_memory,
};
use crate::stacking::error::Error;
use crate::stacking::progress::{ProgressCallback, StackingStage, StageReporter};
use crate::stacking::tensor::{OutOfCoreTensor, TensorShape, TensorStorage};
use crate::stacking::weights::quality_weights;
use crate::{AstroImage, ImageDimensions};

/// Lazily produces one frame. `Ok(None)` excludes the frame from the result.
pub type FrameSupplier<'a> = Box<dyn FnOnce() -> anyhow::Result<Option<AstroImage>> + Send + 'a>;

/// Like [`FrameSupplier`] for frames that carry a coverage mask.
pub type CoveredFrameSupplier<'a> =
    Box<dyn FnOnce() -> anyhow::Result<Option<CoveredFrame>> + Send + 'a>;

/// A frame and the pixels that hold real data.
#[derive(Debug, Clone, PartialEq)]
pub struct CoveredFrame {
    image: AstroImage,
    coverage: Option<Buffer2<bool>>,
}

impl CoveredFrame {
    /// `coverage == None` means every pixel is covered.
    ///
    /// # Panics
    ///
    /// Panics if the mask size differs from the image size.
    pub fn new(image: AstroImage, coverage: Option<Buffer2<bool>>) -> Self {
        if let Some(mask) = &coverage {
            assert!(
                mask.width() == image.width() && mask.height() == image.height(),
                "coverage {}x{} does not match image {}x{}",
                mask.width(),
                mask.height(),
                image.width(),
                image.height()
            );
        }
        Self { image, coverage }
    }

    pub fn image(&self) -> &AstroImage {
        &self.image
    }

    pub fn coverage(&self) -> Option<&Buffer2<bool>> {
        self.coverage.as_ref()
    }
}

impl From<AstroImage> for CoveredFrame {
    fn from(image: AstroImage) -> Self {
        Self::new(image, None)
    }
}

/// Integrates frames with exposure-fusion weights.
#[derive(Clone, Default)]
pub struct FrameIntegrator {
    config: IntegrationConfig,
    progress: ProgressCallback,
}

impl std::fmt::Debug for FrameIntegrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameIntegrator")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// State built up while frames arrive.
struct Accumulator {
    tensor: Option<OutOfCoreTensor>,
    dimensions: Option<ImageDimensions>,
    included: usize,
}

impl FrameIntegrator {
    pub fn new(config: IntegrationConfig) -> Self {
        config.validate();
        Self {
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Load, weight and combine `suppliers` in order.
    ///
    /// Fails on the first supplier error or dimension mismatch, or with
    /// [`Error::NoFrames`] when every supplier excluded its frame.
    pub fn integrate(&self, suppliers: Vec<FrameSupplier<'_>>) -> Result<AstroImage, Error> {
        let covered: Vec<CoveredFrameSupplier<'_>> = suppliers
            .into_iter()
            .map(|supplier| {
                Box::new(move || -> anyhow::Result<Option<CoveredFrame>> {
                    Ok(supplier()?.map(CoveredFrame::from))
                }) as CoveredFrameSupplier<'_>
            })
            .collect();
        self.integrate_covered(covered)
    }

    /// [`integrate`](Self::integrate) for frames with coverage masks.
    pub fn integrate_covered(
        &self,
        suppliers: Vec<CoveredFrameSupplier<'_>>,
    ) -> Result<AstroImage, Error> {
        let total = suppliers.len();
        if total == 0 {
            return Err(Error::NoFrames);
        }

        tracing::info!(
            frames = total,
            parallel_frames = self.config.parallel_frames,
            "Starting integration"
        );

        let mut acc = Accumulator {
            tensor: None,
            dimensions: None,
            included: 0,
        };

        let weights = self.config.weights;
        let loading = StageReporter::new(&self.progress, StackingStage::Loading, total);
        let loaded = try_for_each_limited(
            suppliers,
            self.config.parallel_frames,
            |index, supplier| load_frame(index, supplier, &weights),
            |index, frame| {
                let result = match frame {
                    Some((image, weight_map)) => {
                        self.store_frame(&mut acc, total, index, &image, &weight_map)
                    }
                    None => {
                        tracing::debug!(index, "Frame excluded from integration");
                        Ok(())
                    }
                };
                loading.report(index + 1);
                result
            },
        );

        if let Err(e) = loaded {
            if let Some(tensor) = acc.tensor.take()
                && let Err(close_err) = tensor.close()
            {
                tracing::warn!(error = %close_err, "Failed to release tensor after error");
            }
            return Err(e);
        }

        let (Some(tensor), Some(dimensions)) = (acc.tensor, acc.dimensions) else {
            return Err(Error::NoFrames);
        };

        let result = self.combine(&tensor, dimensions, acc.included);
        tensor.close()?;

        tracing::info!(
            included = acc.included,
            excluded = total - acc.included,
            "Integration complete"
        );
        Ok(result)
    }

    fn store_frame(
        &self,
        acc: &mut Accumulator,
        total: usize,
        index: usize,
        image: &AstroImage,
        weight_map: &Buffer2<f32>,
    ) -> Result<(), Error> {
        let dims = image.dimensions();
        if let Some(expected) = acc.dimensions
            && expected != dims
        {
            return Err(Error::DimensionMismatch {
                index,
                expected,
                actual: dims,
            });
        }

        let mut tensor = match acc.tensor.take() {
            Some(tensor) => tensor,
            None => {
                let shape = TensorShape::new(total, dims.channels, dims.pixels_per_channel())?;
                acc.dimensions = Some(dims);
                OutOfCoreTensor::new(shape, &self.config.tensor)?
            }
        };

        let slot_frame = acc.included;
        for c in 0..dims.channels {
            tensor.write_plane(slot_frame, c, image.channel(c));
        }
        let weight_slot = tensor.shape().weight_slot();
        tensor.write_plane(slot_frame, weight_slot, weight_map.pixels());
        acc.tensor = Some(tensor);
        acc.included += 1;

        tracing::debug!(index, slot = slot_frame, "Frame written to tensor");
        Ok(())
    }

    /// Weighted mean over the first `frames` tensor frames.
    fn combine(
        &self,
        tensor: &OutOfCoreTensor,
        dims: ImageDimensions,
        frames: usize,
    ) -> AstroImage {
        let width = dims.width;
        let height = dims.height;
        let channels = dims.channels;
        let weight_slot = tensor.shape().weight_slot();

        let chunk_rows = match tensor.storage() {
            TensorStorage::InMemory => height,
            TensorStorage::Mapped => compute_optimal_chunk_rows_with_memory(
                width,
                2, // one channel plus the weight plane
                frames,
                self.config.tensor.get_available_memory(),
            )
            .min(height),
        };
        let num_chunks = height.div_ceil(chunk_rows);
        let total_work = num_chunks * channels;

        let mut output: Vec<Vec<f32>> = (0..channels)
            .map(|_| vec![0.0f32; dims.pixels_per_channel()])
            .collect();

        let combining = StageReporter::new(&self.progress, StackingStage::Combining, total_work);
        combining.report(0);

        for chunk_idx in 0..num_chunks {
            let start_row = chunk_idx * chunk_rows;
            let end_row = (start_row + chunk_rows).min(height);
            let start_pixel = start_row * width;
            let pixels_in_chunk = (end_row - start_row) * width;

            let weights = read_chunk(tensor, frames, weight_slot, start_pixel, pixels_in_chunk);

            for (channel, output_channel) in output.iter_mut().enumerate() {
                let values = read_chunk(tensor, frames, channel, start_pixel, pixels_in_chunk);
                let output_slice = &mut output_channel[start_pixel..][..pixels_in_chunk];

                output_slice
                    .par_chunks_mut(width)
                    .enumerate()
                    .for_each(|(row_in_chunk, row_output)| {
                        let row_offset = row_in_chunk * width;
                        for (pixel_in_row, out) in row_output.iter_mut().enumerate() {
                            let pixel = row_offset + pixel_in_row;
                            *out = weighted_mean(
                                values.iter().map(|v| v[pixel]),
                                weights.iter().map(|w| w[pixel]),
                            );
                        }
                    });

                combining.report(chunk_idx * channels + channel + 1);
            }
        }

        AstroImage::from_planar_channels(dims, output)
    }
}

/// Integrate with a default-constructed [`FrameIntegrator`] for `config`.
pub fn integrate(
    suppliers: Vec<FrameSupplier<'_>>,
    config: &IntegrationConfig,
) -> Result<AstroImage, Error> {
    FrameIntegrator::new(config.clone()).integrate(suppliers)
}

type WeightedFrame = Option<(AstroImage, Buffer2<f32>)>;

fn load_frame(
    index: usize,
    supplier: CoveredFrameSupplier<'_>,
    weights: &QualityWeights,
) -> Result<WeightedFrame, Error> {
    let frame = supplier().map_err(|source| Error::FrameLoad { index, source })?;
    Ok(frame.map(|frame| {
        let mut weight_map = quality_weights(&frame.image, weights);
        if let Some(coverage) = &frame.coverage {
            mask_uncovered(&mut weight_map, coverage);
        }
        (frame.image, weight_map)
    }))
}

fn mask_uncovered(weight_map: &mut Buffer2<f32>, coverage: &Buffer2<bool>) {
    for (w, &covered) in weight_map.pixels_mut().iter_mut().zip(coverage.iter()) {
        if !covered {
            *w = 0.0;
        }
    }
}

fn read_chunk(
    tensor: &OutOfCoreTensor,
    frames: usize,
    slot: usize,
    start_pixel: usize,
    len: usize,
) -> Vec<Vec<f32>> {
    (0..frames)
        .map(|frame| {
            let mut buf = vec![0.0f32; len];
            tensor.read_plane_range(frame, slot, start_pixel, &mut buf);
            buf
        })
        .collect()
}

/// `Σ(v·w) / Σw`, or the plain mean when the weights sum to zero.
fn weighted_mean(values: impl Iterator<Item = f32>, weights: impl Iterator<Item = f32>) -> f32 {
    let mut weighted_sum = 0.0f64;
    let mut weight_sum = 0.0f64;
    let mut plain_sum = 0.0f64;
    let mut count = 0usize;
    for (v, w) in values.zip(weights) {
        weighted_sum += v as f64 * w as f64;
        weight_sum += w as f64;
        plain_sum += v as f64;
        count += 1;
    }
    if weight_sum != 0.0 {
        (weighted_sum / weight_sum) as f32
    } else if count > 0 {
        (plain_sum / count as f64) as f32
    } else {
        0.0
    }
}
