//! Tensor shape and linear-index to shard resolution.

use crate::stacking::error::Error;

/// Logical extent of a `[frame][slot][pixel]` tensor.
///
/// Each frame owns `channels + 1` slots: one per image channel followed by
/// the quality-weight plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorShape {
    pub frames: usize,
    pub channels: usize,
    pub pixels: usize,
}

impl TensorShape {
    /// Validated shape. Any zero extent is rejected.
    pub fn new(frames: usize, channels: usize, pixels: usize) -> Result<Self, Error> {
        if frames == 0 || channels == 0 || pixels == 0 {
            return Err(Error::InvalidShape {
                frames,
                channels,
                pixels,
            });
        }
        let shape = Self {
            frames,
            channels,
            pixels,
        };
        shape.checked_total().ok_or(Error::InvalidShape {
            frames,
            channels,
            pixels,
        })?;
        Ok(shape)
    }

    /// Slots per frame: every channel plus the weight plane.
    #[inline]
    pub fn slots(&self) -> usize {
        self.channels + 1
    }

    /// Slot holding the quality weight of a frame.
    #[inline]
    pub fn weight_slot(&self) -> usize {
        self.channels
    }

    /// Total element count.
    #[inline]
    pub fn total(&self) -> u64 {
        self.frames as u64 * self.slots() as u64 * self.pixels as u64
    }

    fn checked_total(&self) -> Option<u64> {
        (self.frames as u64)
            .checked_mul(self.slots() as u64)?
            .checked_mul(self.pixels as u64)
    }

    /// Linear index of `(frame, slot, pixel)`.
    #[inline]
    pub fn linear_index(&self, frame: usize, slot: usize, pixel: usize) -> u64 {
        debug_assert!(frame < self.frames, "frame {} out of range", frame);
        debug_assert!(slot < self.slots(), "slot {} out of range", slot);
        debug_assert!(pixel < self.pixels, "pixel {} out of range", pixel);
        ((frame as u64 * self.slots() as u64) + slot as u64) * self.pixels as u64 + pixel as u64
    }
}

/// Position of one element inside the shard list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardAddress {
    pub shard: usize,
    pub offset: usize,
}

/// Splits `total` elements into shards of at most `max_elements_per_shard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLayout {
    max_elements_per_shard: u64,
    total: u64,
}

impl ShardLayout {
    pub fn new(total: u64, max_elements_per_shard: u64) -> Self {
        assert!(
            max_elements_per_shard > 0,
            "max_elements_per_shard must be positive"
        );
        Self {
            max_elements_per_shard,
            total,
        }
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[inline]
    pub fn max_elements_per_shard(&self) -> u64 {
        self.max_elements_per_shard
    }

    /// `ceil(total / max_elements_per_shard)`.
    pub fn shard_count(&self) -> usize {
        self.total.div_ceil(self.max_elements_per_shard) as usize
    }

    /// Element count of `shard`. Only the last shard may be short.
    pub fn shard_len(&self, shard: usize) -> usize {
        let start = shard as u64 * self.max_elements_per_shard;
        debug_assert!(start < self.total, "shard {} out of range", shard);
        (self.total - start).min(self.max_elements_per_shard) as usize
    }

    #[inline]
    pub fn resolve(&self, linear: u64) -> ShardAddress {
        debug_assert!(linear < self.total, "index {} out of range", linear);
        ShardAddress {
            shard: (linear / self.max_elements_per_shard) as usize,
            offset: (linear % self.max_elements_per_shard) as usize,
        }
    }
}
