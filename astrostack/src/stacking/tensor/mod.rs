//! Out-of-core `[frame][channel + weight][pixel]` f32 tensor.
//!
//! Elements are addressed by one `u64` linear index and split across shards
//! of bounded size, kept on the heap or in memory-mapped temporary files.

mod layout;
mod shard;


pub use layout::{ShardAddress, ShardLayout, TensorShape};
pub use shard::{MappedShard, MemoryShard, Shard};

use crate::stacking::config::{StorageMode, TensorConfig, fits_in_memory};
use crate::stacking::error::Error;

/// Storage actually chosen for a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TensorStorage {
    InMemory,
    Mapped,
}

pub struct OutOfCoreTensor {
    shape: TensorShape,
    layout: ShardLayout,
    storage: TensorStorage,
    shards: Vec<Box<dyn Shard>>,
}

impl std::fmt::Debug for OutOfCoreTensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutOfCoreTensor")
            .field("shape", &self.shape)
            .field("layout", &self.layout)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl OutOfCoreTensor {
    /// Allocate a zeroed tensor. Fails if the shard files cannot be created
    /// or mapped; already created shards are removed again.
    pub fn new(shape: TensorShape, config: &TensorConfig) -> Result<Self, Error> {
        config.validate();

        let layout = ShardLayout::new(shape.total(), config.max_elements_per_shard);
        let storage = choose_storage(&layout, config);

        tracing::info!(
            frames = shape.frames,
            channels = shape.channels,
            pixels = shape.pixels,
            total_elements = layout.total(),
            shards = layout.shard_count(),
            %storage,
            "Allocating integration tensor"
        );

        let shard_count = layout.shard_count();
        let mut shards: Vec<Box<dyn Shard>> = Vec::with_capacity(shard_count);
        match storage {
            TensorStorage::InMemory => {
                for shard in 0..shard_count {
                    shards.push(Box::new(MemoryShard::zeroed(layout.shard_len(shard))));
                }
            }
            TensorStorage::Mapped => {
                let cache_dir = &config.cache_dir;
                std::fs::create_dir_all(cache_dir).map_err(|e| Error::CreateCacheDir {
                    path: cache_dir.to_path_buf(),
                    source: e,
                })?;
                for shard in 0..shard_count {
                    let mapped = MappedShard::create(cache_dir, shard, layout.shard_len(shard))?;
                    tracing::debug!(shard, path = %mapped.path().display(), "Mapped shard file");
                    shards.push(Box::new(mapped));
                }
            }
        }

        Ok(Self {
            shape,
            layout,
            storage,
            shards,
        })
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    pub fn layout(&self) -> ShardLayout {
        self.layout
    }

    pub fn storage(&self) -> TensorStorage {
        self.storage
    }

    #[inline]
    pub fn get(&self, frame: usize, slot: usize, pixel: usize) -> f32 {
        self.get_linear(self.shape.linear_index(frame, slot, pixel))
    }

    #[inline]
    pub fn set(&mut self, frame: usize, slot: usize, pixel: usize, value: f32) {
        let linear = self.shape.linear_index(frame, slot, pixel);
        self.set_linear(linear, value);
    }

    #[inline]
    pub fn get_linear(&self, linear: u64) -> f32 {
        let addr = self.layout.resolve(linear);
        self.shards[addr.shard].as_slice()[addr.offset]
    }

    #[inline]
    pub fn set_linear(&mut self, linear: u64, value: f32) {
        let addr = self.layout.resolve(linear);
        self.shards[addr.shard].as_mut_slice()[addr.offset] = value;
    }

    /// Copy a whole plane into `(frame, slot)`, crossing shard boundaries as
    /// needed.
    pub fn write_plane(&mut self, frame: usize, slot: usize, data: &[f32]) {
        assert_eq!(
            data.len(),
            self.shape.pixels,
            "plane length must equal pixel count"
        );
        let mut linear = self.shape.linear_index(frame, slot, 0);
        let mut rest = data;
        while !rest.is_empty() {
            let addr = self.layout.resolve(linear);
            let dst = &mut self.shards[addr.shard].as_mut_slice()[addr.offset..];
            let n = dst.len().min(rest.len());
            dst[..n].copy_from_slice(&rest[..n]);
            rest = &rest[n..];
            linear += n as u64;
        }
    }

    /// Fill `out` with the pixels of `(frame, slot)` starting at
    /// `start_pixel`.
    pub fn read_plane_range(&self, frame: usize, slot: usize, start_pixel: usize, out: &mut [f32]) {
        assert!(
            start_pixel + out.len() <= self.shape.pixels,
            "pixel range {}..{} exceeds plane of {}",
            start_pixel,
            start_pixel + out.len(),
            self.shape.pixels
        );
        if out.is_empty() {
            return;
        }
        let mut linear = self.shape.linear_index(frame, slot, start_pixel);
        let mut filled = 0;
        while filled < out.len() {
            let addr = self.layout.resolve(linear);
            let src = &self.shards[addr.shard].as_slice()[addr.offset..];
            let n = src.len().min(out.len() - filled);
            out[filled..filled + n].copy_from_slice(&src[..n]);
            filled += n;
            linear += n as u64;
        }
    }

    /// Release every shard. Keeps closing after a failure and returns the
    /// first error.
    pub fn close(self) -> Result<(), Error> {
        let mut first_error = None;
        for shard in self.shards {
            if let Err(e) = shard.close() {
                tracing::warn!(error = %e, "Failed to close tensor shard");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn choose_storage(layout: &ShardLayout, config: &TensorConfig) -> TensorStorage {
    match config.storage {
        StorageMode::InMemory => TensorStorage::InMemory,
        StorageMode::Mapped => TensorStorage::Mapped,
        StorageMode::Auto => {
            if layout.shard_count() <= 1
                && fits_in_memory(layout.total(), config.get_available_memory())
            {
                TensorStorage::InMemory
            } else {
                TensorStorage::Mapped
            }
        }
    }
}
