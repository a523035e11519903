//! Shard storage backends.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::MmapMut;

use crate::stacking::error::Error;

/// Contiguous f32 storage for one slice of the tensor.
pub trait Shard: Send + Sync {
    fn as_slice(&self) -> &[f32];

    fn as_mut_slice(&mut self) -> &mut [f32];

    /// Release the storage, reporting any cleanup failure.
    fn close(self: Box<Self>) -> Result<(), Error>;
}

// =============================================================================
// Memory
// =============================================================================

/// Heap-backed shard.
#[derive(Debug)]
pub struct MemoryShard(Vec<f32>);

impl MemoryShard {
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0.0; len])
    }
}

impl Shard for MemoryShard {
    fn as_slice(&self) -> &[f32] {
        &self.0
    }

    fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.0
    }

    fn close(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}

// =============================================================================
// Memory-mapped file
// =============================================================================

static SHARD_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Shard backed by a memory-mapped temporary file in the cache directory.
///
/// The file is created exclusively, so two tensors never share a file. It is
/// removed on [`Shard::close`], or on drop if close was never called.
#[derive(Debug)]
pub struct MappedShard {
    // Dropped before the file so the mapping is released first.
    mmap: Option<MmapMut>,
    path: PathBuf,
    removed: bool,
}

impl MappedShard {
    pub fn create(cache_dir: &Path, shard: usize, len: usize) -> Result<Self, Error> {
        let path = cache_dir.join(shard_file_name(shard));

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::CreateShardFile {
                path: path.clone(),
                source: e,
            })?;

        // From here on the file exists: drop removes it on any failure.
        let mut shard = Self {
            mmap: None,
            path,
            removed: false,
        };
        shard.mmap = Some(map_file(&file, &shard.path, len)?);
        Ok(shard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn remove_file(&mut self) -> Result<(), Error> {
        self.mmap = None;
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        std::fs::remove_file(&self.path).map_err(|e| Error::RemoveShardFile {
            path: self.path.clone(),
            source: e,
        })
    }
}

fn shard_file_name(shard: usize) -> String {
    let counter = SHARD_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("astrostack-{}-{}-{}.f32", std::process::id(), counter, shard)
}

fn map_file(file: &File, path: &Path, len: usize) -> Result<MmapMut, Error> {
    let bytes = (len * size_of::<f32>()) as u64;
    file.set_len(bytes).map_err(|e| Error::ResizeShardFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    // SAFETY: the file was created exclusively by this process and is only
    // reachable through this mapping until it is removed.
    unsafe {
        MmapMut::map_mut(file).map_err(|e| Error::MapShardFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl Shard for MappedShard {
    fn as_slice(&self) -> &[f32] {
        match &self.mmap {
            Some(mmap) => bytemuck::cast_slice(&mmap[..]),
            None => &[],
        }
    }

    fn as_mut_slice(&mut self) -> &mut [f32] {
        match &mut self.mmap {
            Some(mmap) => bytemuck::cast_slice_mut(&mut mmap[..]),
            None => &mut [],
        }
    }

    fn close(mut self: Box<Self>) -> Result<(), Error> {
        self.remove_file()
    }
}

impl Drop for MappedShard {
    fn drop(&mut self) {
        if let Err(e) = self.remove_file() {
            tracing::warn!(error = %e, "Failed to remove shard file");
        }
    }
}
