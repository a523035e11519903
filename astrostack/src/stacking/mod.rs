//! Quality-weighted integration of registered frames.
//!
//! Frames are written once into an [`OutOfCoreTensor`] together with an
//! exposure-fusion weight map, then reduced into a single image by a
//! per-pixel weighted mean. Large runs spill the tensor to memory-mapped
//! files in [`TensorConfig::cache_dir`].

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod integrate;
pub(crate) mod progress;
pub(crate) mod tensor;
pub(crate) mod weights;

pub use config::{
    DEFAULT_MAX_ELEMENTS_PER_SHARD, IntegrationConfig, MEMORY_PERCENT, MIN_CHUNK_ROWS,
    QualityWeights, StorageMode, TensorConfig, compute_optimal_chunk_rows_with_memory,
};
pub use error::Error;
pub use integrate::{
    CoveredFrame, CoveredFrameSupplier, FrameIntegrator, FrameSupplier, integrate,
};
pub use progress::{ProgressCallback, StackingProgress, StackingStage};
pub use tensor::{
    MappedShard, MemoryShard, OutOfCoreTensor, Shard, ShardAddress, ShardLayout, TensorShape,
    TensorStorage,
};
pub use weights::quality_weights;
