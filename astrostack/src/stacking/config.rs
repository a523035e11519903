//! Integration configuration and memory budgeting.
//!
//! The tensor and the reduction pass size themselves against
//! [`MEMORY_PERCENT`] of the available memory, leaving headroom for the OS
//! and for the decoded frames in flight.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Minimum chunk rows to avoid excessive I/O overhead.
pub const MIN_CHUNK_ROWS: usize = 64;

/// Percentage of available memory to use for tensor data.
pub const MEMORY_PERCENT: u64 = 75;

/// Largest shard, in f32 elements: the byte size must stay addressable by a
/// signed 32-bit offset.
pub const DEFAULT_MAX_ELEMENTS_PER_SHARD: u64 = (i32::MAX as u64) / 4;

// =============================================================================
// Quality weights
// =============================================================================

/// Coefficients of the per-pixel quality weight
/// `contrast·C + saturation·S + exposure·E^0.2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub contrast: f32,
    pub saturation: f32,
    pub exposure: f32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            saturation: 1.0,
            exposure: 1.0,
        }
    }
}

impl QualityWeights {
    pub fn validate(&self) {
        for (name, value) in [
            ("contrast", self.contrast),
            ("saturation", self.saturation),
            ("exposure", self.exposure),
        ] {
            assert!(
                value.is_finite() && value >= 0.0,
                "{} weight must be finite and non-negative, got {}",
                name,
                value
            );
        }
    }
}

// =============================================================================
// Tensor storage
// =============================================================================

/// Where tensor shards live.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
pub enum StorageMode {
    /// In memory when the whole tensor fits one shard and the memory budget,
    /// memory-mapped files otherwise.
    #[default]
    Auto,
    InMemory,
    Mapped,
}

/// Out-of-core tensor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorConfig {
    pub storage: StorageMode,
    /// Directory for shard files.
    pub cache_dir: PathBuf,
    /// Shard capacity in f32 elements.
    pub max_elements_per_shard: u64,
    /// Available memory override in bytes. If None, queries the system.
    pub available_memory: Option<u64>,
}

impl Default for TensorConfig {
    fn default() -> Self {
        Self {
            storage: StorageMode::Auto,
            cache_dir: std::env::temp_dir().join("astrostack_cache"),
            max_elements_per_shard: DEFAULT_MAX_ELEMENTS_PER_SHARD,
            available_memory: None,
        }
    }
}

impl TensorConfig {
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            ..Default::default()
        }
    }

    pub fn validate(&self) {
        assert!(
            self.max_elements_per_shard > 0,
            "max_elements_per_shard must be positive"
        );
        assert!(
            self.max_elements_per_shard <= DEFAULT_MAX_ELEMENTS_PER_SHARD,
            "max_elements_per_shard must be at most {}, got {}",
            DEFAULT_MAX_ELEMENTS_PER_SHARD,
            self.max_elements_per_shard
        );
    }

    /// Available memory - uses override if set, otherwise queries system.
    pub fn get_available_memory(&self) -> u64 {
        self.available_memory.unwrap_or_else(get_available_memory)
    }
}

// =============================================================================
// Integration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub weights: QualityWeights,
    pub tensor: TensorConfig,
    /// Frames loaded and weighted concurrently. 1 keeps everything on the
    /// calling thread.
    pub parallel_frames: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            tensor: TensorConfig::default(),
            parallel_frames: 1,
        }
    }
}

impl IntegrationConfig {
    pub fn validate(&self) {
        self.weights.validate();
        self.tensor.validate();
        assert!(
            self.parallel_frames > 0,
            "parallel_frames must be positive"
        );
    }
}

// =============================================================================
// Memory budgeting
// =============================================================================

/// Get available system memory in bytes.
fn get_available_memory() -> u64 {
    use sysinfo::System;

    let mut sys = System::new();
    sys.refresh_memory();
    sys.available_memory()
}

/// Whether `elements` f32 values fit in the usable share of `available_memory`.
pub(crate) fn fits_in_memory(elements: u64, available_memory: u64) -> bool {
    let Some(bytes) = elements.checked_mul(size_of::<f32>() as u64) else {
        return false;
    };
    bytes <= available_memory / 100 * MEMORY_PERCENT
}

/// Rows per reduction chunk so that `planes_per_frame` planes of every frame
/// fit the memory budget. Never below [`MIN_CHUNK_ROWS`].
pub fn compute_optimal_chunk_rows_with_memory(
    width: usize,
    planes_per_frame: usize,
    frame_count: usize,
    available_memory: u64,
) -> usize {
    let usable_memory = available_memory / 100 * MEMORY_PERCENT;

    let bytes_per_row = width
        .checked_mul(planes_per_frame)
        .and_then(|v| v.checked_mul(size_of::<f32>()))
        .and_then(|v| v.checked_mul(frame_count))
        .map(|v| v as u64)
        .unwrap_or(u64::MAX);

    if bytes_per_row == 0 {
        return MIN_CHUNK_ROWS;
    }

    let chunk_rows = ((usable_memory / bytes_per_row) as usize).max(MIN_CHUNK_ROWS);

    tracing::debug!(
        available_memory_mb = available_memory / (1024 * 1024),
        width,
        planes_per_frame,
        frame_count,
        bytes_per_row,
        chunk_rows,
        "Reduction chunk sizing computed"
    );

    chunk_rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tensor_config() {
        let config = TensorConfig::default();
        assert!(config.cache_dir.ends_with("astrostack_cache"));
        assert_eq!(config.max_elements_per_shard, 536_870_911);
        assert_eq!(config.storage, StorageMode::Auto);
    }

    #[test]
    fn test_fits_in_memory_uses_budget() {
        // 100 elements = 400 bytes; 75% of 600 = 450.
        assert!(fits_in_memory(100, 600));
        // 75% of 500 = 375 < 400.
        assert!(!fits_in_memory(100, 500));
        assert!(!fits_in_memory(u64::MAX, u64::MAX));
    }

    #[test]
    fn test_chunk_rows_typical() {
        let available = 8 * 1024 * 1024 * 1024u64;
        let rows = compute_optimal_chunk_rows_with_memory(6000, 2, 20, available);
        let bytes_per_row = 6000u64 * 2 * 4 * 20;
        let expected = (available / 100 * MEMORY_PERCENT / bytes_per_row) as usize;
        assert_eq!(rows, expected.max(MIN_CHUNK_ROWS));
    }

    #[test]
    fn test_chunk_rows_floor() {
        assert_eq!(
            compute_optimal_chunk_rows_with_memory(8000, 2, 500, 1024),
            MIN_CHUNK_ROWS
        );
        assert_eq!(compute_optimal_chunk_rows_with_memory(0, 2, 5, 1024), MIN_CHUNK_ROWS);
    }

    #[test]
    fn test_storage_mode_parses() {
        assert_eq!("Mapped".parse::<StorageMode>().unwrap(), StorageMode::Mapped);
        assert_eq!(StorageMode::InMemory.to_string(), "InMemory");
    }

    #[test]
    fn test_config_serde_roundtrip_uses_defaults() {
        let config: IntegrationConfig =
            serde_json::from_str(r#"{"parallel_frames": 4, "weights": {"contrast": 0.5}}"#)
                .unwrap();
        assert_eq!(config.parallel_frames, 4);
        assert_eq!(config.weights.contrast, 0.5);
        assert_eq!(config.weights.exposure, 1.0);
        assert_eq!(config.tensor, TensorConfig::default());
    }

    #[test]
    #[should_panic(expected = "parallel_frames must be positive")]
    fn test_validate_rejects_zero_parallel_frames() {
        IntegrationConfig {
            parallel_frames: 0,
            ..Default::default()
        }
        .validate();
    }
}
