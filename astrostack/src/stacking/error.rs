//! Error types for integration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::astro_image::ImageDimensions;

/// Fatal integration errors. Excluded frames are not errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No frames to integrate")]
    NoFrames,

    #[error("Failed to load frame {index}: {source}")]
    FrameLoad {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Dimension mismatch for frame {index}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        index: usize,
        expected: ImageDimensions,
        actual: ImageDimensions,
    },

    #[error("Invalid tensor shape: {frames} frames x {channels} channels x {pixels} pixels")]
    InvalidShape {
        frames: usize,
        channels: usize,
        pixels: usize,
    },

    #[error("Failed to create cache directory '{path}': {source}")]
    CreateCacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create shard file '{path}': {source}")]
    CreateShardFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to resize shard file '{path}': {source}")]
    ResizeShardFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to memory-map shard file '{path}': {source}")]
    MapShardFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove shard file '{path}': {source}")]
    RemoveShardFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_no_frames_error_message() {
        assert_eq!(Error::NoFrames.to_string(), "No frames to integrate");
    }

    #[test]
    fn test_frame_load_keeps_source_chain() {
        let err = Error::FrameLoad {
            index: 3,
            source: anyhow::anyhow!("decoder exploded"),
        };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains("decoder exploded"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_dimension_mismatch_error_message() {
        let err = Error::DimensionMismatch {
            index: 5,
            expected: ImageDimensions::new(100, 100, 3),
            actual: ImageDimensions::new(200, 100, 3),
        };
        let msg = err.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains("100"));
        assert!(msg.contains("200"));
    }

    #[test]
    fn test_create_shard_file_error_message() {
        let err = Error::CreateShardFile {
            path: PathBuf::from("/tmp/cache/shard-0.f32"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(err.to_string().contains("/tmp/cache/shard-0.f32"));
        assert!(err.to_string().contains("permission denied"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_map_shard_file_error_message() {
        let err = Error::MapShardFile {
            path: PathBuf::from("/tmp/cache/shard-1.f32"),
            source: io::Error::other("mmap failed"),
        };
        assert!(err.to_string().contains("mmap failed"));
    }
}
