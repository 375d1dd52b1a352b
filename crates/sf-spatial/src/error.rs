//! Error types for spatial report decoding.

use thiserror::Error;

/// Errors encountered while decoding a spatial report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpatialError {
    #[error("Truncated spatial report: need {needed} bytes, got {actual}")]
    Truncated { needed: u64, actual: usize },

    #[error("Override node ids do not match the report: expected {expected}, got {actual}")]
    NodeIdCountMismatch { expected: usize, actual: usize },

    #[error("Timestep labels overflow: offset {offset} with {timesteps} timesteps")]
    TimestepOverflow { offset: i64, timesteps: u32 },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
