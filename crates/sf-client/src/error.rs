//! Error types for the sf-client orchestration layer.

use sf_spatial::SpatialError;
use sf_tree::TreeError;

use crate::fetch::{FetchError, ResponseType};

/// Client error type wrapping fetcher, listing and decode failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Request rejected: {what}")]
    Rejected { what: String },

    #[error("No simulation found with id {sim_id}")]
    NoSimulation { sim_id: String },

    #[error("File not found in simulation tree: {path}")]
    NotFound { path: String },

    #[error("Expected {expected} payload from {url}")]
    UnexpectedPayload { url: String, expected: ResponseType },

    #[error("Configuration error: {what}")]
    Config { what: String },

    #[error("Spatial report {path}: {source}")]
    Spatial { path: String, source: SpatialError },

    #[error("Listing error: {0}")]
    Tree(#[from] TreeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for sf-client operations.
pub type ClientResult<T> = Result<T, ClientError>;
