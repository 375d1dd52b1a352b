//! Tree-specific error types.

use thiserror::Error;

/// Errors raised while reading listings.
///
/// Lookups never fail; a missing path is `None` or an empty listing.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Listing JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TreeResult<T> = Result<T, TreeError>;
