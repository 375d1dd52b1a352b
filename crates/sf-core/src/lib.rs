//! sf-core: shared foundation for simfiles.
//!
//! Contains:
//! - path (regularized simulation-local paths)
//! - domain (inclusive `[min, max]` ranges used by reports and trees)

pub mod domain;
pub mod path;

// Re-exports: nice ergonomics for downstream crates
pub use domain::Domain;
pub use path::{ROOT_PATH, is_directory_path, record_path, regularize};
