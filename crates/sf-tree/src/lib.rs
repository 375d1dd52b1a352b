//! sf-tree: canonical file tree of a simulation.
//!
//! Provides:
//! - `FileRecord` / `FileKind`, the provider's file listing entries
//! - `AssetSubtreeBuilder`, turning the flat asset collection listing into a
//!   nested `Assets` directory
//! - `reconcile`, splicing that directory into the primary listing
//! - `FileTree`, traversal, lookup and listings over the result
//!
//! # Example
//!
//! ```
//! use sf_tree::{FileTree, parse_asset_listing, parse_primary_listing};
//!
//! let primary = parse_primary_listing(r#"{"Resources": [
//!     {"Type": "SymLinkDirectory", "FriendlyName": "Assets"},
//!     {"Type": "File", "FriendlyName": "config.json", "Length": 120}
//! ]}"#).unwrap();
//! let assets = parse_asset_listing(r#"{"AssetCollections": [{"Assets": [
//!     {"MD5Checksum": "c0ffee", "FileName": "leaf.txt", "Length": 5, "Uri": "", "RelativePath": "sub"}
//! ]}]}"#).unwrap();
//!
//! let tree = FileTree::from_listings(primary, &assets);
//! assert!(tree.contains("./Assets/sub/leaf.txt"));
//! assert_eq!(tree.count(), (2, 125));
//! ```

pub mod assets;
pub mod error;
pub mod reconcile;
pub mod record;
pub mod tree;

// Re-exports for ergonomics
pub use assets::{
    ASSETS_DIR_ID, ASSETS_DIR_NAME, AssetCollection, AssetCollectionListing, AssetDescriptor,
    AssetSubtreeBuilder,
};
pub use error::{TreeError, TreeResult};
pub use reconcile::{AssetSplice, PrimaryListing, Reconciliation, reconcile};
pub use record::{FileKind, FileRecord};
pub use tree::FileTree;

/// Parse a primary listing (`{Resources: [...]}`).
pub fn parse_primary_listing(json: &str) -> TreeResult<PrimaryListing> {
    Ok(serde_json::from_str(json)?)
}

/// Parse an asset collection listing (`{AssetCollections: [{Assets: [...]}]}`).
pub fn parse_asset_listing(json: &str) -> TreeResult<AssetCollectionListing> {
    Ok(serde_json::from_str(json)?)
}
