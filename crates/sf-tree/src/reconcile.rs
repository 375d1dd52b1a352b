//! Merge the primary listing and the asset collection listing into one tree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assets::{ASSETS_DIR_NAME, AssetCollectionListing, AssetDescriptor, AssetSubtreeBuilder};
use crate::record::{FileKind, FileRecord};
use crate::tree::FileTree;

/// Primary listing: `{Resources: [...]}`.
///
/// For a simulation without a finished job this is synthesized from the
/// simulation's input files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrimaryListing {
    #[serde(default)]
    pub resources: Vec<FileRecord>,
}

impl PrimaryListing {
    /// Inputs-only listing used when no job output exists.
    pub fn inputs_only(input_files: Vec<FileRecord>) -> Self {
        Self {
            resources: input_files,
        }
    }
}

/// What happened to the synthetic `Assets` subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSplice {
    /// Replaced the `Assets` placeholder.
    Spliced,
    /// No placeholder existed; the subtree was dropped.
    Orphaned { file_count: usize, bytes: u64 },
}

/// Root-level records ready to wrap in a [`FileTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub records: Vec<FileRecord>,
    pub assets: AssetSplice,
}

impl Reconciliation {
    pub fn into_tree(self) -> FileTree {
        FileTree::from_records(self.records)
    }
}

fn is_assets_placeholder(rec: &FileRecord) -> bool {
    rec.kind() == FileKind::SymLinkDirectory && rec.friendly_name() == ASSETS_DIR_NAME
}

/// Splice the asset subtree into the primary records.
///
/// The first top-level `SymLinkDirectory` named `Assets` is replaced by the
/// synthetic subtree, which takes over the placeholder's `path_from_root`.
/// Without a placeholder the subtree is not attached.
pub fn reconcile(primary: Vec<FileRecord>, assets: &[AssetDescriptor]) -> Reconciliation {
    let builder = AssetSubtreeBuilder::from_assets(assets);
    let mut records = primary;

    match records.iter().position(is_assets_placeholder) {
        Some(idx) => {
            let subtree = builder.build(records[idx].path_from_root());
            records[idx] = subtree;
            Reconciliation {
                records,
                assets: AssetSplice::Spliced,
            }
        }
        None => {
            let (file_count, bytes) = builder.file_stats();
            debug!(
                file_count,
                bytes, "no Assets placeholder in primary listing; asset subtree not attached"
            );
            Reconciliation {
                records,
                assets: AssetSplice::Orphaned { file_count, bytes },
            }
        }
    }
}

impl FileTree {
    /// Build the canonical tree for one simulation snapshot.
    pub fn from_listings(primary: PrimaryListing, assets: &AssetCollectionListing) -> Self {
        reconcile(primary.resources, assets.assets()).into_tree()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, length: u64, relative_path: &str) -> AssetDescriptor {
        AssetDescriptor {
            checksum: name.to_string(),
            file_name: name.to_string(),
            length,
            uri: String::new(),
            relative_path: Some(relative_path.to_string()),
        }
    }

    #[test]
    fn placeholder_is_replaced_in_place() {
        let primary = vec![
            FileRecord::new_file("before.txt", Some(1)),
            FileRecord::new_symlink_directory("Assets").with_path_from_root("."),
            FileRecord::new_file("after.txt", Some(2)),
        ];
        let out = reconcile(primary, &[descriptor("leaf.txt", 5, "sub")]);

        assert_eq!(out.assets, AssetSplice::Spliced);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].friendly_name(), "before.txt");
        assert_eq!(out.records[2].friendly_name(), "after.txt");

        let assets = &out.records[1];
        assert_eq!(assets.kind(), FileKind::Directory);
        assert_eq!(assets.path_from_root(), ".");
        assert_eq!(assets.length(), Some(5));
    }

    #[test]
    fn only_first_placeholder_is_replaced() {
        let primary = vec![
            FileRecord::new_symlink_directory("Assets"),
            FileRecord::new_symlink_directory("Assets"),
        ];
        let out = reconcile(primary, &[]);
        assert_eq!(out.records[0].kind(), FileKind::Directory);
        assert_eq!(out.records[1].kind(), FileKind::SymLinkDirectory);
    }

    #[test]
    fn plain_assets_directory_is_not_a_placeholder() {
        let primary = vec![FileRecord::new_directory("Assets", vec![])];
        let out = reconcile(primary, &[descriptor("x", 3, "")]);
        assert_eq!(
            out.assets,
            AssetSplice::Orphaned {
                file_count: 1,
                bytes: 3
            }
        );
    }

    #[test]
    fn empty_assets_still_fill_placeholder() {
        let out = reconcile(vec![FileRecord::new_symlink_directory("Assets")], &[]);
        assert_eq!(out.assets, AssetSplice::Spliced);
        assert_eq!(out.records[0].length(), Some(0));
    }
}
