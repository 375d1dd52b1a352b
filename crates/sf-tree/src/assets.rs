//! Asset collection listings and the synthetic `Assets` subtree built from them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{FileKind, FileRecord};

/// Name of the synthetic directory that holds asset collection files.
pub const ASSETS_DIR_NAME: &str = "Assets";

/// Id given to the synthetic `Assets` directory.
pub const ASSETS_DIR_ID: &str = "AssetCollFolderId";

/// One file of an asset collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetDescriptor {
    #[serde(rename = "MD5Checksum", default)]
    pub checksum: String,
    pub file_name: String,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub uri: String,
    /// Backslash-separated directory below `Assets`; empty or absent for `Assets` itself.
    #[serde(default)]
    pub relative_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetCollection {
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
}

/// Asset collection listing: `{AssetCollections: [{Assets: [...]}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetCollectionListing {
    #[serde(default)]
    pub asset_collections: Vec<AssetCollection>,
}

impl AssetCollectionListing {
    /// Assets of the first collection; later collections are not used.
    pub fn assets(&self) -> &[AssetDescriptor] {
        self.asset_collections
            .first()
            .map(|ac| ac.assets.as_slice())
            .unwrap_or(&[])
    }
}

/// Directory under construction. The relative path only exists here.
#[derive(Debug)]
struct PendingDir {
    id: String,
    name: String,
    entries: Vec<Pending>,
}

#[derive(Debug)]
enum Pending {
    Dir(PendingDir),
    File(FileRecord),
}

impl PendingDir {
    fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            entries: Vec::new(),
        }
    }

    /// Walk to the child directory `name`, creating it if needed.
    fn child_dir(&mut self, name: &str) -> &mut PendingDir {
        let pos = self
            .entries
            .iter()
            .position(|e| matches!(e, Pending::Dir(d) if d.name == name));
        let idx = match pos {
            Some(idx) => idx,
            None => {
                let dir = PendingDir::new(Uuid::new_v4().to_string(), name.to_string());
                self.entries.push(Pending::Dir(dir));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[idx] {
            Pending::Dir(dir) => dir,
            Pending::File(_) => unreachable!("position matched a directory"),
        }
    }

    /// Freeze into a record, computing lengths bottom-up and paths top-down.
    fn finish(self, path_from_root: &str) -> FileRecord {
        let own_path = join(path_from_root, &self.name);
        let mut length = 0u64;
        let children: Vec<FileRecord> = self
            .entries
            .into_iter()
            .map(|entry| match entry {
                Pending::Dir(dir) => dir.finish(&own_path),
                Pending::File(file) => file.with_path_from_root(own_path.clone()),
            })
            .inspect(|child| length += child.length.unwrap_or(0))
            .collect();

        FileRecord {
            id: self.id,
            kind: FileKind::Directory,
            friendly_name: self.name,
            path_from_root: path_from_root.to_string(),
            length: Some(length),
            mime_type: String::new(),
            url: String::new(),
            checksum: None,
            children: Some(children),
        }
    }

    fn file_stats(&self) -> (usize, u64) {
        self.entries.iter().fold((0, 0), |(n, bytes), e| match e {
            Pending::Dir(d) => {
                let (dn, db) = d.file_stats();
                (n + dn, bytes + db)
            }
            Pending::File(f) => (n + 1, bytes + f.length.unwrap_or(0)),
        })
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Builds the synthetic `Assets` directory from a flat asset listing.
///
/// Each asset's relative path is split on `\`; directories along the way are
/// reused by name or created. Nothing is final until [`AssetSubtreeBuilder::build`].
#[derive(Debug)]
pub struct AssetSubtreeBuilder {
    root: PendingDir,
}

impl Default for AssetSubtreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetSubtreeBuilder {
    pub fn new() -> Self {
        Self {
            root: PendingDir::new(ASSETS_DIR_ID.to_string(), ASSETS_DIR_NAME.to_string()),
        }
    }

    /// Builder pre-filled with every descriptor, in order.
    pub fn from_assets(assets: &[AssetDescriptor]) -> Self {
        let mut builder = Self::new();
        for asset in assets {
            builder.add(asset);
        }
        builder
    }

    /// Place one asset below `Assets`.
    pub fn add(&mut self, asset: &AssetDescriptor) {
        let mut dir = &mut self.root;
        let relative = asset.relative_path.as_deref().unwrap_or("");
        if !relative.is_empty() {
            for part in relative.split('\\') {
                dir = dir.child_dir(part);
            }
        }

        let file = FileRecord::new_file(asset.file_name.clone(), Some(asset.length))
            .with_id(asset.checksum.clone())
            .with_checksum(asset.checksum.clone())
            .with_url(asset.uri.clone());
        dir.entries.push(Pending::File(file));
    }

    pub fn is_empty(&self) -> bool {
        self.root.entries.is_empty()
    }

    /// Number of files placed so far and their total size.
    pub fn file_stats(&self) -> (usize, u64) {
        self.root.file_stats()
    }

    /// Finish the subtree. `path_from_root` is the directory that will hold `Assets`.
    pub fn build(self, path_from_root: &str) -> FileRecord {
        self.root.finish(path_from_root)
    }
}
