//! File and directory records.

use serde::{Deserialize, Serialize};
use sf_core::record_path;

/// Kind of a file record, as named in provider listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    File,
    Directory,
    SymLinkFile,
    SymLinkDirectory,
}

impl FileKind {
    /// Directories and directory symlinks.
    pub fn is_directory(self) -> bool {
        matches!(self, FileKind::Directory | FileKind::SymLinkDirectory)
    }

    /// Files and file symlinks.
    pub fn is_file(self) -> bool {
        !self.is_directory()
    }
}

/// One file or directory of a simulation.
///
/// Records deserialize from (and serialize back to) the provider's PascalCase
/// listing shape. Directory kinds always carry a child list, possibly empty;
/// file kinds never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "RawFileRecord")]
pub struct FileRecord {
    pub(crate) id: String,
    #[serde(rename = "Type")]
    pub(crate) kind: FileKind,
    pub(crate) friendly_name: String,
    pub(crate) path_from_root: String,
    pub(crate) length: Option<u64>,
    pub(crate) mime_type: String,
    pub(crate) url: String,
    #[serde(rename = "MD5", skip_serializing_if = "Option::is_none")]
    pub(crate) checksum: Option<String>,
    #[serde(rename = "Items", skip_serializing_if = "Option::is_none")]
    pub(crate) children: Option<Vec<FileRecord>>,
}

/// Listing entry as delivered; any field but `Type` may be missing or null.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawFileRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "Type")]
    kind: FileKind,
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default)]
    path_from_root: Option<String>,
    #[serde(default)]
    length: Option<u64>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "MD5")]
    checksum: Option<String>,
    #[serde(default)]
    items: Option<Vec<FileRecord>>,
}

impl From<RawFileRecord> for FileRecord {
    fn from(raw: RawFileRecord) -> Self {
        let children = if raw.kind.is_directory() {
            Some(raw.items.unwrap_or_default())
        } else {
            None
        };
        Self {
            id: raw.id.unwrap_or_default(),
            kind: raw.kind,
            friendly_name: raw.friendly_name.unwrap_or_default(),
            path_from_root: raw.path_from_root.unwrap_or_default(),
            length: raw.length,
            mime_type: raw.mime_type.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            checksum: raw.checksum,
            children,
        }
    }
}

impl FileRecord {
    fn with_kind(kind: FileKind, friendly_name: String, children: Option<Vec<FileRecord>>) -> Self {
        Self {
            id: String::new(),
            kind,
            friendly_name,
            path_from_root: String::new(),
            length: None,
            mime_type: String::new(),
            url: String::new(),
            checksum: None,
            children,
        }
    }

    /// A plain file.
    pub fn new_file(friendly_name: impl Into<String>, length: Option<u64>) -> Self {
        let mut rec = Self::with_kind(FileKind::File, friendly_name.into(), None);
        rec.length = length;
        rec
    }

    /// A plain directory holding `children` in listing order.
    pub fn new_directory(friendly_name: impl Into<String>, children: Vec<FileRecord>) -> Self {
        Self::with_kind(FileKind::Directory, friendly_name.into(), Some(children))
    }

    /// A directory symlink with no resolved children (e.g. the `Assets` placeholder).
    pub fn new_symlink_directory(friendly_name: impl Into<String>) -> Self {
        Self::with_kind(FileKind::SymLinkDirectory, friendly_name.into(), Some(Vec::new()))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_path_from_root(mut self, path_from_root: impl Into<String>) -> Self {
        self.path_from_root = path_from_root.into();
        self
    }

    pub fn with_length(mut self, length: Option<u64>) -> Self {
        self.length = length;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Directory part of the path, relative to the tree root.
    pub fn path_from_root(&self) -> &str {
        &self.path_from_root
    }

    /// Size in bytes, if known.
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Provider URL of the file contents; empty if not fetchable.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Children in listing order (empty for files).
    pub fn children(&self) -> &[FileRecord] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Regularized path of this record, `/`-suffixed for directories.
    pub fn regularized_path(&self) -> String {
        record_path(&self.path_from_root, &self.friendly_name, self.is_directory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_listing_entry() {
        let rec: FileRecord = serde_json::from_value(json!({
            "Type": "File",
            "FriendlyName": "InsetChart.json",
            "PathFromRoot": "output",
            "Length": 2048,
            "MimeType": "application/json",
            "Url": "https://example/output/InsetChart.json",
            "Id": "abc"
        }))
        .unwrap();
        assert_eq!(rec.kind(), FileKind::File);
        assert_eq!(rec.length(), Some(2048));
        assert_eq!(rec.regularized_path(), "./output/InsetChart.json");
        assert!(rec.children().is_empty());
        assert!(rec.children.is_none());
    }

    #[test]
    fn nulls_default_and_directories_get_children() {
        let rec: FileRecord = serde_json::from_value(json!({
            "Type": "SymLinkDirectory",
            "FriendlyName": "Assets",
            "Url": null,
            "Length": null
        }))
        .unwrap();
        assert_eq!(rec.url(), "");
        assert_eq!(rec.length(), None);
        assert_eq!(rec.children, Some(Vec::new()));
        assert_eq!(rec.regularized_path(), "./Assets/");
    }

    #[test]
    fn file_items_are_dropped() {
        let rec: FileRecord = serde_json::from_value(json!({
            "Type": "SymLinkFile",
            "FriendlyName": "link.txt",
            "Items": [ { "Type": "File", "FriendlyName": "x" } ]
        }))
        .unwrap();
        assert!(rec.children.is_none());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let res: Result<FileRecord, _> =
            serde_json::from_value(json!({ "Type": "Socket", "FriendlyName": "s" }));
        assert!(res.is_err());
    }

    #[test]
    fn serializes_pascal_case() {
        let rec = FileRecord::new_directory("output", vec![FileRecord::new_file("a.txt", Some(3))]);
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["Type"], "Directory");
        assert_eq!(value["FriendlyName"], "output");
        assert_eq!(value["Items"][0]["Length"], 3);
        assert!(value["Items"][0].get("Items").is_none());
    }
}
