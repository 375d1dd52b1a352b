//! The canonical, path-addressable file tree of a simulation.

use std::collections::HashSet;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::OnceLock;

use sf_core::{ROOT_PATH, is_directory_path, regularize};

use crate::record::FileRecord;

/// Flat path listings, built together on first use.
#[derive(Debug, Clone)]
struct Listings {
    /// Sorted; includes `./` and every directory.
    with_dirs: Vec<String>,
    /// Files only, in traversal order.
    files_only: Vec<String>,
}

/// Immutable tree of [`FileRecord`]s under a synthetic `/` root.
#[derive(Debug, Clone)]
pub struct FileTree {
    root: FileRecord,
    listings: OnceLock<Listings>,
}

impl FileTree {
    /// Argument for [`FileTree::traverse`] and [`FileTree::file_list`].
    pub const WITH_DIRS: bool = true;
    pub const NO_DIRS: bool = false;

    /// Wrap root-level records under a synthetic `/` directory.
    pub fn from_records(records: Vec<FileRecord>) -> Self {
        let root = FileRecord::new_directory("/", records)
            .with_id("/")
            .with_mime_type("none/none");
        Self {
            root,
            listings: OnceLock::new(),
        }
    }

    pub fn root(&self) -> &FileRecord {
        &self.root
    }

    /// Depth-first walk below the root.
    ///
    /// At each directory level every file (and file symlink) is visited first,
    /// in listing order. Then each directory is visited (only if
    /// `include_directories`) and immediately descended into. Returning
    /// `ControlFlow::Break` from the visitor stops the whole walk.
    pub fn traverse<'a, F>(&'a self, mut visitor: F, include_directories: bool)
    where
        F: FnMut(&'a FileRecord) -> ControlFlow<()>,
    {
        let _ = walk(self.root.children(), &mut visitor, include_directories);
    }

    /// True if the regularized `path` is a file or directory of this tree.
    ///
    /// Directories only match in their `/`-suffixed form.
    pub fn contains(&self, path: &str) -> bool {
        let path = regularize(path);
        self.listings()
            .with_dirs
            .binary_search_by(|p| p.as_str().cmp(path.as_str()))
            .is_ok()
    }

    /// First record (in traversal order) at `path`.
    ///
    /// A `/`-suffixed path looks for a directory, anything else for a file.
    pub fn find_file_record(&self, path: &str) -> Option<&FileRecord> {
        let target = regularize(path);
        if target == ROOT_PATH {
            return Some(&self.root);
        }
        let want_dir = is_directory_path(&target);

        let mut found = None;
        self.traverse(
            |rec| {
                if rec.is_directory() == want_dir && rec.regularized_path() == target {
                    found = Some(rec);
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
            want_dir,
        );
        found
    }

    /// Flat listing of regularized paths.
    ///
    /// With directories the listing is sorted and starts from `./`; without,
    /// it holds files in traversal order.
    pub fn file_list(&self, include_directories: bool) -> &[String] {
        let listings = self.listings();
        if include_directories {
            &listings.with_dirs
        } else {
            &listings.files_only
        }
    }

    /// Keep only the candidates that name files of this tree.
    ///
    /// Order and duplicates are preserved; directory paths are dropped.
    pub fn validate_file_list<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<String> {
        let files: HashSet<&str> = self.file_list(Self::NO_DIRS).iter().map(String::as_str).collect();
        candidates
            .iter()
            .map(|c| regularize(c.as_ref()))
            .filter(|p| !is_directory_path(p) && files.contains(p.as_str()))
            .collect()
    }

    /// Files whose path contains `SpatialReport`.
    pub fn spatial_report_list(&self) -> Vec<&str> {
        self.file_list(Self::NO_DIRS)
            .iter()
            .map(String::as_str)
            .filter(|p| p.contains("SpatialReport"))
            .collect()
    }

    /// `(file_count, total_bytes)` over files only.
    pub fn count(&self) -> (usize, u64) {
        let mut files = 0usize;
        let mut bytes = 0u64;
        self.traverse(
            |rec| {
                files += 1;
                bytes += rec.length().unwrap_or(0);
                ControlFlow::Continue(())
            },
            Self::NO_DIRS,
        );
        (files, bytes)
    }

    fn listings(&self) -> &Listings {
        self.listings.get_or_init(|| {
            let mut with_dirs = vec![ROOT_PATH.to_string()];
            let mut files_only = Vec::new();
            self.traverse(
                |rec| {
                    let path = rec.regularized_path();
                    if !rec.is_directory() {
                        files_only.push(path.clone());
                    }
                    with_dirs.push(path);
                    ControlFlow::Continue(())
                },
                Self::WITH_DIRS,
            );
            with_dirs.sort();
            Listings {
                with_dirs,
                files_only,
            }
        })
    }
}

fn walk<'a, F>(items: &'a [FileRecord], visitor: &mut F, include_directories: bool) -> ControlFlow<()>
where
    F: FnMut(&'a FileRecord) -> ControlFlow<()>,
{
    for rec in items.iter().filter(|r| r.kind().is_file()) {
        visitor(rec)?;
    }
    for dir in items.iter().filter(|r| r.kind().is_directory()) {
        if include_directories {
            visitor(dir)?;
        }
        walk(dir.children(), visitor, include_directories)?;
    }
    ControlFlow::Continue(())
}

impl fmt::Display for FileTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (files, bytes) = self.count();
        write!(f, "[FileTree: {files} files, {bytes} bytes]")
    }
}

impl From<Vec<FileRecord>> for FileTree {
    fn from(records: Vec<FileRecord>) -> Self {
        Self::from_records(records)
    }
}
