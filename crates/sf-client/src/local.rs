//! Filesystem-backed fetcher for captured simulation snapshots.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::trace;

use crate::fetch::{FetchError, Fetcher, Payload, ResponseType};

/// Resolves URLs as paths below a root directory.
///
/// `file://` URLs are absolute paths; anything else (`./output/x.bin`,
/// `/output/x.bin`, `output/x.bin`) is taken relative to the root.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    root: PathBuf,
}

impl LocalFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path a URL resolves to.
    pub fn resolve(&self, url: &str) -> PathBuf {
        if let Some(absolute) = url.strip_prefix("file://") {
            return PathBuf::from(absolute);
        }
        let relative = url.trim_start_matches("./").trim_start_matches('/');
        self.root.join(relative)
    }
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self, url: &str, response_type: ResponseType) -> Result<Payload, FetchError> {
        let path = self.resolve(url);
        trace!(url, path = %path.display(), %response_type, "local fetch");

        let bytes = std::fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => FetchError::NotFound {
                url: url.to_string(),
            },
            _ => FetchError::Io {
                url: url.to_string(),
                source,
            },
        })?;

        match response_type {
            ResponseType::ArrayBuffer => Ok(Payload::Bytes(bytes)),
            ResponseType::Text => Ok(Payload::Text(String::from_utf8_lossy(&bytes).into_owned())),
            ResponseType::Json => serde_json::from_slice(&bytes)
                .map(Payload::Json)
                .map_err(|source| FetchError::Decode {
                    url: url.to_string(),
                    source,
                }),
        }
    }
}
