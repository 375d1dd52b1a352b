//! Bulk decode of every spatial report in a tree.

use std::collections::BTreeMap;

use sf_spatial::{DecodeOptions, SpatialBinary};
use sf_tree::{FileRecord, FileTree};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::fetch::{Fetcher, Payload, ResponseType, fetch_many};

/// URL a record's contents are fetched from.
///
/// Records without a provider URL fall back to their regularized path, which
/// a [`crate::LocalFetcher`] resolves against its root.
pub fn source_url(rec: &FileRecord) -> String {
    if rec.url().is_empty() {
        rec.regularized_path()
    } else {
        rec.url().to_string()
    }
}

/// Fetch and decode every `SpatialReport` file of `tree`, keyed by path.
///
/// All files are fetched concurrently; any fetch or decode failure fails the
/// whole load.
pub async fn load_spatial_reports<F>(
    tree: &FileTree,
    fetcher: &F,
) -> ClientResult<BTreeMap<String, SpatialBinary>>
where
    F: Fetcher + ?Sized,
{
    let paths = tree.spatial_report_list();
    let urls = paths
        .iter()
        .map(|path| {
            tree.find_file_record(path)
                .map(source_url)
                .ok_or_else(|| ClientError::NotFound {
                    path: path.to_string(),
                })
        })
        .collect::<ClientResult<Vec<_>>>()?;
    debug!(count = urls.len(), "loading spatial reports");

    let payloads = fetch_many(fetcher, &urls, ResponseType::ArrayBuffer).await?;

    let mut reports = BTreeMap::new();
    for ((path, url), payload) in paths.into_iter().zip(urls).zip(payloads) {
        let Payload::Bytes(bytes) = payload else {
            return Err(ClientError::UnexpectedPayload {
                url,
                expected: ResponseType::ArrayBuffer,
            });
        };
        let report = SpatialBinary::decode(path, &bytes, &DecodeOptions::default()).map_err(
            |source| ClientError::Spatial {
                path: path.to_string(),
                source,
            },
        )?;
        reports.insert(path.to_string(), report);
    }
    Ok(reports)
}
