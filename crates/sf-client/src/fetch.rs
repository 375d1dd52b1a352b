//! The fetcher collaborator: asynchronous URL retrieval supplied by the caller.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use thiserror::Error;

/// How the fetcher should hand back a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    Text,
    Json,
    ArrayBuffer,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseType::Text => "text",
            ResponseType::Json => "json",
            ResponseType::ArrayBuffer => "arraybuffer",
        };
        f.write_str(name)
    }
}

/// A fetched response body.
///
/// A fetcher may answer a `Json` request with `Text` when the server did not
/// send JSON (e.g. a login page); callers decide what that means.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn response_type(&self) -> ResponseType {
        match self {
            Payload::Text(_) => ResponseType::Text,
            Payload::Json(_) => ResponseType::Json,
            Payload::Bytes(_) => ResponseType::ArrayBuffer,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Payload::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url}: not found")]
    NotFound { url: String },

    #[error("{url}: {source}")]
    Io {
        url: String,
        source: std::io::Error,
    },

    #[error("{url}: invalid JSON: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("{url}: {what}")]
    Failed { url: String, what: String },
}

/// Asynchronous retrieval of one URL.
///
/// Transport, authentication and retry policy belong to the implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, response_type: ResponseType) -> Result<Payload, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, url: &str, response_type: ResponseType) -> Result<Payload, FetchError> {
        (**self).fetch(url, response_type).await
    }
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for &T {
    async fn fetch(&self, url: &str, response_type: ResponseType) -> Result<Payload, FetchError> {
        (**self).fetch(url, response_type).await
    }
}

/// Fetch every URL concurrently.
///
/// Results keep the order of `urls`; the first failure fails the whole batch.
pub async fn fetch_many<F, S>(
    fetcher: &F,
    urls: &[S],
    response_type: ResponseType,
) -> Result<Vec<Payload>, FetchError>
where
    F: Fetcher + ?Sized,
    S: AsRef<str>,
{
    try_join_all(urls.iter().map(|url| fetcher.fetch(url.as_ref(), response_type))).await
}
