//! Client configuration: provider endpoint and verbosity.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_BASE_URL: &str = "https://comps.idmod.org";
pub const DEV_BASE_URL: &str = "https://comps-dev.idmod.org";

/// Client settings, loadable from YAML or JSON.
///
/// ```yaml
/// base_url: https://comps.idmod.org
/// verbose: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            verbose: false,
        }
    }
}

impl ClientConfig {
    /// Development endpoint.
    pub fn dev() -> Self {
        Self {
            base_url: DEV_BASE_URL.to_string(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = clean_base_url(base_url);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn from_yaml_str(content: &str) -> ClientResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.finish()
    }

    pub fn from_json_str(content: &str) -> ClientResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.finish()
    }

    /// Load from a file; `.json` is read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Reject anything but an absolute http(s) base URL.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ClientError::Config {
                what: format!("base_url must be http or https, got {other}"),
            }),
        }
    }

    fn finish(mut self) -> ClientResult<Self> {
        self.base_url = clean_base_url(&self.base_url);
        self.validate()?;
        Ok(self)
    }
}

/// Strip one trailing `/`, then a trailing `/api`.
pub fn clean_base_url(url: &str) -> String {
    let url = url.trim();
    let url = url.strip_suffix('/').unwrap_or(url);
    let url = url.strip_suffix("/api").unwrap_or(url);
    url.to_string()
}
