//! Simulation metadata: provider JSON models and the providers that fetch them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sf_tree::{AssetCollectionListing, FileRecord, PrimaryListing};
use tracing::{debug, error};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::fetch::{Fetcher, Payload, ResponseType};

/// Job state of a completed HPC job.
pub const FINISHED: &str = "Finished";

/// Answer to a simulation info request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimulationsResponse {
    #[serde(default)]
    pub simulations: Vec<SimInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub simulation_state: Option<String>,
    /// Input files; the listing used when no job finished.
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(rename = "HPCJobs", default)]
    pub hpc_jobs: Vec<HpcJob>,
}

impl SimInfo {
    /// First job that reached the `Finished` state.
    pub fn finished_job(&self) -> Option<&HpcJob> {
        self.hpc_jobs.iter().find(|job| job.job_state == FINISHED)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HpcJob {
    pub id: String,
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub job_state: String,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub configuration: JobConfiguration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobConfiguration {
    #[serde(default)]
    pub asset_collection_id: Option<String>,
    #[serde(default)]
    pub simulation_input_args: Option<String>,
}

/// Source of simulation info and the two listings a tree is built from.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn simulation_info(&self, sim_id: &str) -> ClientResult<SimulationsResponse>;

    /// Output listing of one finished job.
    async fn output_listing(&self, sim_id: &str, job: &HpcJob) -> ClientResult<PrimaryListing>;

    async fn asset_listing(&self, asset_collection_id: &str) -> ClientResult<AssetCollectionListing>;
}

/// Provider backed by the COMPS REST endpoints, through a caller-supplied fetcher.
#[derive(Debug, Clone)]
pub struct CompsMetadata<F> {
    config: ClientConfig,
    fetcher: F,
}

impl<F: Fetcher> CompsMetadata<F> {
    pub fn new(config: ClientConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|()| ClientError::Config {
                what: format!("base_url cannot be a base: {}", self.config.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    pub fn simulation_info_url(&self, sim_id: &str) -> ClientResult<Url> {
        self.endpoint(
            &["api", "Simulations", sim_id],
            &[("format", "json"), ("children", "files,hpcjobs")],
        )
    }

    pub fn output_listing_url(&self, sim_id: &str, job: &HpcJob) -> ClientResult<Url> {
        self.endpoint(
            &["asset", "Simulations", sim_id, "output", ""],
            &[
                ("hpcjobid", job.id.as_str()),
                ("format", "json"),
                ("followSymLinks", "0"),
                ("flatten", "0"),
                ("zip", "0"),
            ],
        )
    }

    pub fn asset_listing_url(&self, asset_collection_id: &str) -> ClientResult<Url> {
        self.endpoint(
            &["api", "AssetCollections", asset_collection_id, ""],
            &[("children", "assets"), ("format", "json")],
        )
    }

    async fn fetch_json(&self, url: Url) -> ClientResult<serde_json::Value> {
        debug!(%url, "metadata request");
        match self.fetcher.fetch(url.as_str(), ResponseType::Json).await? {
            Payload::Json(value) => Ok(value),
            Payload::Text(body) => {
                error!(%url, "provider answered with text instead of JSON; session may have expired");
                Err(ClientError::Rejected {
                    what: format!("{url}: {}", body.chars().take(80).collect::<String>()),
                })
            }
            Payload::Bytes(_) => Err(ClientError::UnexpectedPayload {
                url: url.to_string(),
                expected: ResponseType::Json,
            }),
        }
    }
}

#[async_trait]
impl<F: Fetcher> MetadataProvider for CompsMetadata<F> {
    async fn simulation_info(&self, sim_id: &str) -> ClientResult<SimulationsResponse> {
        let value = self.fetch_json(self.simulation_info_url(sim_id)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn output_listing(&self, sim_id: &str, job: &HpcJob) -> ClientResult<PrimaryListing> {
        let value = self.fetch_json(self.output_listing_url(sim_id, job)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn asset_listing(&self, asset_collection_id: &str) -> ClientResult<AssetCollectionListing> {
        let value = self.fetch_json(self.asset_listing_url(asset_collection_id)?).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Provider replaying a captured snapshot directory.
///
/// The directory holds `simulation.json`, `output.json` and `assets.json`,
/// each in the shape the REST endpoints return.
#[derive(Debug, Clone)]
pub struct SnapshotMetadata {
    dir: PathBuf,
}

impl SnapshotMetadata {
    pub const SIMULATION_FILE: &'static str = "simulation.json";
    pub const OUTPUT_FILE: &'static str = "output.json";
    pub const ASSETS_FILE: &'static str = "assets.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, name: &str) -> ClientResult<String> {
        Ok(std::fs::read_to_string(self.dir.join(name))?)
    }
}

#[async_trait]
impl MetadataProvider for SnapshotMetadata {
    /// Only simulations whose id matches are returned.
    async fn simulation_info(&self, sim_id: &str) -> ClientResult<SimulationsResponse> {
        let mut response: SimulationsResponse =
            serde_json::from_str(&self.read(Self::SIMULATION_FILE)?)?;
        response.simulations.retain(|sim| sim.id == sim_id);
        Ok(response)
    }

    async fn output_listing(&self, _sim_id: &str, _job: &HpcJob) -> ClientResult<PrimaryListing> {
        Ok(sf_tree::parse_primary_listing(&self.read(Self::OUTPUT_FILE)?)?)
    }

    async fn asset_listing(&self, _asset_collection_id: &str) -> ClientResult<AssetCollectionListing> {
        Ok(sf_tree::parse_asset_listing(&self.read(Self::ASSETS_FILE)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use futures::executor::block_on;
    use serde_json::json;

    struct Canned(Payload);

    #[async_trait]
    impl Fetcher for Canned {
        async fn fetch(&self, _: &str, _: ResponseType) -> Result<Payload, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn job(id: &str, state: &str) -> HpcJob {
        HpcJob {
            id: id.to_string(),
            job_state: state.to_string(),
            ..HpcJob::default()
        }
    }

    #[test]
    fn builds_rest_urls() {
        let comps = CompsMetadata::new(ClientConfig::default(), Canned(Payload::Text(String::new())));
        assert_eq!(
            comps.simulation_info_url("abc").unwrap().as_str(),
            "https://comps.idmod.org/api/Simulations/abc?format=json&children=files%2Chpcjobs"
        );
        assert_eq!(
            comps.output_listing_url("abc", &job("j1", FINISHED)).unwrap().as_str(),
            "https://comps.idmod.org/asset/Simulations/abc/output/?hpcjobid=j1&format=json&followSymLinks=0&flatten=0&zip=0"
        );
        assert_eq!(
            comps.asset_listing_url("ac9").unwrap().as_str(),
            "https://comps.idmod.org/api/AssetCollections/ac9/?children=assets&format=json"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let config = ClientConfig::default().with_base_url("http://localhost:8080/comps/api/");
        let comps = CompsMetadata::new(config, Canned(Payload::Text(String::new())));
        assert_eq!(
            comps.asset_listing_url("x").unwrap().path(),
            "/comps/api/AssetCollections/x/"
        );
    }

    #[test]
    fn text_answer_is_rejected() {
        let comps = CompsMetadata::new(
            ClientConfig::default(),
            Canned(Payload::Text("<html>Sign in</html>".into())),
        );
        let err = block_on(comps.simulation_info("abc")).unwrap_err();
        assert!(matches!(err, ClientError::Rejected { .. }));
    }

    #[test]
    fn parses_simulation_info() {
        let comps = CompsMetadata::new(
            ClientConfig::default(),
            Canned(Payload::Json(json!({
                "Simulations": [{
                    "Id": "abc",
                    "Name": "baseline",
                    "SimulationState": "Succeeded",
                    "Files": [{"Type": "File", "FriendlyName": "config.json", "Length": 10}],
                    "HPCJobs": [
                        {"Id": "j0", "JobId": 7, "JobState": "Failed"},
                        {"Id": "j1", "JobState": "Finished",
                         "Configuration": {"AssetCollectionId": "ac9",
                                           "SimulationInputArgs": "--config config.json"}}
                    ]
                }]
            }))),
        );
        let response = block_on(comps.simulation_info("abc")).unwrap();
        let info = &response.simulations[0];
        assert_eq!(info.name.as_deref(), Some("baseline"));
        assert_eq!(info.files.len(), 1);
        assert_eq!(info.hpc_jobs[0].job_id, Some(7));

        let finished = info.finished_job().unwrap();
        assert_eq!(finished.id, "j1");
        assert_eq!(finished.configuration.asset_collection_id.as_deref(), Some("ac9"));
    }

    #[test]
    fn no_finished_job() {
        let info = SimInfo {
            id: "x".into(),
            hpc_jobs: vec![job("a", "Running"), job("b", "Canceled")],
            ..SimInfo::default()
        };
        assert!(info.finished_job().is_none());
    }
}
