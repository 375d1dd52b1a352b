//! A populated simulation: metadata, chosen job, file tree and file access.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sf_core::{Domain, regularize};
use sf_tree::{ASSETS_DIR_NAME, FileRecord, FileTree};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::fetch::{Fetcher, Payload, ResponseType, fetch_many};
use crate::metadata::{HpcJob, SimInfo};
use crate::reports::source_url;

pub const DEFAULT_CONFIG_FILENAME: &str = "./config.json";
pub const VIS_TOOLS_DIR: &str = "/Vis-Tools/";
const VISSET_PATTERN: &str = r"(?i)visset.*\.json";

/// Simulation with its canonical file tree.
///
/// Config and demographics are fetched on first request and kept.
#[derive(Debug)]
pub struct Simulation {
    info: SimInfo,
    job: Option<HpcJob>,
    tree: FileTree,
    config: OnceLock<Value>,
    demographics: OnceLock<Value>,
}

impl Simulation {
    pub fn new(info: SimInfo, job: Option<HpcJob>, tree: FileTree) -> Self {
        Self {
            info,
            job,
            tree,
            config: OnceLock::new(),
            demographics: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn info(&self) -> &SimInfo {
        &self.info
    }

    /// The finished job the tree's outputs came from, if any.
    pub fn job(&self) -> Option<&HpcJob> {
        self.job.as_ref()
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    /// Config file named by `--config` in the job's input args.
    pub fn config_filename(&self) -> String {
        let args = self
            .job
            .as_ref()
            .and_then(|job| job.configuration.simulation_input_args.as_deref());
        let Some(args) = args else {
            return DEFAULT_CONFIG_FILENAME.to_string();
        };
        let mut tokens = args.split_whitespace();
        tokens
            .find(|tok| *tok == "--config")
            .and_then(|_| tokens.next())
            .map_or_else(|| DEFAULT_CONFIG_FILENAME.to_string(), str::to_string)
    }

    pub fn vis_tools_dir(&self) -> Option<&FileRecord> {
        self.tree.find_file_record(VIS_TOOLS_DIR)
    }

    /// Link that opens this simulation in the Vis-Tools geospatial client.
    ///
    /// `None` without a `Vis-Tools` directory or without a visset file in it.
    pub fn vis_tools_url(&self, base_url: &str) -> ClientResult<Option<String>> {
        let Some(dir) = self.vis_tools_dir() else {
            debug!(sim_id = self.id(), "no Vis-Tools directory");
            return Ok(None);
        };
        let dir_path = dir.regularized_path();
        let pattern = Regex::new(VISSET_PATTERN)?;

        let mut visset = None;
        self.tree.traverse(
            |rec| {
                if rec.regularized_path().starts_with(&dir_path)
                    && pattern.is_match(rec.friendly_name())
                {
                    visset = Some(source_url(rec));
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
            FileTree::NO_DIRS,
        );
        let Some(visset) = visset else {
            return Ok(None);
        };

        let mut url = Url::parse(&format!("{base_url}/vistools/geospatial.html"))?;
        url.query_pairs_mut().append_pair("set", &visset);
        Ok(Some(url.to_string()))
    }

    /// Fetch one file of the tree.
    pub async fn get_file<F>(
        &self,
        fetcher: &F,
        path: &str,
        response_type: ResponseType,
    ) -> ClientResult<Payload>
    where
        F: Fetcher + ?Sized,
    {
        let url = self.file_url(path)?;
        Ok(fetcher.fetch(&url, response_type).await?)
    }

    /// Fetch several files concurrently, in order.
    ///
    /// Nothing is fetched unless every path names a file of the tree.
    pub async fn get_files<F, S>(
        &self,
        fetcher: &F,
        paths: &[S],
        response_type: ResponseType,
    ) -> ClientResult<Vec<Payload>>
    where
        F: Fetcher + ?Sized,
        S: AsRef<str>,
    {
        let urls = paths
            .iter()
            .map(|path| self.file_url(path.as_ref()))
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(fetch_many(fetcher, &urls, response_type).await?)
    }

    /// The simulation's config JSON.
    pub async fn config<F>(&self, fetcher: &F) -> ClientResult<&Value>
    where
        F: Fetcher + ?Sized,
    {
        if let Some(config) = self.config.get() {
            return Ok(config);
        }
        let path = self.config_filename();
        let value = json_payload(&path, self.get_file(fetcher, &path, ResponseType::Json).await?)?;
        Ok(self.config.get_or_init(|| value))
    }

    /// Consolidated demographics.
    ///
    /// `parameters.Demographics_Filenames` in the config names the main file
    /// followed by overlays. Each is looked up at the tree root, then under
    /// `./Assets/`. Overlays are applied in order: nested objects merge key
    /// by key, any other value replaces what was there.
    pub async fn demographics<F>(&self, fetcher: &F) -> ClientResult<&Value>
    where
        F: Fetcher + ?Sized,
    {
        if let Some(demographics) = self.demographics.get() {
            return Ok(demographics);
        }

        let config = self.config(fetcher).await?;
        let names: Vec<&str> = match config.pointer("/parameters/Demographics_Filenames") {
            Some(Value::String(name)) => vec![name.as_str()],
            Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if names.is_empty() {
            return Err(ClientError::NotFound {
                path: "parameters.Demographics_Filenames".to_string(),
            });
        }

        let paths = names
            .iter()
            .map(|name| self.resolve_demographics(name))
            .collect::<ClientResult<Vec<_>>>()?;
        let payloads = self.get_files(fetcher, &paths, ResponseType::Json).await?;

        let mut docs = paths
            .iter()
            .zip(payloads)
            .map(|(path, payload)| json_payload(path, payload));
        let mut merged = match docs.next() {
            Some(doc) => doc?,
            None => Value::Null,
        };
        for overlay in docs {
            overlay_value(&mut merged, overlay?);
        }
        if paths.len() > 1 {
            debug!(overlays = paths.len() - 1, "demographics overlays applied");
        }
        Ok(self.demographics.get_or_init(|| merged))
    }

    /// Multi-line summary for debugging.
    pub fn dump(&self) -> String {
        let info = &self.info;
        let job = match &self.job {
            Some(job) => format!(
                "[Job {}/{} in {} state]",
                job.id,
                job.job_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                job.job_state
            ),
            None => "[no finished job]".to_string(),
        };
        format!(
            "{}\n  [SimInfo {} {}/'{}']\n  {job}\n  {}\n",
            self,
            info.id,
            info.owner.as_deref().unwrap_or(""),
            info.name.as_deref().unwrap_or(""),
            self.tree
        )
    }

    fn file_url(&self, path: &str) -> ClientResult<String> {
        self.tree
            .find_file_record(path)
            .filter(|rec| !rec.is_directory())
            .map(source_url)
            .ok_or_else(|| ClientError::NotFound {
                path: path.to_string(),
            })
    }

    fn resolve_demographics(&self, name: &str) -> ClientResult<String> {
        if self.tree.contains(name) {
            return Ok(regularize(name));
        }
        let in_assets = format!("./{ASSETS_DIR_NAME}/{name}");
        if self.tree.contains(&in_assets) {
            return Ok(in_assets);
        }
        warn!(name, "demographics file not found at root or in Assets");
        Err(ClientError::NotFound {
            path: name.to_string(),
        })
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |present: bool| if present { "x" } else { " " };
        write!(
            f,
            "[Simulation: {} with [{}] info, [{}] job, [{}] tree]",
            self.info.id,
            mark(true),
            mark(self.job.is_some()),
            mark(true)
        )
    }
}

fn json_payload(path: &str, payload: Payload) -> ClientResult<Value> {
    payload.into_json().ok_or_else(|| ClientError::UnexpectedPayload {
        url: path.to_string(),
        expected: ResponseType::Json,
    })
}

/// Layer `overlay` onto `base`: objects merge recursively, anything else replaces.
pub fn overlay_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => overlay_value(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Geographic and population extent of demographics nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeStats {
    pub latitude: Domain<f64>,
    pub longitude: Domain<f64>,
    pub population: Domain<f64>,
}

impl NodeStats {
    /// Stats over `Nodes[*].NodeAttributes`; nodes missing a field are skipped.
    pub fn from_demographics(demographics: &Value) -> Option<Self> {
        let nodes = demographics.get("Nodes")?.as_array()?;
        let attrs: Vec<(f64, f64, f64)> = nodes
            .iter()
            .filter_map(|node| {
                let na = node.get("NodeAttributes")?;
                Some((
                    na.get("Latitude")?.as_f64()?,
                    na.get("Longitude")?.as_f64()?,
                    na.get("InitialPopulation")?.as_f64()?,
                ))
            })
            .collect();
        Some(Self {
            latitude: Domain::spanning(attrs.iter().map(|a| a.0))?,
            longitude: Domain::spanning(attrs.iter().map(|a| a.1))?,
            population: Domain::spanning(attrs.iter().map(|a| a.2))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::JobConfiguration;
    use serde_json::json;

    fn sim_with_args(args: Option<&str>) -> Simulation {
        let job = HpcJob {
            id: "j1".into(),
            job_state: "Finished".into(),
            configuration: JobConfiguration {
                simulation_input_args: args.map(str::to_string),
                ..JobConfiguration::default()
            },
            ..HpcJob::default()
        };
        Simulation::new(SimInfo::default(), Some(job), FileTree::from_records(vec![]))
    }

    #[test]
    fn config_filename_from_input_args() {
        assert_eq!(
            sim_with_args(Some("--config my_config.json --input-path ./Assets")).config_filename(),
            "my_config.json"
        );
        assert_eq!(sim_with_args(Some("--dll-path ./")).config_filename(), DEFAULT_CONFIG_FILENAME);
        assert_eq!(sim_with_args(Some("--config")).config_filename(), DEFAULT_CONFIG_FILENAME);
        assert_eq!(sim_with_args(None).config_filename(), DEFAULT_CONFIG_FILENAME);

        let no_job = Simulation::new(SimInfo::default(), None, FileTree::from_records(vec![]));
        assert_eq!(no_job.config_filename(), DEFAULT_CONFIG_FILENAME);
    }

    #[test]
    fn overlay_merges_objects_and_replaces_the_rest() {
        let mut base = json!({
            "Metadata": { "Author": "a", "NodeCount": 2 },
            "Defaults": { "IndividualAttributes": { "AgeDistribution": [1, 2] } },
            "Nodes": [ { "NodeID": 1 }, { "NodeID": 2 } ]
        });
        overlay_value(
            &mut base,
            json!({
                "Metadata": { "Author": "b" },
                "Defaults": { "IndividualAttributes": { "AgeDistribution": [9], "Risk": 0.5 } },
                "Nodes": [ { "NodeID": 1, "NodeAttributes": { "InitialPopulation": 10 } } ]
            }),
        );
        assert_eq!(
            base,
            json!({
                "Metadata": { "Author": "b", "NodeCount": 2 },
                "Defaults": { "IndividualAttributes": { "AgeDistribution": [9], "Risk": 0.5 } },
                "Nodes": [ { "NodeID": 1, "NodeAttributes": { "InitialPopulation": 10 } } ]
            })
        );
    }

    #[test]
    fn node_stats() {
        let demo = json!({ "Nodes": [
            { "NodeAttributes": { "Latitude": 1.5, "Longitude": 30.0, "InitialPopulation": 1000 } },
            { "NodeAttributes": { "Latitude": -2.0, "Longitude": 31.5, "InitialPopulation": 250 } },
            { "NodeID": 3 }
        ]});
        let stats = NodeStats::from_demographics(&demo).unwrap();
        assert_eq!(stats.latitude, Domain::new(-2.0, 1.5));
        assert_eq!(stats.longitude, Domain::new(30.0, 31.5));
        assert_eq!(stats.population, Domain::new(250.0, 1000.0));
        assert!(NodeStats::from_demographics(&json!({ "Nodes": [] })).is_none());
    }

    #[test]
    fn display_marks_missing_job() {
        let sim = Simulation::new(
            SimInfo {
                id: "abc".into(),
                ..SimInfo::default()
            },
            None,
            FileTree::from_records(vec![]),
        );
        assert_eq!(sim.to_string(), "[Simulation: abc with [x] info, [ ] job, [x] tree]");
        assert!(sim.dump().contains("[no finished job]"));
        assert!(sim.dump().contains("[FileTree: 0 files, 0 bytes]"));
    }
}
