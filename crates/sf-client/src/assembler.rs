//! Drives a metadata provider to build a [`Simulation`].

use sf_tree::{AssetCollectionListing, AssetSplice, PrimaryListing, reconcile};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::metadata::MetadataProvider;
use crate::simulation::Simulation;

/// Builds simulations from whatever a [`MetadataProvider`] returns.
#[derive(Debug, Clone)]
pub struct SimulationAssembler<M> {
    metadata: M,
    verbose: bool,
}

impl<M: MetadataProvider> SimulationAssembler<M> {
    pub fn new(metadata: M) -> Self {
        Self {
            metadata,
            verbose: false,
        }
    }

    /// Log assembly progress at info level instead of debug.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Fetch metadata and listings for `sim_id` and build its file tree.
    ///
    /// The output listing comes from the first finished job. Without one,
    /// the tree holds the simulation's input files only and no assets.
    pub async fn populate(&self, sim_id: &str) -> ClientResult<Simulation> {
        let response = self.metadata.simulation_info(sim_id).await?;
        let info = response
            .simulations
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NoSimulation {
                sim_id: sim_id.to_string(),
            })?;

        let job = info.finished_job().cloned();
        let (primary, assets) = match &job {
            Some(job) => {
                let output = self.metadata.output_listing(sim_id, job);
                match job.configuration.asset_collection_id.as_deref() {
                    Some(ac_id) => {
                        futures::try_join!(output, self.metadata.asset_listing(ac_id))?
                    }
                    None => (output.await?, AssetCollectionListing::default()),
                }
            }
            None => {
                warn!(sim_id, "no finished HPC job; tree holds simulation inputs only");
                (
                    PrimaryListing::inputs_only(info.files.clone()),
                    AssetCollectionListing::default(),
                )
            }
        };

        let reconciled = reconcile(primary.resources, assets.assets());
        if let AssetSplice::Orphaned { file_count, .. } = reconciled.assets
            && file_count > 0
        {
            warn!(sim_id, file_count, "asset files have no Assets directory to live in");
        }
        let tree = reconciled.into_tree();

        if self.verbose {
            info!(sim_id, job = job.as_ref().map(|j| j.id.as_str()), %tree, "simulation populated");
        } else {
            debug!(sim_id, %tree, "simulation populated");
        }
        Ok(Simulation::new(info, job, tree))
    }
}
