//! sf-client: simulation assembly over caller-supplied I/O.
//!
//! This crate wires the tree and report crates to the outside world:
//! - `Fetcher`, the asynchronous collaborator that retrieves URLs
//! - `MetadataProvider`, with `CompsMetadata` (REST) and `SnapshotMetadata`
//!   (captured directory) implementations
//! - `SimulationAssembler`, which turns a simulation id into a `Simulation`
//! - `load_spatial_reports`, decoding every spatial report of a tree
//!
//! No transport lives here; a `Fetcher` implementation supplies it.

pub mod assembler;
pub mod config;
pub mod error;
pub mod fetch;
pub mod local;
pub mod metadata;
pub mod reports;
pub mod simulation;

// Re-export key types for convenience
pub use assembler::SimulationAssembler;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEV_BASE_URL, clean_base_url};
pub use error::{ClientError, ClientResult};
pub use fetch::{FetchError, Fetcher, Payload, ResponseType, fetch_many};
pub use local::LocalFetcher;
pub use metadata::{
    CompsMetadata, HpcJob, JobConfiguration, MetadataProvider, SimInfo, SimulationsResponse,
    SnapshotMetadata,
};
pub use reports::{load_spatial_reports, source_url};
pub use simulation::{NodeStats, Simulation, overlay_value};
