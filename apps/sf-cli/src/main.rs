use clap::{Parser, Subcommand};
use futures::executor::block_on;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sf_client::{
    ClientConfig, ClientResult, LocalFetcher, SimulationAssembler, SnapshotMetadata,
    load_spatial_reports,
};
use sf_spatial::{DecodeOptions, SpatialBinary, channel_name};
use sf_tree::{AssetCollectionListing, FileTree, PrimaryListing};

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "SimFiles CLI - inspect simulation file trees and spatial reports", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the paths of a file tree
    Tree {
        /// Primary listing JSON ({"Resources": [...]})
        listing: PathBuf,
        /// Asset collection listing JSON
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Include directories (sorted listing)
        #[arg(long)]
        dirs: bool,
        /// Print the reconciled records as JSON instead of paths
        #[arg(long)]
        json: bool,
    },
    /// Look up one path in a file tree
    Find {
        /// Primary listing JSON
        listing: PathBuf,
        /// Path to look up; end with "/" for a directory
        path: String,
        /// Asset collection listing JSON
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// File count and total size of a file tree
    Stats {
        /// Primary listing JSON
        listing: PathBuf,
        /// Asset collection listing JSON
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Summarize a spatial report binary
    Spatial {
        /// Spatial report .bin file
        file: PathBuf,
        /// Timestep label of the first decoded row
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
        /// Number of timesteps to decode (0 = all)
        #[arg(long, default_value_t = 0)]
        timesteps: u32,
        /// Print the time series of this node
        #[arg(long)]
        node: Option<u32>,
    },
    /// Replay a captured simulation snapshot directory
    Sim {
        /// Directory holding simulation.json, output.json, assets.json and files
        snapshot: PathBuf,
        /// Simulation id
        sim_id: String,
        /// Client configuration (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ClientResult<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Tree {
            listing,
            assets,
            dirs,
            json,
        } => cmd_tree(&listing, assets.as_deref(), dirs, json),
        Commands::Find {
            listing,
            path,
            assets,
        } => cmd_find(&listing, &path, assets.as_deref()),
        Commands::Stats { listing, assets } => cmd_stats(&listing, assets.as_deref()),
        Commands::Spatial {
            file,
            offset,
            timesteps,
            node,
        } => cmd_spatial(&file, offset, timesteps, node),
        Commands::Sim {
            snapshot,
            sim_id,
            config,
        } => cmd_sim(&snapshot, &sim_id, config.as_deref(), cli.verbose),
    }
}

fn load_tree(listing: &Path, assets: Option<&Path>) -> ClientResult<FileTree> {
    let primary: PrimaryListing = sf_tree::parse_primary_listing(&std::fs::read_to_string(listing)?)?;
    let assets = match assets {
        Some(path) => sf_tree::parse_asset_listing(&std::fs::read_to_string(path)?)?,
        None => AssetCollectionListing::default(),
    };
    Ok(FileTree::from_listings(primary, &assets))
}

fn cmd_tree(listing: &Path, assets: Option<&Path>, dirs: bool, json: bool) -> ClientResult<()> {
    let tree = load_tree(listing, assets)?;
    if json {
        println!("{}", serde_json::to_string_pretty(tree.root().children())?);
        return Ok(());
    }
    for path in tree.file_list(dirs) {
        println!("{}", path);
    }
    Ok(())
}

fn cmd_find(listing: &Path, path: &str, assets: Option<&Path>) -> ClientResult<()> {
    let tree = load_tree(listing, assets)?;
    match tree.find_file_record(path) {
        Some(rec) => {
            println!("{}", rec.regularized_path());
            println!("  Type: {:?}", rec.kind());
            if let Some(length) = rec.length() {
                println!("  Length: {} bytes", length);
            }
            if !rec.url().is_empty() {
                println!("  Url: {}", rec.url());
            }
            if let Some(checksum) = rec.checksum() {
                println!("  MD5: {}", checksum);
            }
            if rec.is_directory() {
                println!("  Entries: {}", rec.children().len());
            }
        }
        None => println!("Not found: {}", sf_core::regularize(path)),
    }
    Ok(())
}

fn cmd_stats(listing: &Path, assets: Option<&Path>) -> ClientResult<()> {
    let tree = load_tree(listing, assets)?;
    println!("{}", tree);

    let reports = tree.spatial_report_list();
    if !reports.is_empty() {
        println!("\nSpatial reports:");
        for path in reports {
            println!("  {} ({})", path, channel_name(path));
        }
    }
    Ok(())
}

fn cmd_spatial(file: &Path, offset: i64, timesteps: u32, node: Option<u32>) -> ClientResult<()> {
    let bytes = std::fs::read(file)?;
    let name = file.display().to_string();
    let opts = DecodeOptions::default()
        .with_offset(offset)
        .with_timestep_count(timesteps);
    let report = SpatialBinary::decode(name.clone(), &bytes, &opts).map_err(|source| {
        sf_client::ClientError::Spatial {
            path: name.clone(),
            source,
        }
    })?;

    print_report(&name, &report);

    if let Some(node_id) = node {
        let series = report.timeseries_for_node(node_id);
        if series.is_empty() {
            println!("\nNode {} not in report", node_id);
        } else {
            println!("\ntimestep,value");
            for (t, value) in (report.timestep_domain().min..=i64::MAX).zip(series) {
                println!("{},{}", t, value);
            }
        }
    }
    Ok(())
}

fn print_report(path: &str, report: &SpatialBinary) {
    println!("{} [{}]", path, channel_name(path));
    println!("  Nodes: {}", report.node_ids().len());
    println!("  Timesteps: {} {}", report.timestep_count(), report.timestep_domain());
    match report.value_domain() {
        Some(domain) => println!("  Values: {}", domain),
        None => println!("  Values: none"),
    }
    if let Some(domain) = report.summed_domain() {
        println!("  Summed: {}", domain);
    }
}

fn cmd_sim(snapshot: &Path, sim_id: &str, config: Option<&Path>, verbose: bool) -> ClientResult<()> {
    let config = match config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    let verbose = verbose || config.verbose;
    info!(snapshot = %snapshot.display(), sim_id, "replaying snapshot");

    let assembler = SimulationAssembler::new(SnapshotMetadata::new(snapshot)).with_verbose(verbose);
    let fetcher = LocalFetcher::new(snapshot);

    let sim = block_on(assembler.populate(sim_id))?;
    print!("{}", sim.dump());
    println!("  Config: {}", sim.config_filename());
    if let Some(url) = sim.vis_tools_url(&config.base_url)? {
        println!("  Vis-Tools: {}", url);
    }

    let reports = block_on(load_spatial_reports(sim.tree(), &fetcher))?;
    if !reports.is_empty() {
        println!("\nSpatial reports:");
        for (path, report) in &reports {
            print_report(path, report);
        }
    }
    Ok(())
}
