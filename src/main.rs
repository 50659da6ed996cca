//! OTel data node (v1)
//!
//! Runs a single node hosting the OTel data plugin against an in-process
//! cluster view.
//!
//! # Architecture Overview
//!
//! ```text
//!   node.toml ──▶ config ──▶ Node::start ──▶ OTelPlugin::on_start ──▶ OTelTemplateRegistry
//!                                                  ▲                         │
//!   live.toml ──▶ watcher ──▶ LiveSettings ────────┘ (registry flag)         ▼
//!                                                                    InMemoryCluster
//!   Ctrl-C ──▶ Node::close ──▶ OTelPlugin::on_close ──▶ registry close
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use otel_data::cluster::{InMemoryCluster, JsonContentRegistry, PluginServices, TokioThreadPool};
use otel_data::config::loader::load_config;
use otel_data::config::NodeConfig;
use otel_data::lifecycle::startup::shutdown_signal;
use otel_data::lifecycle::{Node, OTelPlugin};
use otel_data::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "otel-data-node")]
#[command(about = "Node hosting the OTel data template registry", long_about = None)]
struct Cli {
    /// Node configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Live settings file; overrides `live_settings.path` from the config.
    #[arg(short, long)]
    live_settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => NodeConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(node = %config.node.name, "otel-data-node v0.1.0 starting");

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let cluster = Arc::new(
        InMemoryCluster::new(config.node.name.clone(), config.node.master)
            .with_features(config.node.features.iter().cloned()),
    );
    let services = PluginServices::new()
        .with_cluster_service(cluster.clone())
        .with_thread_pool(Arc::new(TokioThreadPool::current()))
        .with_client(cluster.clone())
        .with_content_registry(Arc::new(JsonContentRegistry))
        .with_feature_service(cluster.clone());

    let plugin = OTelPlugin::new(&config.settings(), &config.registry);
    let live_path = cli
        .live_settings
        .clone()
        .or_else(|| config.live_settings.path.clone().map(PathBuf::from));

    let node = Node::start(config, services, Box::new(plugin))?;
    let _watcher = match live_path {
        Some(path) => Some(node.watch_live_settings(&path)?),
        None => None,
    };

    shutdown_signal().await?;

    node.close()?;
    tracing::info!(templates = cluster.template_count(), "Shutdown complete");
    Ok(())
}
