//! Banner Rotator — picks which banner to show in a slot using UCB1.
//!
//! Main entry point that loads configuration, opens the store and serves HTTP.

use clap::{Parser, ValueEnum};
use rotation_api::ApiServer;
use rotation_core::config::{AppConfig, LogConfig, SelectionScope, StorageBackend};
use rotation_engine::RotationService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Memory,
    Postgres,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Global,
    SlotGroup,
}

#[derive(Parser, Debug)]
#[command(name = "banner-rotator")]
#[command(about = "Banner rotation service with UCB1 selection")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "BANNER_ROTATOR_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port (overrides config)
    #[arg(long)]
    http_port: Option<u16>,

    /// Storage backend (overrides config)
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Database URL (overrides config)
    #[arg(long)]
    database_url: Option<String>,

    /// Candidate scope for banner selection (overrides config)
    #[arg(long, value_enum)]
    scope: Option<ScopeArg>,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) {
        if let Some(port) = self.http_port {
            config.api.http_port = port;
        }
        if let Some(backend) = self.backend {
            config.storage.backend = match backend {
                BackendArg::Memory => StorageBackend::Memory,
                BackendArg::Postgres => StorageBackend::Postgres,
            };
        }
        if let Some(url) = self.database_url {
            config.storage.url = url;
        }
        if let Some(scope) = self.scope {
            config.selection.scope = match scope {
                ScopeArg::Global => SelectionScope::Global,
                ScopeArg::SlotGroup => SelectionScope::SlotGroup,
            };
        }
    }
}

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},tower_http=info", log.level).into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    init_tracing(&config.log);

    info!(
        http_port = config.api.http_port,
        backend = ?config.storage.backend,
        scope = ?config.selection.scope,
        "Configuration loaded"
    );

    let store = rotation_store::from_config(&config.storage).await?;
    let service = Arc::new(RotationService::new(store, config.selection.scope));

    let api_server = ApiServer::new(config.clone(), service);

    if config.metrics.enabled {
        if let Err(e) = api_server.start_metrics() {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!("Banner Rotator is ready to serve traffic");

    // Blocks until shutdown
    api_server.start_http(shutdown_signal()).await?;

    Ok(())
}
