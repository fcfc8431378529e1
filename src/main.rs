//! Gemstock catalog server

use clap::Parser;
use gemstock::config::{CatalogConfig, StoreBackend};
use gemstock::{serve, CatalogService, MemoryProductStore, PgProductStore, ProductStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gemstock")]
#[command(about = "Jewelry product catalog service")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = gemstock::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Database connection URL (overrides the configuration file)
    #[arg(long)]
    database_url: Option<String>,

    /// Address to listen on, e.g. 127.0.0.1:5000 (overrides the configuration file)
    #[arg(long)]
    bind: Option<String>,

    /// Keep products in memory instead of PostgreSQL
    #[arg(long)]
    memory: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = CatalogConfig::load_from(&cli.config)?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if cli.memory {
        config.database.backend = StoreBackend::Memory;
    }
    let bind = cli.bind.unwrap_or_else(|| config.server.bind_address());

    may::config().set_workers(config.server.workers.max(1));

    match config.database.backend {
        StoreBackend::Postgres => {
            let store = PgProductStore::open(&config.database.url)
                .map_err(|e| anyhow::anyhow!("Failed to open product store: {e}"))?;
            run(store, &bind)
        }
        StoreBackend::Memory => {
            log::warn!("using the in-memory product store; data is lost on exit");
            let store = MemoryProductStore::new();
            store.initialize()?;
            run(store, &bind)
        }
    }
}

fn run<S: ProductStore + 'static>(store: S, bind: &str) -> anyhow::Result<()> {
    let service = Arc::new(CatalogService::new(store));
    let server = serve(Arc::clone(&service), bind)
        .map_err(|e| anyhow::anyhow!("Failed to start server on {bind}: {e}"))?;
    log::info!("catalog listening on http://{bind}/api/products");

    let joined = server.join();
    service.shutdown();
    joined.map_err(|e| anyhow::anyhow!("Server encountered an error: {e:?}"))
}
