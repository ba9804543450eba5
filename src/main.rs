use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drama_catalog_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_BIND_ADDRESS, DEFAULT_DATA_FILE, DEFAULT_PORT,
};
use drama_catalog_server::server::config::{DEFAULT_ADMIN_TOKEN, DEFAULT_CORS_ORIGIN};
use drama_catalog_server::server::state::GuardedDramaStore;
use drama_catalog_server::{
    run_server, DramaStore, InMemoryDramaStore, JsonFileDramaStore, RequestsLoggingLevel,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(version, about = "Drama catalog HTTP API backed by a JSON file")]
struct CliArgs {
    /// The port to listen on.
    #[clap(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The address to bind to.
    #[clap(long, env = "BIND_ADDRESS", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind_address: String,

    /// Shared secret required in the x-admin-token header of mutating requests.
    /// The default is public, always set your own outside of local development.
    #[clap(long, env = "ADMIN_TOKEN", default_value = DEFAULT_ADMIN_TOKEN, hide_env_values = true)]
    pub admin_token: String,

    /// Origin allowed to call the API from a browser, `*` for any.
    #[clap(long, env = "CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    pub cors_origin: String,

    /// Path to the JSON catalog file. Created on first use.
    #[clap(long, env = "DATA_FILE", default_value = DEFAULT_DATA_FILE, value_parser = parse_path)]
    pub data_file: PathBuf,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Largest page size the list route honors. Unbounded when not set.
    #[clap(long, env = "MAX_PAGE_LIMIT")]
    pub max_page_limit: Option<usize>,

    /// Largest number of records one seed request adds. Unbounded when not set.
    #[clap(long, env = "MAX_SEED_COUNT")]
    pub max_seed_count: Option<usize>,

    /// Optional TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Keep the catalog in memory only, nothing is written to disk.
    #[clap(long)]
    pub ephemeral: bool,

    /// Load (or initialize) the catalog, report it and exit without serving.
    #[clap(long)]
    pub check_only: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            bind_address: self.bind_address.clone(),
            admin_token: self.admin_token.clone(),
            cors_origin: self.cors_origin.clone(),
            data_file: self.data_file.clone(),
            logging_level: self.logging_level.clone(),
            max_page_limit: self.max_page_limit,
            max_seed_count: self.max_seed_count,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    if app_config.uses_default_admin_token() {
        warn!(
            "The admin token is still the built-in default, anyone can modify the catalog. \
             Set ADMIN_TOKEN or --admin-token before exposing this server."
        );
    }

    let store: GuardedDramaStore = if cli_args.ephemeral {
        info!("Using an in-memory catalog, changes will be lost on exit");
        Arc::new(InMemoryDramaStore::default())
    } else {
        info!("Opening JSON catalog at {:?}...", app_config.data_file);
        Arc::new(JsonFileDramaStore::new(&app_config.data_file))
    };

    let snapshot = store
        .load()
        .await
        .with_context(|| format!("Failed to load catalog from {}", store.describe()))?;
    info!("Catalog has {} dramas", snapshot.dramas.len());

    if cli_args.check_only {
        info!("Check only, exiting.");
        return Ok(());
    }

    run_server(app_config.server_config(), store).await
}
