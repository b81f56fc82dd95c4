//! slp-server - self-paced learning service
//!
//! Serves the generation, chat, cache, account and course APIs over HTTP.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use slp_common::config::{
    database_path, default_config_path, read_toml_config, resolve_api_key, resolve_root_folder, LoggingConfig,
};
use slp_common::db::init_database;
use slp_server::generation::{GeminiClient, TextGenerator, UnconfiguredGenerator};
use slp_server::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for slp-server
#[derive(Parser, Debug)]
#[command(name = "slp-server")]
#[command(about = "Self-paced learning service")]
#[command(version)]
struct Args {
    /// Root folder holding the database (overrides SLP_ROOT_FOLDER and the config file)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, env = "SLP_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SLP_PORT")]
    port: Option<u16>,
}

/// Initialize tracing; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        None => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let (config, config_source) = read_toml_config(&config_path);

    init_tracing(&config.logging)?;

    // Build identification first, before any database work
    info!(
        "Starting slp-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log(&config_path);

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to initialize database at {}", db_path.display()))?;
    info!("✓ Database ready");

    let generator: Arc<dyn TextGenerator> = match resolve_api_key(&config) {
        Some(key) => {
            let client = GeminiClient::new(key, &config.generation).context("Failed to build generation client")?;
            info!("Generation model: {}", client.model());
            Arc::new(client)
        }
        None => {
            warn!("Generation endpoints will fail until an API key is configured");
            Arc::new(UnconfiguredGenerator)
        }
    };

    let state = AppState::new(pool, generator, config.generation.practice_question_count);
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let address = format!("{}:{}", config.bind_address, port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("slp-server listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
