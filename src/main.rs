use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use devconnect_api::{app, database, AppConfig, AppState};

/// DevConnect API server
#[derive(Debug, Parser)]
#[command(name = "devconnect-api", version, about)]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT / DEVCONNECT_API_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Use the in-memory store even if DATABASE_URL is set
    #[arg(long, env = "DEVCONNECT_MEMORY_STORE")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.memory {
        config.database.url = None;
    }
    config.validate().context("invalid configuration")?;

    tracing::info!("Starting DevConnect API in {:?} mode", config.environment);

    let store = database::open_store(&config.database)
        .await
        .context("failed to open document store")?;
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store).context("failed to build application state")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("DevConnect API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
