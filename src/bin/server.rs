//! Pawlog Sync Server
//!
//! Stores wire-shaped records per collection and serves them to Pawlog
//! clients.
//!
//! # Configuration
//!
//! Environment variables:
//! - `PAWLOG_SERVER_PORT`: Port to listen on (default: 8080)
//! - `PAWLOG_SERVER_DATA_DIR`: Directory for the records database (default: ~/.local/share/pawlog-server)
//! - `PAWLOG_SERVER_CONFIG`: Path to config file (default: ~/.config/pawlog-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! api_keys:
//!   - name: "phone"
//!     key_hash: "<sha256 hex of the key>"
//!   - name: "dev"
//!     key: "plain-text-key"
//! ```
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `PUT /v1/{collection}/{id}`: Insert or replace a record
//! - `DELETE /v1/{collection}/{id}`: Delete a record
//! - `GET /v1/{collection}?owner_key=&owner=`: Records of one owner

use pawlog::server::{router, ApiKeyStore, AppState, ServerConfig, ServerStorage};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawlog=info,pawlog_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();

    std::fs::create_dir_all(&config.data_dir)?;
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Config file: {}", config.config_path.display());

    let api_keys = ApiKeyStore::load(&config.config_path);
    let storage = ServerStorage::open(&config.database_path()).await?;
    let app = router(AppState::new(api_keys, storage));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
