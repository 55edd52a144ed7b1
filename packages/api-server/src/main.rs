//! Classifieds API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 3001, default DB path)
//! cargo run --bin api-server
//!
//! # Custom port and database
//! CLASSIFIEDS_PORT=3002 CLASSIFIEDS_DB_PATH=/tmp/classifieds.db cargo run --bin api-server
//! ```
//!
//! # Environment Variables
//!
//! See [`classifieds_server::config`]; `RUST_LOG` sets the log level
//! (e.g. "info", "debug", "classifieds_core=trace").

use classifieds_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!("Classifieds API server");
    tracing::info!("Database: {}", config.db_path.display());

    start_server(config).await
}
