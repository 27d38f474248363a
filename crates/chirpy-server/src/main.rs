mod config;

use std::net::SocketAddr;

use clap::Parser;
use tracing::{info, warn};

use chirpy_api::auth::AppStateInner;
use chirpy_db::Database;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "chirpy")]
#[command(about = "Chirpy API server", long_about = None)]
struct Cli {
    /// Delete the database file before starting
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chirpy=debug,chirpy_api=debug,chirpy_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    if cli.debug {
        match std::fs::remove_file(&config.db_path) {
            Ok(()) => info!("Debug mode: removed {}", config.db_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Debug mode: could not remove {}: {}", config.db_path.display(), e),
        }
    }

    let db = Database::open(&config.db_path)?;
    let state = AppStateInner::new(db, &config.jwt_secret, config.polka_key.clone());
    let app = chirpy_api::router(state, &config.file_root);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Serving files from {} on {}", config.file_root.display(), addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
