//! Chime Sender - forwards button triggers to the player.
//!
//! Runs on the device that has the button (alongside chime-keyd). Exposes
//! `/send` to trigger an announce on the player with the configured
//! playlist, and a small config API. If no player address is configured,
//! the player is discovered via mDNS; the discovered address is remembered
//! for the process lifetime only, never written to the config store.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chime_core::api::sender::create_router;
use chime_core::{
    serve, Dispatcher, HttpAnnounceClient, JsonStore, MdnsResolver, ResolverConfig, SenderState,
};
use clap::Parser;
use tokio::signal;

use crate::config::SenderConfig;

/// Chime Sender - forwards button triggers as announce requests.
#[derive(Parser, Debug)]
#[command(name = "chime-sender")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "CHIME_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "CHIME_BIND_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Chime Sender v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        SenderConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(port) = args.port {
        config.bind_port = port;
    }

    log::info!(
        "Configuration: bind_port={}, settings={}, discovery_timeout={}s",
        config.bind_port,
        config.settings_path.display(),
        config.discovery_timeout_secs
    );

    let settings = Arc::new(JsonStore::new(&config.settings_path));
    let resolver = Arc::new(MdnsResolver::new(ResolverConfig {
        browse_timeout: config.discovery_timeout(),
    }));
    let client = Arc::new(HttpAnnounceClient::default());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&settings),
        resolver,
        Arc::clone(&client) as Arc<dyn chime_core::AnnounceClient>,
    ));

    // One-time best-effort startup sync: find the player, list its files,
    // seed an empty playlist. Runs in the background so a missing player
    // doesn't delay serving.
    {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher.sync_startup().await;
            log::info!("Startup sync complete");
        });
    }

    let state = SenderState {
        dispatcher,
        settings,
        client,
    };

    let router = create_router(state);
    let port = config.bind_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = serve(router, port).await {
            log::error!("Server error: {}", e);
        }
    });

    shutdown_signal().await;
    log::info!("Shutdown signal received, cleaning up...");
    server_handle.abort();
    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
