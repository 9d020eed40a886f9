//! Chime Player - plays announced audio files on this machine's speaker.
//!
//! Runs on the device that has the speaker (e.g. a Raspberry Pi). Exposes
//! `/announce` to trigger playback, `/files` to list the audio library and
//! a small config API; advertises itself via mDNS so senders on the local
//! network can find it without explicit configuration.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chime_core::advertise::detect_advertise_ip;
use chime_core::api::player::create_router;
use chime_core::{
    serve, Announcer, AudioLibrary, JsonStore, MdnsAdvertiser, Mpg123Backend, PlayerState,
};
use clap::Parser;
use tokio::signal;

use crate::config::PlayerConfig;

/// Chime Player - button-triggered audio playback service.
#[derive(Parser, Debug)]
#[command(name = "chime-player")]
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

    /// Audio directory (overrides config file).
    #[arg(short = 'a', long, env = "CHIME_AUDIO_DIR")]
    audio_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Chime Player v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        PlayerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(audio_dir) = args.audio_dir {
        config.audio_dir = audio_dir;
    }

    log::info!(
        "Configuration: bind_port={}, audio_dir={}, settings={}",
        config.bind_port,
        config.audio_dir.display(),
        config.settings_path.display()
    );

    let library = Arc::new(AudioLibrary::new(&config.audio_dir));
    log::info!("Audio library: {} file(s)", library.list().len());

    let settings = Arc::new(JsonStore::new(&config.settings_path));
    let backend = Arc::new(Mpg123Backend::default());
    let announcer = Arc::new(Announcer::new(
        Arc::clone(&library),
        Arc::clone(&settings),
        backend,
    ));

    let state = PlayerState {
        announcer,
        library,
        settings,
    };

    // Advertise via mDNS (best-effort, non-fatal)
    let _advertiser = if config.advertise {
        match detect_advertise_ip() {
            Some(ip) => match MdnsAdvertiser::new(ip, config.bind_port) {
                Ok(advertiser) => Some(advertiser),
                Err(e) => {
                    log::warn!("mDNS advertisement unavailable: {}", e);
                    None
                }
            },
            None => None,
        }
    } else {
        None
    };

    let router = create_router(state);
    let port = config.bind_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = serve(router, port).await {
            log::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal; an in-flight playback sequence is simply
    // abandoned with the process.
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
