//! Chime key listener - watches Linux input devices for key presses.
//!
//! Opens every input device that reports key events and forwards each
//! key-down as a trigger to the sender's `/send` endpoint. Rapid repeats
//! (bounce, key auto-repeat, multiple devices firing together) are
//! collapsed by a monotonic debounce window so one physical press yields
//! at most one trigger.
//!
//! Typically runs as root (or a member of the `input` group) on the same
//! host as chime-sender.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chime_core::{Debouncer, TriggerEvent, DEFAULT_DEBOUNCE_WINDOW};
use clap::Parser;
use evdev::{Device, EventType};
use tokio::signal;
use tokio::sync::mpsc;

/// Chime key listener - turns key presses into sender triggers.
#[derive(Parser, Debug)]
#[command(name = "chime-keyd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the sender's trigger endpoint.
    #[arg(
        short,
        long,
        default_value = "http://127.0.0.1:8000/send",
        env = "CHIME_SENDER_URL"
    )]
    sender_url: String,

    /// Debounce window in milliseconds.
    #[arg(short, long, default_value_t = DEFAULT_DEBOUNCE_WINDOW.as_millis() as u64, env = "CHIME_DEBOUNCE_MS")]
    debounce_ms: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "CHIME_LOG_LEVEL")]
    log_level: log::LevelFilter,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Chime key listener v{}", env!("CARGO_PKG_VERSION"));

    let (tx, mut rx) = mpsc::channel::<TriggerEvent>(64);

    let watched = spawn_device_watchers(tx);
    if watched == 0 {
        anyhow::bail!("No key-capable input devices found (missing permissions on /dev/input?)");
    }
    log::info!("Watching {} input device(s)", watched);
    log::info!("Trigger endpoint: {}", args.sender_url);

    let mut debouncer = Debouncer::new(Duration::from_millis(args.debounce_ms));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    log::warn!("All device watchers stopped");
                    break;
                };
                if debouncer.observe(event.at) {
                    log::info!("Key press on {}, triggering sender", event.device);
                    fire_trigger(&client, &args.sender_url).await;
                } else {
                    log::debug!("Key press on {} suppressed by debounce", event.device);
                }
            }
            _ = &mut shutdown => {
                log::info!("Shutdown signal received");
                break;
            }
        }
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// Spawns a watcher task per key-capable input device. Returns the number
/// of devices being watched.
fn spawn_device_watchers(tx: mpsc::Sender<TriggerEvent>) -> usize {
    let mut watched = 0;
    for (path, device) in evdev::enumerate() {
        if !device.supported_events().contains(EventType::KEY) {
            continue;
        }
        let name = device
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| path.display().to_string());
        log::info!("Watching device: {} ({})", name, path.display());
        let tx = tx.clone();
        tokio::spawn(watch_device(device, name, tx));
        watched += 1;
    }
    watched
}

/// Reads events from one device and forwards key-down events. A device
/// that disappears (e.g. USB keyboard unplugged) ends its watcher; the
/// other devices keep running.
async fn watch_device(device: Device, name: String, tx: mpsc::Sender<TriggerEvent>) {
    let mut stream = match device.into_event_stream() {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("Failed to open event stream for {}: {}", name, e);
            return;
        }
    };

    loop {
        match stream.next_event().await {
            Ok(event) => {
                // value 1 is key-down; 0 is release, 2 is auto-repeat
                if event.event_type() == EventType::KEY && event.value() == 1 {
                    let trigger = TriggerEvent {
                        device: name.clone(),
                        at: Instant::now(),
                    };
                    if tx.send(trigger).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                log::warn!("Device {} stopped: {}", name, e);
                return;
            }
        }
    }
}

/// Fires one trigger request at the sender. Failures are logged and
/// dropped; the next key press simply tries again.
async fn fire_trigger(client: &reqwest::Client, url: &str) {
    match client.post(url).send().await {
        Ok(response) if response.status().is_success() => {
            log::info!("Trigger accepted by sender");
        }
        Ok(response) => {
            log::warn!("Sender returned status {}", response.status());
        }
        Err(e) => {
            log::warn!("Failed to reach sender: {}", e);
        }
    }
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
