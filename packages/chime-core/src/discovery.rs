//! mDNS-based player discovery.
//!
//! The sender only needs one address: the first Chime player that answers a
//! DNS-SD browse for `_chime._tcp.local.`. Resolution is bounded in time and
//! its result is never persisted - a process remembers a resolved address in
//! memory only, so a player that moves between restarts is found again.

use std::time::Duration;

use mdns_sd::{ResolvedService, ScopedIp, ServiceDaemon, ServiceEvent};
use thiserror::Error;
use tokio::time::timeout;

/// Chime mDNS service type (note: trailing dot is required by mdns-sd).
pub const SERVICE_TYPE: &str = "_chime._tcp.local.";

/// Errors that can occur during player discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// mDNS daemon error.
    #[error("mDNS daemon error: {0}")]
    Daemon(String),

    /// No player answered within the browse window.
    #[error("no player found within {0:?}")]
    NotFound(Duration),
}

/// Convenient Result alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Configuration for mDNS resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long to browse for a player before giving up.
    pub browse_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            browse_timeout: Duration::from_secs(5),
        }
    }
}

/// Creates a new mDNS service daemon.
///
/// This should be called once and the daemon reused across resolution calls.
/// The daemon spawns a background thread for mDNS operations.
pub fn create_daemon() -> DiscoveryResult<ServiceDaemon> {
    ServiceDaemon::new().map_err(|e| DiscoveryError::Daemon(e.to_string()))
}

/// Resolves the first advertised Chime player on the local network.
///
/// Browses for `_chime._tcp.local.` and returns the first resolved
/// instance as a base URL (`http://ip:port`). Fails with
/// [`DiscoveryError::NotFound`] when the browse window elapses with zero
/// responses.
pub async fn resolve_player(
    daemon: &ServiceDaemon,
    config: &ResolverConfig,
) -> DiscoveryResult<String> {
    log::debug!(
        "[mDNS] Resolving player, browse timeout: {}ms",
        config.browse_timeout.as_millis()
    );

    let receiver = daemon
        .browse(SERVICE_TYPE)
        .map_err(|e| DiscoveryError::Daemon(e.to_string()))?;

    let mut found = None;
    let start = std::time::Instant::now();
    while start.elapsed() < config.browse_timeout {
        let remaining = config.browse_timeout.saturating_sub(start.elapsed());

        match timeout(remaining, async { receiver.recv_async().await }).await {
            Ok(Ok(event)) => {
                if let ServiceEvent::ServiceResolved(info) = event {
                    log::trace!("[mDNS] Service resolved: {:?}", info.fullname);
                    if let Some(url) = parse_service(&info) {
                        log::info!("[mDNS] Found player: {}", url);
                        found = Some(url);
                        break;
                    }
                }
            }
            Ok(Err(e)) => {
                log::debug!("[mDNS] Receiver channel closed: {:?}", e);
                break;
            }
            Err(_) => {
                // Timeout - normal termination
                break;
            }
        }
    }

    // Stop browsing to avoid accumulating daemon work
    if let Err(e) = daemon.stop_browse(SERVICE_TYPE) {
        log::warn!("[mDNS] Failed to stop browse: {:?}", e);
    }

    found.ok_or(DiscoveryError::NotFound(config.browse_timeout))
}

/// Builds a player base URL from a resolved mDNS service.
///
/// Prefers an IPv4 address from the resolved records; returns `None` when
/// the record carries no usable address or port.
fn parse_service(info: &ResolvedService) -> Option<String> {
    let ip = info.addresses.iter().find_map(|addr| match addr {
        ScopedIp::V4(v4) => Some(v4.addr().to_string()),
        _ => None,
    })?;
    if info.port == 0 {
        return None;
    }
    Some(base_url(&ip, info.port))
}

/// Formats a host and port as a player base URL.
pub fn base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}
