//! Sender-side dispatch: forwarding a trigger to the player.
//!
//! One dispatch is one announce call. The playlist is re-read from the
//! config store on every trigger (users edit it between presses), the
//! player address comes from configuration or - when unset - from mDNS
//! resolution cached for the process lifetime, and the announce call is
//! made exactly once: a failed call is surfaced, never retried. Button
//! presses are user-visible and re-triggerable, so blind retries risk
//! double playback more than they help.

use std::sync::Arc;

use async_trait::async_trait;
use mdns_sd::ServiceDaemon;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::announce::FileOutcome;
use crate::discovery::{self, DiscoveryError, DiscoveryResult, ResolverConfig};
use crate::store::{JsonStore, SenderSettings};

/// Resolves the player's base URL when none is configured.
#[async_trait]
pub trait PlayerResolver: Send + Sync {
    /// Performs one bounded-time resolution attempt.
    async fn resolve(&self) -> DiscoveryResult<String>;
}

/// mDNS-backed [`PlayerResolver`].
///
/// Holds the shared service daemon; when the daemon could not be created
/// (mDNS unavailable on the system), resolution fails cleanly instead of
/// taking the sender down - explicitly configured players keep working.
pub struct MdnsResolver {
    daemon: Option<Arc<ServiceDaemon>>,
    config: ResolverConfig,
}

impl MdnsResolver {
    /// Creates a resolver, attempting to start the mDNS daemon.
    pub fn new(config: ResolverConfig) -> Self {
        let daemon = match discovery::create_daemon() {
            Ok(daemon) => Some(Arc::new(daemon)),
            Err(e) => {
                log::warn!("[mDNS] Daemon unavailable, discovery disabled: {}", e);
                None
            }
        };
        Self { daemon, config }
    }
}

#[async_trait]
impl PlayerResolver for MdnsResolver {
    async fn resolve(&self) -> DiscoveryResult<String> {
        let daemon = self
            .daemon
            .as_ref()
            .ok_or_else(|| DiscoveryError::Daemon("mDNS daemon unavailable".to_string()))?;
        discovery::resolve_player(daemon, &self.config).await
    }
}

/// Errors from one announce or file-list call to a player.
#[derive(Debug, Error)]
pub enum AnnounceCallError {
    /// The player was unreachable (connect/send/timeout failure).
    #[error("request failed: {0}")]
    Network(String),

    /// The player answered with a non-success status.
    #[error("player returned HTTP {0}")]
    Status(u16),

    /// The player answered 200 but the body was not understood.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// The sender's view of a player: announce and file listing.
#[async_trait]
pub trait AnnounceClient: Send + Sync {
    /// Issues one announce request; `files` become repeated `file` query
    /// parameters in order. Returns the player's per-file outcomes.
    async fn announce(
        &self,
        base_url: &str,
        files: &[String],
    ) -> Result<Vec<FileOutcome>, AnnounceCallError>;

    /// Fetches the player's available file identifiers.
    async fn fetch_files(&self, base_url: &str) -> Result<Vec<String>, AnnounceCallError>;
}

/// Body of the player's announce response.
#[derive(Debug, Deserialize)]
struct AnnounceResponse {
    results: Vec<FileOutcome>,
}

/// reqwest-backed [`AnnounceClient`].
#[derive(Debug, Clone)]
pub struct HttpAnnounceClient {
    http: reqwest::Client,
}

impl HttpAnnounceClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http }
    }
}

impl Default for HttpAnnounceClient {
    fn default() -> Self {
        Self::new(std::time::Duration::from_secs(10))
    }
}

#[async_trait]
impl AnnounceClient for HttpAnnounceClient {
    async fn announce(
        &self,
        base_url: &str,
        files: &[String],
    ) -> Result<Vec<FileOutcome>, AnnounceCallError> {
        let params: Vec<(&str, &str)> = files.iter().map(|f| ("file", f.as_str())).collect();
        let response = self
            .http
            .get(format!("{}/announce", base_url.trim_end_matches('/')))
            .query(&params)
            .send()
            .await
            .map_err(|e| AnnounceCallError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnnounceCallError::Status(status.as_u16()));
        }

        let body: AnnounceResponse = response
            .json()
            .await
            .map_err(|e| AnnounceCallError::InvalidBody(e.to_string()))?;
        Ok(body.results)
    }

    async fn fetch_files(&self, base_url: &str) -> Result<Vec<String>, AnnounceCallError> {
        let response = self
            .http
            .get(format!("{}/files", base_url.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| AnnounceCallError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnnounceCallError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| AnnounceCallError::InvalidBody(e.to_string()))
    }
}

/// Request-level dispatch failures. File-level outcomes never appear here;
/// they ride inside a successful [`DispatchOutcome`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No player address configured and resolution failed.
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// The announce call itself failed.
    #[error("announce call failed: {0}")]
    Call(#[from] AnnounceCallError),
}

/// Result of a successful dispatch, for observability only - dispatch never
/// changes its own behavior based on file-level outcomes.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    /// The player base URL that was contacted.
    pub player: String,
    /// The player's per-file results, in playlist order.
    pub results: Vec<FileOutcome>,
}

/// Forwards triggers to the player as announce requests.
pub struct Dispatcher {
    store: Arc<JsonStore<SenderSettings>>,
    resolver: Arc<dyn PlayerResolver>,
    client: Arc<dyn AnnounceClient>,
    /// Discovered player address, remembered for the process lifetime.
    /// Evicted when an announce call to it fails, so the next trigger
    /// re-resolves. Never written to the config store.
    resolved: RwLock<Option<String>>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given store, resolver and client.
    pub fn new(
        store: Arc<JsonStore<SenderSettings>>,
        resolver: Arc<dyn PlayerResolver>,
        client: Arc<dyn AnnounceClient>,
    ) -> Self {
        Self {
            store,
            resolver,
            client,
            resolved: RwLock::new(None),
        }
    }

    /// Determines the player base URL for this dispatch.
    ///
    /// Returns the URL and whether it came from discovery (as opposed to
    /// explicit configuration).
    async fn player_url(&self, settings: &SenderSettings) -> Result<(String, bool), DispatchError> {
        if let Some(url) = &settings.player_base_url {
            return Ok((url.clone(), false));
        }
        if let Some(url) = self.resolved.read().clone() {
            return Ok((url, true));
        }
        let url = self.resolver.resolve().await?;
        *self.resolved.write() = Some(url.clone());
        Ok((url, true))
    }

    /// Forwards the current playlist to the player.
    ///
    /// Reads the playlist fresh from the store, resolves the player address
    /// (configuration first, then cached or fresh discovery), and issues
    /// exactly one announce call. An empty playlist is forwarded as a
    /// zero-file announce - a valid no-op, not an error.
    pub async fn dispatch(&self) -> Result<DispatchOutcome, DispatchError> {
        let settings = self.store.load().normalized();
        let (player, from_discovery) = self.player_url(&settings).await?;

        log::info!(
            "[Dispatch] Announcing {} file(s) to {}",
            settings.playlist.len(),
            player
        );

        match self.client.announce(&player, &settings.playlist).await {
            Ok(results) => Ok(DispatchOutcome { player, results }),
            Err(e) => {
                if from_discovery {
                    // The discovered address went stale; re-resolve next time.
                    self.resolved.write().take();
                }
                Err(e.into())
            }
        }
    }

    /// One-time startup sync, best-effort.
    ///
    /// Fetches the player's file list (resolving its address if needed) and,
    /// when the stored playlist is empty, seeds it with the first available
    /// file so a freshly installed button does something audible. Discovery
    /// performed here stays in memory; it is never persisted.
    pub async fn sync_startup(&self) {
        let settings = self.store.load().normalized();
        let (player, _) = match self.player_url(&settings).await {
            Ok(resolved) => resolved,
            Err(e) => {
                log::warn!("[Startup] No player available yet: {}", e);
                return;
            }
        };

        let files = match self.client.fetch_files(&player).await {
            Ok(files) => files,
            Err(e) => {
                log::warn!("[Startup] Could not list files on {}: {}", player, e);
                return;
            }
        };
        log::info!("[Startup] Player {} has {} file(s)", player, files.len());

        if settings.playlist.is_empty() {
            if let Some(first) = files.first() {
                let mut updated = settings;
                updated.playlist = vec![first.clone()];
                if let Err(e) = self.store.save(&updated) {
                    log::warn!("[Startup] Failed to seed playlist: {}", e);
                } else {
                    log::info!("[Startup] Seeded playlist with {}", first);
                }
            }
        }
    }

    /// Returns the currently cached discovered address, if any.
    pub fn cached_player(&self) -> Option<String> {
        self.resolved.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::announce::FileStatus;

    struct FakeResolver {
        calls: AtomicUsize,
        result: Option<String>,
    }

    impl FakeResolver {
        fn finds(url: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Some(url.to_string()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: None,
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlayerResolver for FakeResolver {
        async fn resolve(&self) -> DiscoveryResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .ok_or(DiscoveryError::NotFound(Duration::from_secs(5)))
        }
    }

    #[derive(Default)]
    struct FakeClient {
        announces: Mutex<Vec<(String, Vec<String>)>>,
        fail_network: std::sync::atomic::AtomicBool,
        available: Vec<String>,
    }

    impl FakeClient {
        fn ok() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn failing() -> Arc<Self> {
            let client = Self::default();
            client.fail_network.store(true, Ordering::SeqCst);
            Arc::new(client)
        }

        fn with_files(files: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                available: files.iter().map(|f| f.to_string()).collect(),
                ..Self::default()
            })
        }

        fn announce_count(&self) -> usize {
            self.announces.lock().len()
        }
    }

    #[async_trait]
    impl AnnounceClient for FakeClient {
        async fn announce(
            &self,
            base_url: &str,
            files: &[String],
        ) -> Result<Vec<FileOutcome>, AnnounceCallError> {
            self.announces
                .lock()
                .push((base_url.to_string(), files.to_vec()));
            if self.fail_network.load(Ordering::SeqCst) {
                return Err(AnnounceCallError::Network("connection refused".into()));
            }
            Ok(files
                .iter()
                .map(|f| FileOutcome {
                    file: f.clone(),
                    status: FileStatus::Played,
                })
                .collect())
        }

        async fn fetch_files(&self, _base_url: &str) -> Result<Vec<String>, AnnounceCallError> {
            if self.fail_network.load(Ordering::SeqCst) {
                return Err(AnnounceCallError::Network("connection refused".into()));
            }
            Ok(self.available.clone())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<JsonStore<SenderSettings>>,
    }

    fn fixture(settings: SenderSettings) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::new(dir.path().join("config.json")));
        store.save(&settings).unwrap();
        Fixture { _dir: dir, store }
    }

    fn dispatcher(
        fixture: &Fixture,
        resolver: Arc<FakeResolver>,
        client: Arc<FakeClient>,
    ) -> Dispatcher {
        Dispatcher::new(Arc::clone(&fixture.store), resolver, client)
    }

    #[tokio::test]
    async fn configured_url_skips_discovery() {
        let fx = fixture(SenderSettings {
            player_base_url: Some("http://10.0.0.5:8000".into()),
            playlist: vec!["a.mp3".into()],
        });
        let resolver = FakeResolver::finds("http://ignored");
        let client = FakeClient::ok();
        let dispatcher = dispatcher(&fx, Arc::clone(&resolver), Arc::clone(&client));

        let outcome = dispatcher.dispatch().await.unwrap();

        assert_eq!(outcome.player, "http://10.0.0.5:8000");
        assert_eq!(resolver.call_count(), 0);
    }

    #[tokio::test]
    async fn discovery_runs_once_and_is_cached() {
        let fx = fixture(SenderSettings::default());
        let resolver = FakeResolver::finds("http://10.0.0.7:8000");
        let client = FakeClient::ok();
        let dispatcher = dispatcher(&fx, Arc::clone(&resolver), Arc::clone(&client));

        dispatcher.dispatch().await.unwrap();
        dispatcher.dispatch().await.unwrap();

        assert_eq!(resolver.call_count(), 1);
        assert_eq!(
            dispatcher.cached_player().as_deref(),
            Some("http://10.0.0.7:8000")
        );
    }

    #[tokio::test]
    async fn discovery_failure_aborts_without_contacting_a_player() {
        let fx = fixture(SenderSettings::default());
        let resolver = FakeResolver::failing();
        let client = FakeClient::ok();
        let dispatcher = dispatcher(&fx, Arc::clone(&resolver), Arc::clone(&client));

        let err = dispatcher.dispatch().await.unwrap_err();

        assert!(matches!(err, DispatchError::Discovery(_)));
        assert_eq!(client.announce_count(), 0);
    }

    #[tokio::test]
    async fn failed_call_to_discovered_address_evicts_the_cache() {
        let fx = fixture(SenderSettings::default());
        let resolver = FakeResolver::finds("http://10.0.0.7:8000");
        let client = FakeClient::failing();
        let dispatcher = dispatcher(&fx, Arc::clone(&resolver), Arc::clone(&client));

        let err = dispatcher.dispatch().await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Call(AnnounceCallError::Network(_))
        ));
        assert!(dispatcher.cached_player().is_none());

        // Next trigger re-resolves.
        let _ = dispatcher.dispatch().await;
        assert_eq!(resolver.call_count(), 2);
    }

    #[tokio::test]
    async fn playlist_order_and_duplicates_are_forwarded_verbatim() {
        let fx = fixture(SenderSettings {
            player_base_url: Some("http://10.0.0.5:8000".into()),
            playlist: vec!["a.mp3".into(), "b.mp3".into(), "a.mp3".into()],
        });
        let resolver = FakeResolver::failing();
        let client = FakeClient::ok();
        let dispatcher = dispatcher(&fx, resolver, Arc::clone(&client));

        dispatcher.dispatch().await.unwrap();

        let announces = client.announces.lock();
        assert_eq!(announces[0].1, vec!["a.mp3", "b.mp3", "a.mp3"]);
    }

    #[tokio::test]
    async fn empty_playlist_dispatches_a_zero_file_announce() {
        let fx = fixture(SenderSettings {
            player_base_url: Some("http://10.0.0.5:8000".into()),
            playlist: vec![],
        });
        let resolver = FakeResolver::failing();
        let client = FakeClient::ok();
        let dispatcher = dispatcher(&fx, resolver, Arc::clone(&client));

        let outcome = dispatcher.dispatch().await.unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(client.announce_count(), 1);
        assert!(client.announces.lock()[0].1.is_empty());
    }

    #[tokio::test]
    async fn playlist_edits_are_picked_up_between_dispatches() {
        let fx = fixture(SenderSettings {
            player_base_url: Some("http://10.0.0.5:8000".into()),
            playlist: vec!["a.mp3".into()],
        });
        let resolver = FakeResolver::failing();
        let client = FakeClient::ok();
        let dispatcher = dispatcher(&fx, resolver, Arc::clone(&client));

        dispatcher.dispatch().await.unwrap();

        fx.store
            .save(&SenderSettings {
                player_base_url: Some("http://10.0.0.5:8000".into()),
                playlist: vec!["b.mp3".into()],
            })
            .unwrap();

        dispatcher.dispatch().await.unwrap();

        let announces = client.announces.lock();
        assert_eq!(announces[0].1, vec!["a.mp3"]);
        assert_eq!(announces[1].1, vec!["b.mp3"]);
    }

    #[tokio::test]
    async fn startup_sync_seeds_an_empty_playlist() {
        let fx = fixture(SenderSettings {
            player_base_url: Some("http://10.0.0.5:8000".into()),
            playlist: vec![],
        });
        let resolver = FakeResolver::failing();
        let client = FakeClient::with_files(&["first.mp3", "second.mp3"]);
        let dispatcher = dispatcher(&fx, resolver, client);

        dispatcher.sync_startup().await;

        assert_eq!(fx.store.load().playlist, vec!["first.mp3"]);
    }

    #[tokio::test]
    async fn startup_sync_never_overwrites_an_existing_playlist() {
        let fx = fixture(SenderSettings {
            player_base_url: Some("http://10.0.0.5:8000".into()),
            playlist: vec!["chosen.mp3".into()],
        });
        let resolver = FakeResolver::failing();
        let client = FakeClient::with_files(&["first.mp3"]);
        let dispatcher = dispatcher(&fx, resolver, client);

        dispatcher.sync_startup().await;

        assert_eq!(fx.store.load().playlist, vec!["chosen.mp3"]);
    }

    #[tokio::test]
    async fn startup_discovery_is_not_persisted() {
        let fx = fixture(SenderSettings::default());
        let resolver = FakeResolver::finds("http://10.0.0.7:8000");
        let client = FakeClient::with_files(&["first.mp3"]);
        let dispatcher = dispatcher(&fx, resolver, client);

        dispatcher.sync_startup().await;

        assert!(fx.store.load().player_base_url.is_none());
        assert_eq!(
            dispatcher.cached_player().as_deref(),
            Some("http://10.0.0.7:8000")
        );
    }
}
