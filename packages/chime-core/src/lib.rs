//! Chime Core - shared library for the Chime button-to-speaker system.
//!
//! This crate provides the core functionality for Chime, a system that turns
//! a physical button press into audio playback on a remote speaker over the
//! local network. It is shared by the three service binaries:
//!
//! - `chime-keyd`: watches input devices and triggers the sender (debounced)
//! - `chime-sender`: forwards the configured playlist to the player
//! - `chime-player`: plays announced files through the speaker
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`debounce`]: monotonic-clock debounce filter for raw key events
//! - [`discovery`]: mDNS resolution of the player's network address
//! - [`advertise`]: player-side mDNS service advertisement
//! - [`dispatch`]: sender-side announce forwarding with discovery fallback
//! - [`announce`]: player-side sequential playback state machine
//! - [`playback`]: playback backend abstraction (mpg123 by default)
//! - [`library`]: local audio file library
//! - [`store`]: JSON-file configuration store
//! - [`api`]: axum routers for the player and sender HTTP APIs
//! - [`error`]: centralized error types
//!
//! # Abstraction Traits
//!
//! Core logic is decoupled from hardware and the network through narrow
//! capability traits, so the sequencing and dispatch logic can be tested
//! with fakes:
//!
//! - [`PlaybackBackend`](playback::PlaybackBackend): plays one file
//! - [`PlayerResolver`](dispatch::PlayerResolver): resolves the player URL
//! - [`AnnounceClient`](dispatch::AnnounceClient): performs the announce call

#![warn(clippy::all)]

pub mod advertise;
pub mod announce;
pub mod api;
pub mod debounce;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod library;
pub mod playback;
pub mod store;

pub use advertise::MdnsAdvertiser;
pub use announce::{Announcer, FileOutcome, FileStatus};
pub use api::{serve, PlayerState, SenderState};
pub use debounce::{Debouncer, TriggerEvent, DEFAULT_DEBOUNCE_WINDOW};
pub use discovery::{create_daemon, resolve_player, DiscoveryError, ResolverConfig};
pub use dispatch::{AnnounceClient, DispatchError, Dispatcher, HttpAnnounceClient, MdnsResolver};
pub use error::{ChimeError, ChimeResult};
pub use library::AudioLibrary;
pub use playback::{BackendError, Mpg123Backend, PlaybackBackend};
pub use store::{JsonStore, PlayerSettings, SenderSettings};
