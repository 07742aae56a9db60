//! # FreeIPA target
//!
//! Converges FreeIPA toward the source over the JSON-RPC API at
//! `/ipa/session/json`, authenticating with a password login and a session
//! cookie.
//!
//! FreeIPA answers such as "already active", "no modifications" and "already
//! a member" are treated as success, so replaying a run is harmless.

pub mod client;
pub mod config;
pub mod entry;
pub mod error;
pub mod target;

pub use client::FreeIpaClient;
pub use config::FreeIpaConfig;
pub use error::{FreeIpaError, FreeIpaResult};
pub use target::FreeIpaTarget;
