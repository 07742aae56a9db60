//! # idsync reconciliation engine
//!
//! Converges a target identity service toward a source directory.
//!
//! - [`identity`] - numeric identities derived from security identifiers
//! - [`mapping`] - source records projected onto target attributes
//! - [`scope`] - include/exclude filtering
//! - [`principal`], [`group`], [`membership`] - reconcilers producing [`action::SyncAction`]s
//! - [`apply`] - live or dry-run application of actions
//! - [`orchestrator`] - phase ordering, failure isolation and statistics
//!
//! ## Example
//!
//! ```ignore
//! use idsync_engine::prelude::*;
//!
//! let orchestrator = SyncOrchestrator::new(source, target, SyncConfig::default());
//! let report = orchestrator.run(RunOptions { dry_run: true, ..Default::default() }).await?;
//! println!("{}", report.to_json());
//! ```

pub mod action;
pub mod apply;
pub mod config;
pub mod error;
pub mod group;
pub mod identity;
pub mod mapping;
pub mod membership;
pub mod orchestrator;
pub mod principal;
pub mod scope;
pub mod statistics;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::action::{EntityKind, SyncAction};
    pub use crate::config::{RunOptions, SyncConfig};
    pub use crate::error::{SyncError, SyncResult};
    pub use crate::identity::{derive_from_raw, derive_identity, identifier_to_string};
    pub use crate::mapping::{map_group, map_principal, MappedGroup, MappedPrincipal};
    pub use crate::orchestrator::SyncOrchestrator;
    pub use crate::scope::{in_scope, ScopeFilter};
    pub use crate::statistics::{SyncReport, SyncStats};
}
