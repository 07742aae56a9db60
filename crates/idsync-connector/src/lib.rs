//! # idsync collaborator framework
//!
//! Shared vocabulary between the reconciliation engine and the directory
//! collaborators it drives:
//!
//! - [`traits`] - `SourceDirectory` and `TargetDirectory` capability traits
//! - [`model`] - fixed-shape source/target records and `Lookup`
//! - [`sid`] - security identifier normalization
//! - [`operation`] - `AttributeSet` for optional and residual attributes
//! - [`error`] - `ConnectorError` with connection classification
//! - [`config`] - shared connection settings
//!
//! ## Example
//!
//! ```ignore
//! use idsync_connector::prelude::*;
//!
//! source.connect().await?;
//! let query = source.principal_query();
//! for principal in source.list_principals(&query).await? {
//!     match target.find_principal(&principal.login).await? {
//!         Lookup::Found(existing) => { /* reconcile */ }
//!         Lookup::NotFound => { /* create */ }
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod operation;
pub mod sid;
pub mod traits;

/// Prelude module for convenient imports.
///
/// ```
/// use idsync_connector::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{CollaboratorConfig, ConnectionSettings};
    pub use crate::error::{ConnectorError, ConnectorResult};
    pub use crate::model::{
        Lookup, MemberKind, MemberReference, NewPrincipal, ResolvedReference, SearchQuery,
        SourceGroup, SourcePrincipal, TargetGroup, TargetPrincipal,
    };
    pub use crate::operation::{AttributeSet, AttributeValue};
    pub use crate::sid::{RawSid, SecurityIdentifier};
    pub use crate::traits::{Collaborator, SourceDirectory, TargetDirectory};
}

// Re-export async_trait for collaborator implementors
pub use async_trait::async_trait;
