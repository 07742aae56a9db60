//! # Entra ID source
//!
//! Reads users, groups and group memberships from Microsoft Entra ID through
//! the Microsoft Graph API using the OAuth2 client-credentials flow.
//!
//! Graph responses are paged; every listing follows `@odata.nextLink` to the
//! end with a short pause between pages. Throttling (`429`) honors
//! `Retry-After` and gateway errors are retried with exponential backoff.

pub mod auth;
pub mod config;
pub mod error;
pub mod graph_client;
pub mod model;
pub mod source;

pub use auth::TokenCache;
pub use config::EntraConfig;
pub use error::{EntraError, EntraResult};
pub use graph_client::{GraphClient, ODataError, ODataResponse};
pub use source::EntraSource;
