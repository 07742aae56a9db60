//! Collaborator traits
//!
//! The reconciliation engine talks to the outside world only through these
//! traits. A [`SourceDirectory`] is read-only; a [`TargetDirectory`] is read
//! and mutated.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::model::{
    Lookup, MemberKind, MemberReference, NewPrincipal, ResolvedReference, SearchQuery,
    SourceGroup, SourcePrincipal, TargetGroup, TargetPrincipal,
};
use crate::operation::AttributeSet;

/// Base trait for every collaborator.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Display name for log lines.
    fn display_name(&self) -> &str;

    /// Establish the session (bind, login, token). Failures are fatal to a run.
    async fn connect(&self) -> ConnectorResult<()>;

    /// Verify that the remote system is reachable and the credentials work.
    ///
    /// Implementations connect first when needed.
    async fn test_connection(&self) -> ConnectorResult<()>;

    /// Release the session.
    async fn disconnect(&self) -> ConnectorResult<()> {
        Ok(())
    }
}

/// The directory identities are read from.
#[async_trait]
pub trait SourceDirectory: Collaborator {
    /// Configured query for user principals.
    fn principal_query(&self) -> SearchQuery;

    /// Configured query for groups.
    fn group_query(&self) -> SearchQuery;

    /// List user principals. The result is a one-shot snapshot.
    async fn list_principals(&self, query: &SearchQuery) -> ConnectorResult<Vec<SourcePrincipal>>;

    /// List groups with their raw member references.
    async fn list_groups(&self, query: &SearchQuery) -> ConnectorResult<Vec<SourceGroup>>;

    /// Classify a member reference as a user or a group and return its
    /// source-native name.
    async fn resolve_reference(
        &self,
        reference: &MemberReference,
    ) -> ConnectorResult<Lookup<ResolvedReference>>;

    /// Point lookup of a single principal by login.
    async fn lookup_principal(&self, login: &str) -> ConnectorResult<Lookup<SourcePrincipal>>;
}

/// The identity service converged toward the source.
#[async_trait]
pub trait TargetDirectory: Collaborator {
    async fn find_principal(&self, key: &str) -> ConnectorResult<Lookup<TargetPrincipal>>;

    /// Create a principal. A create conflict is reported as
    /// [`crate::error::ConnectorError::ObjectAlreadyExists`].
    async fn create_principal(&self, principal: &NewPrincipal) -> ConnectorResult<()>;

    /// Overwrite the given attributes; attributes not in the set are untouched.
    async fn update_principal_attributes(
        &self,
        key: &str,
        attributes: &AttributeSet,
    ) -> ConnectorResult<()>;

    async fn set_principal_enabled(&self, key: &str, enabled: bool) -> ConnectorResult<()>;

    async fn find_group(&self, key: &str) -> ConnectorResult<Lookup<TargetGroup>>;

    async fn create_group(&self, key: &str, attributes: &AttributeSet) -> ConnectorResult<()>;

    async fn update_group_attributes(
        &self,
        key: &str,
        attributes: &AttributeSet,
    ) -> ConnectorResult<()>;

    /// Add a member. An existing member is reported as
    /// [`crate::error::ConnectorError::ObjectAlreadyExists`].
    async fn add_group_member(
        &self,
        group_key: &str,
        member_key: &str,
        kind: MemberKind,
    ) -> ConnectorResult<()>;

    /// Whether the configured numeric identity range is already defined.
    async fn identity_range_exists(&self) -> ConnectorResult<bool>;

    /// Make sure a numeric identity range starting at `base` exists.
    /// An existing range is a success.
    async fn ensure_identity_range(&self, base: u32, size: u32) -> ConnectorResult<()>;
}
