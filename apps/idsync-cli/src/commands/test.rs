//! Test command - check connectivity to source and target

use clap::Args;
use idsync_connector::traits::Collaborator;

use crate::commands::{build_source, build_target};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Arguments for the test command
#[derive(Args, Debug, Default)]
pub struct TestArgs {}

async fn check<C: Collaborator + ?Sized>(collaborator: &C) -> bool {
    let name = collaborator.display_name().to_string();
    let result = collaborator.test_connection().await;
    let _ = collaborator.disconnect().await;
    match result {
        Ok(()) => {
            println!("✓ {name}");
            true
        }
        Err(e) => {
            println!("✗ {name}: {e}");
            false
        }
    }
}

/// Execute the test command
pub async fn execute(_args: TestArgs, config: AppConfig) -> CliResult<()> {
    let source = build_source(&config.source)?;
    let target = build_target(&config.target)?;

    let source_ok = check(source.as_ref()).await;
    let target_ok = check(target.as_ref()).await;

    match (source_ok, target_ok) {
        (true, true) => {
            println!("All connections successful");
            Ok(())
        }
        (false, true) => Err(CliError::ConnectionFailed(source.display_name().to_string())),
        (true, false) => Err(CliError::ConnectionFailed(target.display_name().to_string())),
        (false, false) => Err(CliError::ConnectionFailed(format!(
            "{} and {}",
            source.display_name(),
            target.display_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idsync_connector::async_trait;
    use idsync_connector::error::{ConnectorError, ConnectorResult};
    use idsync_connector::model::{
        Lookup, MemberReference, ResolvedReference, SearchQuery, SourceGroup, SourcePrincipal,
    };
    use idsync_connector::traits::SourceDirectory;
    use std::sync::Arc;

    struct StubSource {
        reachable: bool,
    }

    #[async_trait]
    impl Collaborator for StubSource {
        fn display_name(&self) -> &str {
            "stub"
        }

        async fn connect(&self) -> ConnectorResult<()> {
            Ok(())
        }

        async fn test_connection(&self) -> ConnectorResult<()> {
            if self.reachable {
                Ok(())
            } else {
                Err(ConnectorError::connection_failed("unreachable"))
            }
        }
    }

    #[async_trait]
    impl SourceDirectory for StubSource {
        fn principal_query(&self) -> SearchQuery {
            SearchQuery::default()
        }

        fn group_query(&self) -> SearchQuery {
            SearchQuery::default()
        }

        async fn list_principals(&self, _: &SearchQuery) -> ConnectorResult<Vec<SourcePrincipal>> {
            Ok(Vec::new())
        }

        async fn list_groups(&self, _: &SearchQuery) -> ConnectorResult<Vec<SourceGroup>> {
            Ok(Vec::new())
        }

        async fn resolve_reference(
            &self,
            _: &MemberReference,
        ) -> ConnectorResult<Lookup<ResolvedReference>> {
            Ok(Lookup::NotFound)
        }

        async fn lookup_principal(&self, _: &str) -> ConnectorResult<Lookup<SourcePrincipal>> {
            Ok(Lookup::NotFound)
        }
    }

    #[tokio::test]
    async fn test_check_through_source_trait_object() {
        let up: Arc<dyn SourceDirectory> = Arc::new(StubSource { reachable: true });
        let down: Arc<dyn SourceDirectory> = Arc::new(StubSource { reachable: false });
        assert!(check(up.as_ref()).await);
        assert!(!check(down.as_ref()).await);
    }
}
