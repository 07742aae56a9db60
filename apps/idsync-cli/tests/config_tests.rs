//! Configuration file loading.

use idsync_cli::config::{AppConfig, SourceConfig};
use idsync_cli::CliError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_active_directory_config() {
    let file = write_config(
        r#"
source:
  type: active_directory
  host: dc01.example.com
  port: 636
  use_ssl: true
  base_dn: DC=example,DC=com
  bind_dn: CN=svc-sync,OU=Service,DC=example,DC=com
  bind_password: secret
  page_size: 500
target:
  server: https://ipa.example.com
  username: sync-admin
  password: secret
  verify_ssl: false
sync:
  id_range_base: 1668600000
  default_email_domain: example.com
  user_exclude_filter: [krbtgt, Guest]
  sync_group_memberships: false
"#,
    );

    let config = AppConfig::load(file.path()).unwrap();
    match &config.source {
        SourceConfig::ActiveDirectory(ad) => {
            assert_eq!(ad.host, "dc01.example.com");
            assert_eq!(ad.port, 636);
            assert_eq!(ad.page_size, 500);
        }
        other => panic!("expected Active Directory source, got {}", other.kind()),
    }
    assert_eq!(config.target.username, "sync-admin");
    assert!(!config.target.verify_ssl);
    assert_eq!(config.sync.id_range_base, 1_668_600_000);
    assert_eq!(config.sync.user_exclude_filter, vec!["krbtgt", "Guest"]);
    assert!(!config.sync.sync_group_memberships);
    assert!(config.sync.sync_users);
}

#[test]
fn test_load_entra_config() {
    let file = write_config(
        r#"
source:
  type: entra
  tenant_id: 00000000-0000-0000-0000-000000000001
  client_id: 00000000-0000-0000-0000-000000000002
  client_secret: s3cret
  group_names: [Engineering, "Site Reliability"]
target:
  server: ipa.example.com
  password: secret
"#,
    );

    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.source.kind(), "entra");
    let SourceConfig::Entra(entra) = &config.source else {
        panic!("expected Entra source");
    };
    assert_eq!(entra.group_names.len(), 2);
    assert!(!format!("{config:?}").contains("s3cret"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let err = AppConfig::load(&path).unwrap_err();
    assert!(matches!(err, CliError::Config(_)), "{err:?}");
    assert!(err.to_string().contains("configuration file not found"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_malformed_yaml() {
    let file = write_config("source: [unterminated\n");
    let err = AppConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, CliError::InvalidConfig(_)), "{err:?}");
}

#[test]
fn test_missing_source_section() {
    let file = write_config("target:\n  server: ipa.example.com\n  password: x\n");
    let err = AppConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("missing required section: source"));
}
