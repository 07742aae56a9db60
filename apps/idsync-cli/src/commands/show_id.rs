//! Show-id command - explain a user's numeric identities

use clap::Args;
use idsync_connector::model::{Lookup, SourcePrincipal};
use idsync_connector::traits::SourceDirectory;
use idsync_engine::identity::{derive_from_relative, derive_identity};

use crate::commands::build_source;
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Worked example used in the guidance text.
const EXAMPLE_UID: u32 = 1_668_601_105;
const EXAMPLE_RID: u32 = 1105;

/// Arguments for the show-id command
#[derive(Args, Debug)]
pub struct ShowIdArgs {
    /// Login name of the user to inspect
    #[arg(short, long)]
    pub user: String,
}

/// Render the identity report for one principal.
pub fn render(principal: &SourcePrincipal, id_range_base: u32) -> CliResult<String> {
    let sid = principal.sid.as_ref().ok_or_else(|| {
        CliError::Validation(format!(
            "user '{}' has no parsable security identifier",
            principal.login
        ))
    })?;
    let rid = sid.rid();

    let mut lines = vec![
        format!("User:              {}", principal.login),
        format!("SID:               {sid}"),
        format!("RID:               {rid}"),
        format!("id_range_base:     {id_range_base}"),
    ];
    match derive_identity(sid, id_range_base) {
        Some(uid) => lines.push(format!("Calculated UID:    {uid}")),
        None => lines.push("Calculated UID:    overflows the 32-bit id space".to_string()),
    }

    if let Some(uid_number) = principal.uid_number {
        lines.push(format!("uidNumber (AD):    {uid_number}"));
    }
    match (principal.gid_number, principal.primary_group_id) {
        (Some(gid_number), _) => lines.push(format!("gidNumber (AD):    {gid_number}")),
        (None, Some(primary)) => match derive_from_relative(primary, id_range_base) {
            Some(gid) => lines.push(format!("GID (primary group {primary}): {gid}")),
            None => lines.push(format!("GID (primary group {primary}): overflows")),
        },
        (None, None) => {}
    }

    lines.push(String::new());
    lines.push(format!(
        "To give this user an existing Linux UID, set id_range_base = <your_linux_uid> - {rid}."
    ));
    lines.push(format!(
        "Example: UID {EXAMPLE_UID} with RID {EXAMPLE_RID} needs id_range_base = {}.",
        EXAMPLE_UID - EXAMPLE_RID
    ));
    Ok(lines.join("\n"))
}

/// Execute the show-id command
pub async fn execute(args: ShowIdArgs, config: AppConfig) -> CliResult<()> {
    let source = build_source(&config.source)?;
    source.connect().await?;
    let lookup = source.lookup_principal(&args.user).await;
    let _ = source.disconnect().await;

    let principal = match lookup? {
        Lookup::Found(p) => p,
        Lookup::NotFound => {
            return Err(CliError::NotFound(format!("user '{}'", args.user)));
        }
    };

    println!("{}", render(&principal, config.sync.id_range_base)?);
    Ok(())
}
