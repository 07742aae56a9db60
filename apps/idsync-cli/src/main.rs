//! idsync - one-way identity sync from Active Directory or Entra ID into FreeIPA

use clap::Parser;
use idsync_cli::{run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}
