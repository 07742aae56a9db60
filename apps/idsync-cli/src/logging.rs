//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{CliError, CliResult};

/// Quiet HTTP and TLS internals unless asked for explicitly.
const DEPENDENCY_DIRECTIVES: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

/// Filter directive: `RUST_LOG` wins, then `--verbose`, then the configured level.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
        if !env.trim().is_empty() {
            return env;
        }
    }
    let level = if verbose { "debug" } else { config.level.as_str() };
    format!("{level},{DEPENDENCY_DIRECTIVES}")
}

/// Install the global subscriber. Logs go to stderr, and to `config.file`
/// when set.
pub fn init(config: &LoggingConfig, verbose: bool) -> CliResult<()> {
    let directive = filter_directive(config, verbose);
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| CliError::Logging(format!("invalid log filter '{directive}': {e}")))?;

    let stderr_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::Logging(format!("cannot open {}: {e}", path.display())))?;
            let writer = Mutex::new(file);
            Some(match config.format {
                LogFormat::Json => fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(writer)
                    .boxed(),
                LogFormat::Text => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
            })
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
