use std::{io::IsTerminal, str::FromStr};

use graphql_functions_config::log::{LogFormat, LoggingConfig};
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("failed to initialize env-filter logger: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("a global logger was already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Function hosts may reuse a process across invocations, so a second call fails with
/// `LoggerError::AlreadyInitialized` instead of panicking.
pub fn configure_logging(config: &LoggingConfig) -> Result<(), LoggerError> {
    let timer = UtcTime::rfc_3339();
    let filter = EnvFilter::from_str(config.env_filter_str())?;
    let registry = tracing_subscriber::registry();
    let is_terminal = std::io::stdout().is_terminal();

    match config.format {
        LogFormat::PrettyTree => registry
            .with(
                tracing_tree::HierarchicalLayer::new(2)
                    .with_ansi(is_terminal)
                    .with_bracketed_fields(true)
                    .with_deferred_spans(false)
                    .with_wraparound(25)
                    .with_indent_lines(true)
                    .with_timer(tracing_tree::time::Uptime::default())
                    .with_thread_names(false)
                    .with_thread_ids(false)
                    .with_targets(false),
            )
            .with(filter)
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_timer(timer))
            .with(filter)
            .try_init()?,
        LogFormat::PrettyCompact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(is_terminal)
                    .with_timer(timer),
            )
            .with(filter)
            .try_init()?,
    };

    Ok(())
}
