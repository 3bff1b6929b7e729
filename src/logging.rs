//! Diagnostic output for the command line front end.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to binaries. `RUST_LOG` wins over the verbosity flag when it is set.

use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    TryInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Each `-v` lowers the threshold one step: warnings, then debug, then
/// trace.
pub fn init(verbosity: u8) -> Result<(), LoggingError> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::new(format!("temporal_engine={level},temporal={level}")),
    };

    let stderr_layer = tracing_subscriber::Layer::with_filter(
        tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr),
        filter,
    );

    tracing_subscriber::registry().with(stderr_layer).try_init()?;
    Ok(())
}
