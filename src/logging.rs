//! Structured logging setup.
//!
//! Logs go to stdout through a non-blocking writer so the function host can
//! collect them. JSON is the default; pretty output is for local runs.
//! `RUST_LOG` overrides the default filter.

use std::fmt;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "funcapp_settings=info,tower_http=info";

/// Output format for stdout logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, multi-line.
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Pretty => f.write_str("pretty"),
        }
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered lines when dropped; keep it alive
/// until the process exits.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(
    format: LogFormat,
) -> Result<WorkerGuard, tracing_subscriber::util::TryInitError> {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = env_filter(DEFAULT_FILTER);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(writer)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?,
    }

    tracing::debug!(%format, "logger initialized");
    Ok(guard)
}
