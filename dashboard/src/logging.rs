//! Tracing setup for `halal-dash`.
//!
//! Stdout carries exactly one JSON document per run, so every log line goes
//! to stderr. `RUST_LOG` wins over `--log-level` when both are set.

use clap::ValueEnum;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Directives applied when `RUST_LOG` is unset. Core diagnostics are
/// emitted at WARN and stay visible.
pub const DEFAULT_FILTER: &str = "halal_dash=info,halal_lending_core=warn";

/// Shape of each stderr log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Colored, one event per line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs the global subscriber. Panics if one is already installed.
///
/// ```text
/// RUST_LOG=halal_lending_core=debug halal-dash loans -s chain.json --all
/// ```
pub fn init_logging(directives: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let output: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Pretty => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry().with(output).with(filter).init();
    tracing::debug!(?format, directives, "tracing installed");
}
