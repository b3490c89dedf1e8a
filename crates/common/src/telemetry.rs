//! Structured logging setup.
//!
//! The service binary installs one process-wide `tracing` subscriber here.
//! Library crates only emit events and spans through `tracing`.

use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with the active span chain
    Json,
    /// Multi-line human-readable output, with span close timings
    Pretty,
}

impl LogFormat {
    /// `Json` when `json_logging` is set, otherwise `Pretty`.
    pub fn from_flag(json_logging: bool) -> Self {
        if json_logging {
            Self::Json
        } else {
            Self::Pretty
        }
    }

    fn layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        match self {
            Self::Json => layer
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
            Self::Pretty => layer.pretty().with_span_events(FmtSpan::CLOSE).boxed(),
        }
    }
}

/// Build the level filter. `RUST_LOG` wins over the configured level.
fn level_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Install the global subscriber.
///
/// # Arguments
///
/// * `service_name` - Name of the service, attached to the startup event
/// * `json_format` - Whether to use JSON formatting for logs
/// * `log_level` - Log level filter (e.g., "info", "debug"), overridden by `RUST_LOG`
///
/// # Examples
///
/// ```no_run
/// use leaders_common::telemetry::init_tracing;
///
/// init_tracing("leaders", false, "info").expect("Failed to initialize tracing");
/// ```
pub fn init_tracing(service_name: &str, json_format: bool, log_level: &str) -> Result<()> {
    let format = LogFormat::from_flag(json_format);

    Registry::default()
        .with(format.layer().with_filter(level_filter(log_level)))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(service = %service_name, format = ?format, "Tracing initialized");
    Ok(())
}
