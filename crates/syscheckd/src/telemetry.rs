//! Structured telemetry for the daemon.
//!
//! The first start installs the global subscriber. Its filter sits behind a
//! reload layer, so every later start (one per `restart`) applies the freshly
//! loaded `log_filter`. The output format is fixed at first start; a changed
//! `log_format` is reported and takes effect on the next process start.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError, warn};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, reload};

use syscheck_config::{Config, LogFormat};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

static TELEMETRY: OnceCell<Telemetry> = OnceCell::new();

type Filtered = Layered<reload::Layer<EnvFilter, Registry>, Registry>;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
    /// The installed subscriber rejected the reloaded filter.
    #[error("failed to apply reloaded log filter: {0}")]
    Reload(#[source] reload::Error),
}

/// Live controls of the installed subscriber.
struct Telemetry {
    filter: reload::Handle<EnvFilter, Registry>,
    format: LogFormat,
}

impl Telemetry {
    /// Swaps in the filter from `config`. The previous filter stays active
    /// when the new one does not parse.
    fn apply(&self, config: &Config) -> Result<(), TelemetryError> {
        let filter = parse_filter(config)?;
        self.filter.reload(filter).map_err(TelemetryError::Reload)?;
        if config.log_format() != self.format {
            warn!(
                target: TELEMETRY_TARGET,
                configured = %config.log_format(),
                active = %self.format,
                "log format change applies on the next process start"
            );
        }
        Ok(())
    }
}

/// Installs the global subscriber on first use and reloads its filter on
/// every later call.
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    let mut installed = false;
    let telemetry = TELEMETRY.get_or_try_init(|| {
        installed = true;
        install(config)
    })?;
    if installed {
        Ok(())
    } else {
        telemetry.apply(config)
    }
}

fn install(config: &Config) -> Result<Telemetry, TelemetryError> {
    let (subscriber, telemetry) = assemble(config)?;
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    Ok(telemetry)
}

fn assemble(
    config: &Config,
) -> Result<(impl Subscriber + Send + Sync + 'static, Telemetry), TelemetryError> {
    let (filter, handle) = reload::Layer::new(parse_filter(config)?);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(output_layer(config.log_format()));
    let telemetry = Telemetry {
        filter: handle,
        format: config.log_format(),
    };
    Ok((subscriber, telemetry))
}

fn output_layer(format: LogFormat) -> Box<dyn Layer<Filtered> + Send + Sync> {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(true)
        .with_thread_names(false)
        .with_timer(fmt::time::UtcTime::rfc_3339());
    match format {
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn parse_filter(config: &Config) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter(error.to_string()))
}
