//! Shared configuration for the syscheck daemon.
//!
//! Settings are layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file (`--config-path` or `SYSCHECK_CONFIG_PATH`),
//! then `SYSCHECK_*` environment variables, then command-line flags. The
//! monitored sections reported through the control protocol live in a separate
//! JSON document referenced by [`Config::monitor_config`].

mod defaults;
mod logging;
mod sections;
mod socket;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, SOCKET_FILE_NAME, default_log_filter,
    default_log_filter_string, default_log_format, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use sections::{
    InternalOptions, MonitorSettings, MonitorSettingsError, MonitoredDirectory,
    RootcheckInternals, RootcheckSettings, SynchronizationSettings, SyscheckInternals,
    SyscheckSettings,
};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "SYSCHECK")]
pub struct Config {
    /// Control socket the daemon listens on.
    #[serde(default = "defaults::default_socket_endpoint")]
    pub daemon_socket: SocketEndpoint,
    /// `tracing` filter expression, for example `info,syscheckd::dispatch=debug`.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// JSON document describing the monitored sections.
    #[serde(default)]
    pub monitor_config: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            monitor_config: None,
        }
    }
}

impl Config {
    /// Control socket endpoint.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Path of the monitored-sections document, when configured.
    #[must_use]
    pub fn monitor_config(&self) -> Option<&Utf8Path> {
        self.monitor_config.as_deref()
    }

    /// Loads the monitored sections referenced by this configuration.
    ///
    /// Without a configured document only the internal defaults are present.
    ///
    /// # Errors
    ///
    /// Returns an error when the referenced document cannot be read or parsed.
    pub fn load_monitor_settings(&self) -> Result<MonitorSettings, MonitorSettingsError> {
        match self.monitor_config() {
            Some(path) => MonitorSettings::load(path),
            None => Ok(MonitorSettings::default()),
        }
    }
}
