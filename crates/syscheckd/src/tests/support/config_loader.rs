//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use syscheck_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that provisions a Unix socket and an optional monitored-sections
/// document under a temporary directory.
#[derive(Clone)]
pub struct TestConfigLoader {
    dir: Arc<TempDir>,
    monitor_config: Option<Utf8PathBuf>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        Self {
            dir: Arc::new(dir),
            monitor_config: None,
        }
    }

    /// Writes `document` to disk and references it from the configuration.
    #[must_use]
    pub fn with_monitor_document(mut self, document: &str) -> Self {
        self.monitor_config = Some(self.write_sections(document));
        self
    }

    /// Replaces the referenced document in place; every clone of this loader
    /// sees the new content on its next load.
    pub fn rewrite_monitor_document(&self, document: &str) {
        self.write_sections(document);
    }

    /// References a monitored-sections document that does not exist.
    #[must_use]
    pub fn with_missing_monitor_document(mut self) -> Self {
        self.monitor_config = Some(self.path("missing.json"));
        self
    }

    /// Path of the control socket handed to the daemon.
    #[must_use]
    pub fn socket_path(&self) -> Utf8PathBuf {
        self.path("syscheckd.sock")
    }

    fn write_sections(&self, document: &str) -> Utf8PathBuf {
        let path = self.path("sections.json");
        fs::write(&path, document).expect("failed to write monitored sections");
        path
    }

    fn path(&self, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join(name))
            .expect("temporary path was not valid UTF-8")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            daemon_socket: SocketEndpoint::unix(self.socket_path()),
            monitor_config: self.monitor_config.clone(),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing an invalid socket on the CLI.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("syscheckd"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
