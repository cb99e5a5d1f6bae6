//! Typed monitored sections served through `getconfig`.
//!
//! The daemon reads these from a JSON document referenced by
//! [`Config::monitor_config`](crate::Config::monitor_config). Each section is
//! optional except the internal options, which always fall back to the
//! built-in tuning defaults. Field declaration order is the order in which the
//! sections are rendered back to clients.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Root of the monitored-sections document.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSettings {
    /// File integrity monitoring settings.
    pub syscheck: Option<SyscheckSettings>,
    /// Rootkit detection settings.
    pub rootcheck: Option<RootcheckSettings>,
    /// Internal tuning options shared by both scanners.
    pub internal: InternalOptions,
}

impl MonitorSettings {
    /// Loads the monitored sections from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or does not match the
    /// expected schema.
    pub fn load(path: &Utf8Path) -> Result<Self, MonitorSettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| MonitorSettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| MonitorSettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses the monitored sections from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the text is not a valid
    /// sections document.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

/// File integrity monitoring settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SyscheckSettings {
    pub disabled: bool,
    /// Seconds between scheduled scans.
    pub frequency: u64,
    pub scan_on_start: bool,
    pub skip_nfs: bool,
    pub skip_dev: bool,
    pub skip_sys: bool,
    pub skip_proc: bool,
    pub directories: Vec<MonitoredDirectory>,
    /// Paths excluded from scans.
    pub ignore: Vec<String>,
    /// Paths whose content changes are never reported as diffs.
    pub nodiff: Vec<String>,
    /// Maximum events per second emitted by the scanner.
    pub max_eps: u32,
    pub synchronization: SynchronizationSettings,
}

impl Default for SyscheckSettings {
    fn default() -> Self {
        Self {
            disabled: false,
            frequency: 43_200,
            scan_on_start: true,
            skip_nfs: true,
            skip_dev: true,
            skip_sys: true,
            skip_proc: true,
            directories: Vec::new(),
            ignore: Vec::new(),
            nodiff: Vec::new(),
            max_eps: 100,
            synchronization: SynchronizationSettings::default(),
        }
    }
}

/// A directory watched by the integrity scanner.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MonitoredDirectory {
    pub path: String,
    #[serde(default = "default_recursion_level")]
    pub recursion_level: u32,
    #[serde(default)]
    pub realtime: bool,
    #[serde(default)]
    pub whodata: bool,
    #[serde(default)]
    pub report_changes: bool,
    /// Attribute checks enabled for this directory (for example `size`,
    /// `perm`, `sha256sum`).
    #[serde(default = "default_checks")]
    pub checks: Vec<String>,
}

fn default_recursion_level() -> u32 {
    256
}

fn default_checks() -> Vec<String> {
    ["size", "perm", "owner", "group", "mtime", "inode", "sha256sum"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Database synchronization settings for the integrity scanner.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SynchronizationSettings {
    pub enabled: bool,
    /// Seconds between synchronization attempts.
    pub interval: u64,
    /// Upper bound for the back-off between attempts.
    pub max_interval: u64,
    pub max_eps: u32,
}

impl Default for SynchronizationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 300,
            max_interval: 3_600,
            max_eps: 10,
        }
    }
}

/// Rootkit detection settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RootcheckSettings {
    pub disabled: bool,
    pub frequency: u64,
    pub base_directory: String,
    /// Signature database of files known to belong to rootkits.
    pub rootkit_files: Option<Utf8PathBuf>,
    /// Signature database of trojaned binaries.
    pub rootkit_trojans: Option<Utf8PathBuf>,
    pub scanall: bool,
    pub skip_nfs: bool,
    pub check_dev: bool,
    pub check_files: bool,
    pub check_if: bool,
    pub check_pids: bool,
    pub check_ports: bool,
    pub check_sys: bool,
    pub check_trojans: bool,
}

impl Default for RootcheckSettings {
    fn default() -> Self {
        Self {
            disabled: false,
            frequency: 43_200,
            base_directory: String::new(),
            rootkit_files: None,
            rootkit_trojans: None,
            scanall: false,
            skip_nfs: true,
            check_dev: true,
            check_files: true,
            check_if: true,
            check_pids: true,
            check_ports: true,
            check_sys: true,
            check_trojans: true,
        }
    }
}

/// Internal tuning options.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InternalOptions {
    pub syscheck: SyscheckInternals,
    pub rootcheck: RootcheckInternals,
}

/// Internal tuning for the integrity scanner.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SyscheckInternals {
    /// Debug verbosity, 0 to 2.
    pub debug: u8,
    /// Seconds to pause after `sleep_after` files.
    pub sleep: u32,
    pub sleep_after: u32,
    /// Milliseconds between real-time event batches.
    pub rt_delay: u32,
    pub default_max_depth: u32,
    pub symlink_scan_interval: u64,
    /// Largest file, in KiB, considered for content diffs.
    pub file_max_size: u64,
}

impl Default for SyscheckInternals {
    fn default() -> Self {
        Self {
            debug: 0,
            sleep: 1,
            sleep_after: 100,
            rt_delay: 5,
            default_max_depth: 256,
            symlink_scan_interval: 600,
            file_max_size: 1_024,
        }
    }
}

/// Internal tuning for the rootkit scanner.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RootcheckInternals {
    /// Milliseconds to pause between checks.
    pub sleep: u32,
}

impl Default for RootcheckInternals {
    fn default() -> Self {
        Self { sleep: 50 }
    }
}

/// Errors raised while loading the monitored-sections document.
#[derive(Debug, Error)]
pub enum MonitorSettingsError {
    /// The document could not be read.
    #[error("failed to read monitored sections '{path}': {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document was not valid JSON or did not match the schema.
    #[error("invalid monitored sections '{path}': {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
