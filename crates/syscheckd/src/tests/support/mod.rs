//! Shared doubles for the daemon test suites.

mod config_loader;
mod reporter;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};

/// Monitored-sections document used across scenarios.
pub const SAMPLE_SECTIONS: &str = r#"{
    "syscheck": {
        "frequency": 3600,
        "directories": [{"path": "/etc", "realtime": true}]
    },
    "internal": {
        "syscheck": {"sleep": 2}
    }
}"#;

/// [`SAMPLE_SECTIONS`] after an operator slows the integrity scan and enables
/// rootkit detection.
pub const RELOADED_SECTIONS: &str = r#"{
    "syscheck": {
        "frequency": 7200,
        "directories": [{"path": "/etc", "realtime": true}]
    },
    "rootcheck": {
        "frequency": 600,
        "base_directory": "/"
    },
    "internal": {
        "syscheck": {"sleep": 2}
    }
}"#;
