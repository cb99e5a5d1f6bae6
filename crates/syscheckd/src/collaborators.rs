//! External collaborators consulted by the control dispatcher.
//!
//! The dispatcher owns no state of its own. Configuration trees, the
//! synchronization channel, and the restart mechanism are reached through
//! these traits so each can be substituted in tests or swapped for a
//! different backend without touching the command table.

use std::sync::Arc;

use serde_json::Value;

/// Source of the configuration trees returned by `getconfig`.
///
/// `None` signals that the section is not available.
pub trait ConfigProvider: Send + Sync {
    /// Returns the file integrity monitoring section.
    fn fetch_syscheck_config(&self) -> Option<Value>;

    /// Returns the rootkit detection section.
    fn fetch_rootcheck_config(&self) -> Option<Value>;

    /// Returns the internal tuning options.
    fn fetch_internal_options(&self) -> Option<Value>;
}

/// Fire-and-forget channel into the database synchronization subsystem.
pub trait SyncChannel: Send + Sync {
    /// Pushes one synchronization message.
    fn push_sync_message(&self, message: &str);
}

/// Fire-and-forget restart mechanism.
pub trait RestartTrigger: Send + Sync {
    /// Requests a restart of the daemon.
    fn trigger_restart(&self);
}

/// Capability bundle handed to the command router.
#[derive(Clone)]
pub struct Collaborators {
    pub(crate) config: Arc<dyn ConfigProvider>,
    pub(crate) sync: Arc<dyn SyncChannel>,
    pub(crate) restart: Arc<dyn RestartTrigger>,
}

impl Collaborators {
    /// Bundles the three collaborators.
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        sync: Arc<dyn SyncChannel>,
        restart: Arc<dyn RestartTrigger>,
    ) -> Self {
        Self {
            config,
            sync,
            restart,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Collaborators")
            .finish_non_exhaustive()
    }
}
