//! Control-command daemon for the integrity monitoring agent.
//!
//! `syscheckd` listens on a local control socket for single-line commands
//! from management tooling. The [`dispatch`] module maps each line to one of
//! three verbs:
//!
//! - `getconfig <section>` returns the named configuration section as compact
//!   JSON behind an `ok` token, or an `err` message.
//! - `dbsync <payload>` forwards the payload to the database synchronization
//!   queue.
//! - `restart` asks the daemon to reload its configuration and rebind the
//!   socket.
//!
//! The dispatcher owns no state. Configuration trees, the synchronization
//! queue, and the restart mechanism are reached through the traits in
//! [`collaborators`]; the daemon wires in [`SectionStore`], [`SyncQueue`],
//! and [`RestartNotifier`] at launch.

mod bootstrap;
pub mod collaborators;
pub mod dispatch;
mod health;
mod process;
mod store;
mod sync;
mod telemetry;
mod transport;

pub use bootstrap::{BootstrapError, ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with};
pub use collaborators::{Collaborators, ConfigProvider, RestartTrigger, SyncChannel};
pub use dispatch::{CommandRouter, DispatchOutcome, Reply, StatusCode};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    DaemonExit, LaunchError, LifecycleEvent, RestartNotifier, run_daemon, run_supervised,
};
pub use store::SectionStore;
pub use sync::{SYNC_QUEUE_CAPACITY, SyncQueue, SyncSink, SyncWorker, TracingSyncSink};
pub use telemetry::TelemetryError;

#[cfg(test)]
mod tests;
