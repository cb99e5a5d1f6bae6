//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::collaborators::Collaborators;
use crate::dispatch::{CommandRouter, ControlConnectionHandler};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::store::SectionStore;
use crate::sync::{SYNC_QUEUE_CAPACITY, SyncQueue, TracingSyncSink};
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::lifecycle::{self, LifecycleEvent, RestartNotifier};
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// How a daemon run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonExit {
    /// A termination signal asked the process to exit.
    Shutdown,
    /// A client asked for a restart; the caller should run the daemon again.
    Restart,
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the daemon with the production collaborators until a termination
/// signal arrives, starting it again after every `restart` command.
///
/// # Errors
///
/// Returns the first launch error of any run. A failed restart (for example a
/// monitored-sections document that no longer parses) ends supervision.
pub fn run_supervised() -> Result<(), LaunchError> {
    supervise(&production_plan()).map(|_| ())
}

/// Runs the daemon once using the production collaborators.
///
/// Blocks until a termination signal or a `restart` command arrives. The
/// control socket is closed and removed before returning.
///
/// # Errors
///
/// Returns an error when bootstrap fails, the control socket cannot be bound,
/// or signal handlers cannot be installed.
pub fn run_daemon() -> Result<DaemonExit, LaunchError> {
    run_daemon_with(&production_plan())
}

fn production_plan() -> LaunchPlan<SystemConfigLoader, SystemShutdownSignal> {
    LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
    }
}

/// Repeats [`run_daemon_with`] until a run ends for shutdown and returns how
/// many restarts were served. Every run reloads configuration and sections
/// and binds the socket afresh.
pub(crate) fn supervise<L, S>(plan: &LaunchPlan<L, S>) -> Result<usize, LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let mut restarts = 0;
    loop {
        match run_daemon_with(plan)? {
            DaemonExit::Shutdown => return Ok(restarts),
            DaemonExit::Restart => {
                restarts += 1;
                info!(target: PROCESS_TARGET, restarts, "starting the daemon again");
            }
        }
    }
}

/// Runs the daemon once with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: &LaunchPlan<L, S>) -> Result<DaemonExit, LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    let daemon = bootstrap_with(loader, reporter.as_ref())?;
    let (config, sections) = daemon.into_parts();
    let listener = SocketListener::bind(config.daemon_socket())?;
    let endpoint = listener.endpoint().clone();
    if let Some(addr) = listener.local_addr() {
        info!(target: PROCESS_TARGET, %addr, "control socket bound to TCP address");
    }

    let (events, lifecycle) = lifecycle::channel();
    let _signals = shutdown.forward(events.clone())?;
    let (sync, sync_worker) = SyncQueue::spawn(SYNC_QUEUE_CAPACITY, TracingSyncSink);
    let collaborators = Collaborators::new(
        Arc::new(SectionStore::new(sections)),
        Arc::new(sync),
        Arc::new(RestartNotifier::new(events, Arc::clone(reporter))),
    );
    let handler = Arc::new(ControlConnectionHandler::new(CommandRouter::new(
        collaborators,
    )));

    let listener_handle = listener.start(handler)?;
    reporter.listener_ready(&endpoint);

    let exit = match lifecycle.recv() {
        Ok(LifecycleEvent::Restart) => DaemonExit::Restart,
        Ok(LifecycleEvent::Shutdown { .. }) => DaemonExit::Shutdown,
        Err(_) => return Err(LaunchError::LifecycleClosed),
    };

    listener_handle.shutdown();
    listener_handle.join()?;
    let delivered = sync_worker.stop();
    info!(
        target: PROCESS_TARGET,
        ?exit,
        sync_messages = ?delivered,
        "shutdown sequence completed"
    );
    Ok(exit)
}
