//! Lifecycle events driving the daemon's main loop.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use crate::collaborators::RestartTrigger;
use crate::health::HealthReporter;

use super::PROCESS_TARGET;

/// Requests delivered to the daemon's main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A termination signal arrived.
    Shutdown {
        /// Raw signal number.
        signal: i32,
    },
    /// A client asked for a restart.
    Restart,
}

/// Cloneable producer for lifecycle events.
#[derive(Debug, Clone)]
pub(crate) struct LifecycleSender {
    sender: Sender<LifecycleEvent>,
}

impl LifecycleSender {
    /// Posts an event; returns false once the main loop has stopped listening.
    pub(crate) fn post(&self, event: LifecycleEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Creates the lifecycle channel consumed by the launch sequence.
pub(crate) fn channel() -> (LifecycleSender, Receiver<LifecycleEvent>) {
    let (sender, receiver) = mpsc::channel();
    (LifecycleSender { sender }, receiver)
}

/// Restart trigger that asks the main loop to tear down and start again.
///
/// Configuration and monitored sections are reloaded and the control socket is
/// rebound; the process itself keeps running.
pub struct RestartNotifier {
    events: LifecycleSender,
    reporter: Arc<dyn HealthReporter>,
}

impl RestartNotifier {
    pub(crate) fn new(events: LifecycleSender, reporter: Arc<dyn HealthReporter>) -> Self {
        Self { events, reporter }
    }
}

impl RestartTrigger for RestartNotifier {
    fn trigger_restart(&self) {
        self.reporter.restart_requested();
        if !self.events.post(LifecycleEvent::Restart) {
            debug!(
                target: PROCESS_TARGET,
                "restart ignored; daemon is already stopping"
            );
        }
    }
}

impl std::fmt::Debug for RestartNotifier {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RestartNotifier")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
