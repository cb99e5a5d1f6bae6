use std::io;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;
use super::lifecycle::{LifecycleEvent, LifecycleSender};

/// Abstraction over shutdown notification mechanisms.
pub(crate) trait ShutdownSignal: Send + Sync {
    /// Starts forwarding termination requests to `events`.
    ///
    /// Forwarding stops when the returned [`SignalForwarder`] is dropped.
    fn forward(&self, events: LifecycleSender) -> Result<SignalForwarder, ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Guard owning a signal forwarding thread.
#[derive(Default)]
pub(crate) struct SignalForwarder {
    handle: Option<Handle>,
    thread: Option<JoinHandle<()>>,
}

impl SignalForwarder {
    /// A forwarder with nothing to stop.
    pub(crate) fn inert() -> Self {
        Self::default()
    }
}

impl Drop for SignalForwarder {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Shutdown listener backed by POSIX termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn forward(&self, events: LifecycleSender) -> Result<SignalForwarder, ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        let handle = signals.handle();
        let thread = thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(target: PROCESS_TARGET, signal, "shutdown signal received");
                events.post(LifecycleEvent::Shutdown { signal });
            }
        });
        Ok(SignalForwarder {
            handle: Some(handle),
            thread: Some(thread),
        })
    }
}
