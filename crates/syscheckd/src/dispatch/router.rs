//! Verb routing for control command lines.
//!
//! The router splits a command line into verb and argument, looks the verb up
//! in the command table, and runs the matching handler. `getconfig` is
//! delegated to the [`ConfigDispatcher`]; `dbsync` and `restart` are
//! notifications that reach their collaborator and produce no reply.

use std::sync::Arc;

use tracing::debug;

use crate::collaborators::{Collaborators, RestartTrigger, SyncChannel};

use super::command::{CommandLine, Verb, assert_wire_text};
use super::errors::DispatchError;
use super::getconfig::ConfigDispatcher;
use super::reply::DispatchOutcome;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes control command lines to their handlers.
///
/// The router is stateless between calls and may be shared across connection
/// threads; any synchronisation is the collaborators' concern.
#[derive(Clone)]
pub struct CommandRouter {
    config: ConfigDispatcher,
    sync: Arc<dyn SyncChannel>,
    restart: Arc<dyn RestartTrigger>,
}

impl CommandRouter {
    /// Creates a router over the supplied collaborators.
    pub fn new(collaborators: Collaborators) -> Self {
        let Collaborators {
            config,
            sync,
            restart,
        } = collaborators;
        Self {
            config: ConfigDispatcher::new(config),
            sync,
            restart,
        }
    }

    /// Dispatches one command line.
    ///
    /// # Panics
    ///
    /// Panics when `line` contains a NUL byte, which no transport can deliver.
    pub fn dispatch(&self, line: &str) -> DispatchOutcome {
        assert_wire_text(line, "command line");
        let command = CommandLine::split(line);

        let outcome = match command.verb() {
            Some(Verb::GetConfig) => self.getconfig(command.argument()),
            Some(Verb::DbSync) => self.dbsync(command.argument()),
            Some(Verb::Restart) => self.restart(),
            None => DispatchError::unrecognized_command(command.verb_token()).into(),
        };

        debug!(
            target: DISPATCH_TARGET,
            verb = command.verb_token(),
            status = outcome.status().code(),
            replied = outcome.reply().is_some(),
            "command dispatched"
        );
        outcome
    }

    /// The `getconfig` sub-dispatcher used by this router.
    pub fn config(&self) -> &ConfigDispatcher {
        &self.config
    }

    fn getconfig(&self, section: Option<&str>) -> DispatchOutcome {
        match section {
            Some(section) => self.config.getconfig(section),
            None => DispatchError::MissingArguments.into(),
        }
    }

    fn dbsync(&self, message: Option<&str>) -> DispatchOutcome {
        if let Some(message) = message {
            self.sync.push_sync_message(message);
        }
        DispatchOutcome::accepted()
    }

    fn restart(&self) -> DispatchOutcome {
        self.restart.trigger_restart();
        DispatchOutcome::accepted()
    }
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommandRouter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
