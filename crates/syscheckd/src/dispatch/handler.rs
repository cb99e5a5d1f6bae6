//! Connection handler that serves control command lines.
//!
//! Each connection carries one command line. The reply, when the command has
//! one, is written back followed by `\n` and the connection is closed.
//! Notification commands close the connection without writing anything.

use std::io::Write;

use tracing::{debug, warn};

use crate::transport::{Connection, ConnectionHandler, read_command_line};

use super::reply::Reply;
use super::router::{CommandRouter, DISPATCH_TARGET};

/// Serves control connections through a [`CommandRouter`].
#[derive(Debug, Clone)]
pub struct ControlConnectionHandler {
    router: CommandRouter,
}

impl ControlConnectionHandler {
    /// Creates a handler that dispatches through `router`.
    pub fn new(router: CommandRouter) -> Self {
        Self { router }
    }

    fn serve(&self, mut connection: Box<dyn Connection>) {
        let line = match read_command_line(&mut connection) {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without a command");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected command line");
                return;
            }
        };

        let Some(reply) = self.router.dispatch(&line).into_reply() else {
            return;
        };
        if let Err(error) = write_reply(&mut connection, &reply) {
            warn!(target: DISPATCH_TARGET, %error, "failed to write reply");
        }
    }
}

impl ConnectionHandler for ControlConnectionHandler {
    fn handle(&self, connection: Box<dyn Connection>) {
        self.serve(connection);
    }
}

fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> std::io::Result<()> {
    writeln!(writer, "{reply}")?;
    writer.flush()
}
