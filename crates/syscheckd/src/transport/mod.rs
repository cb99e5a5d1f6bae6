//! Control socket transport.
//!
//! [`SocketListener`] binds the configured endpoint and polls for clients on a
//! background thread. Every accepted client gets a read deadline, is boxed as
//! a [`Connection`], and is served by the [`ConnectionHandler`] on its own
//! thread.

use std::io::{Read, Write};

mod errors;
mod framing;
mod listener;
#[cfg(test)]
mod listener_tests;
#[cfg(test)]
mod test_utils;

pub(crate) use self::errors::ListenerError;
pub(crate) use self::framing::read_command_line;
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Byte stream to one accepted client.
pub(crate) trait Connection: Read + Write + Send {}

impl<T> Connection for T where T: Read + Write + Send {}

/// Serves accepted clients. Implementations must not panic.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    fn handle(&self, connection: Box<dyn Connection>);
}
