//! Listener errors.

use std::io;

use thiserror::Error;

/// Failures while binding or running the control socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host did not resolve to any address.
    #[error("cannot resolve control endpoint {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// The operating system refused the bind.
    #[error("cannot bind control endpoint {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// The socket could not be switched to polling accepts.
    #[error("cannot poll control socket for clients: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[cfg(not(unix))]
    #[error("unix control sockets are unavailable on this platform: {endpoint}")]
    UnsupportedUnix { endpoint: String },
    /// Another daemon still answers on the socket path.
    #[error("control socket {path} is already served by a running daemon")]
    InUse { path: String },
    /// Something other than a socket sits at the socket path.
    #[error("{path} exists and is not a socket")]
    NotASocket { path: String },
    /// A leftover socket file could not be inspected or removed.
    #[error("cannot reclaim stale control socket {path}: {source}")]
    StaleSocket {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("accept thread panicked")]
    ThreadPanic,
}
