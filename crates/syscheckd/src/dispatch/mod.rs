//! Control command dispatch.
//!
//! Management tooling talks to the daemon with single-line commands of the
//! form `<verb>[ <argument>]`:
//!
//! | Command              | Effect                                   | Status |
//! |----------------------|------------------------------------------|--------|
//! | `getconfig <section>`| `ok <json>` for `syscheck` or `internal` | 22     |
//! |                      | `ok <json>` for `rootcheck`              | 23     |
//! | `dbsync <payload>`   | forwards the payload, no reply           | 0      |
//! | `restart`            | requests a restart, no reply             | 0      |
//!
//! Failures reply with `err <message>`: unknown verbs (24), unknown or
//! unavailable sections (35), and `getconfig` without a section (36).

mod command;
mod errors;
mod getconfig;
mod handler;
mod reply;
mod router;

pub use self::command::{CommandLine, Verb};
pub use self::errors::DispatchError;
pub use self::getconfig::{ConfigDispatcher, Section};
pub use self::handler::ControlConnectionHandler;
pub use self::reply::{DispatchOutcome, Reply, StatusCode};
pub use self::router::CommandRouter;
