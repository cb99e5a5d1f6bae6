//! Process lifecycle: shutdown signals, in-process restart, and the launch
//! sequence tying bootstrap, dispatch, and transport together.

mod errors;
pub(crate) mod launch;
pub(crate) mod lifecycle;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::{DaemonExit, run_daemon, run_supervised};
pub use lifecycle::{LifecycleEvent, RestartNotifier};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
