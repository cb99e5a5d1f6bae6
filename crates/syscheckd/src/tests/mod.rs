//! Test suites for the control daemon.

mod dispatch_behaviour;
mod support;
