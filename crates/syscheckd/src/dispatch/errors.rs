//! Domain errors surfaced by command dispatch.
//!
//! These never propagate past the dispatcher: each variant is converted into
//! an `err` reply whose text is the variant's display representation and whose
//! status is fixed by the wire contract. Variant fields carry logging context
//! and never appear in the reply text.

use thiserror::Error;

use super::reply::{DispatchOutcome, Reply, StatusCode};

/// Recoverable failures reported back to the client as `err` replies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// `getconfig` arrived without a section name.
    #[error("SYSCOM getconfig needs arguments")]
    MissingArguments,

    /// The verb is not present in the command table.
    #[error("Unrecognized command")]
    UnrecognizedCommand { verb: String },

    /// The section is unknown or its provider returned nothing.
    #[error("Could not get requested section")]
    SectionUnavailable { section: String },
}

impl DispatchError {
    /// Returns the status code paired with this error's reply.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingArguments => StatusCode::MissingArguments,
            Self::UnrecognizedCommand { .. } => StatusCode::UnrecognizedCommand,
            Self::SectionUnavailable { .. } => StatusCode::SectionUnavailable,
        }
    }

    /// Creates an unrecognised command error.
    pub fn unrecognized_command(verb: impl Into<String>) -> Self {
        Self::UnrecognizedCommand { verb: verb.into() }
    }

    /// Creates a section unavailable error.
    pub fn section_unavailable(section: impl Into<String>) -> Self {
        Self::SectionUnavailable {
            section: section.into(),
        }
    }
}

impl From<DispatchError> for DispatchOutcome {
    fn from(error: DispatchError) -> Self {
        Self::replied(error.status(), Reply::error(error.to_string()))
    }
}
