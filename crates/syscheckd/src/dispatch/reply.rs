//! Status codes and textual replies returned by the control protocol.
//!
//! Every reply begins with exactly one status token, `ok ` or `err `, followed
//! by its payload. The numeric status accompanying a reply is part of the wire
//! contract consumed by management tooling and must not drift.

use std::fmt;

use serde_json::Value;

/// Numeric outcome paired with each dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    /// Notification commands that produce no reply text.
    Accepted = 0,
    /// The syscheck section or the internal options were rendered.
    SyscheckSection = 22,
    /// The rootcheck section was rendered.
    RootcheckSection = 23,
    /// The verb is not in the command table.
    UnrecognizedCommand = 24,
    /// The section is unknown or its provider had nothing to return.
    SectionUnavailable = 35,
    /// `getconfig` was sent without a section.
    MissingArguments = 36,
}

impl StatusCode {
    /// Returns the numeric value sent to clients.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.code())
    }
}

/// A status-tagged textual reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Successful reply carrying a payload, usually compact JSON.
    Ok(String),
    /// Failed reply carrying a human-readable message.
    Err(String),
}

impl Reply {
    const OK_TOKEN: &'static str = "ok";
    const ERR_TOKEN: &'static str = "err";

    /// Builds a success reply from a configuration tree.
    ///
    /// The tree is rendered compactly and object keys keep the order in which
    /// the provider inserted them.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error when the tree cannot be rendered.
    pub fn json(tree: &Value) -> Result<Self, serde_json::Error> {
        serde_json::to_string(tree).map(Self::Ok)
    }

    /// Builds an error reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Err(message.into())
    }

    /// Returns true for `ok` replies.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns the payload without its status token.
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::Ok(payload) | Self::Err(payload) => payload,
        }
    }

    /// Encodes the reply as sent on the wire.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Ok(_) => Self::OK_TOKEN,
            Self::Err(_) => Self::ERR_TOKEN,
        };
        write!(formatter, "{token} {}", self.payload())
    }
}

/// Result of dispatching one command line.
///
/// Ownership of the reply passes to the caller. Notification commands
/// (`dbsync`, `restart`) carry no reply at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    status: StatusCode,
    reply: Option<Reply>,
}

impl DispatchOutcome {
    /// Outcome carrying a reply.
    #[must_use]
    pub const fn replied(status: StatusCode, reply: Reply) -> Self {
        Self {
            status,
            reply: Some(reply),
        }
    }

    /// Outcome of a notification command.
    #[must_use]
    pub const fn accepted() -> Self {
        Self {
            status: StatusCode::Accepted,
            reply: None,
        }
    }

    /// Status paired with the reply.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Reply, when the command produces one.
    #[must_use]
    pub const fn reply(&self) -> Option<&Reply> {
        self.reply.as_ref()
    }

    /// Encoded reply text, when the command produces one.
    #[must_use]
    pub fn reply_text(&self) -> Option<String> {
        self.reply.as_ref().map(Reply::encode)
    }

    /// Consumes the outcome, yielding the reply.
    #[must_use]
    pub fn into_reply(self) -> Option<Reply> {
        self.reply
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(StatusCode::Accepted, 0)]
    #[case(StatusCode::SyscheckSection, 22)]
    #[case(StatusCode::RootcheckSection, 23)]
    #[case(StatusCode::UnrecognizedCommand, 24)]
    #[case(StatusCode::SectionUnavailable, 35)]
    #[case(StatusCode::MissingArguments, 36)]
    fn status_codes_match_wire_contract(#[case] status: StatusCode, #[case] expected: u16) {
        assert_eq!(status.code(), expected);
        assert_eq!(status.to_string(), expected.to_string());
    }

    #[test]
    fn encodes_error_with_token() {
        assert_eq!(
            Reply::error("Unrecognized command").encode(),
            "err Unrecognized command"
        );
    }

    #[test]
    fn json_reply_is_compact_and_ordered() {
        let mut tree = serde_json::Map::new();
        tree.insert("zeta".to_owned(), json!(1));
        tree.insert("alpha".to_owned(), json!({"nested": [true, null]}));
        let reply = Reply::json(&Value::Object(tree)).expect("render tree");
        assert!(reply.is_ok());
        assert_eq!(
            reply.encode(),
            r#"ok {"zeta":1,"alpha":{"nested":[true,null]}}"#
        );
    }

    #[test]
    fn accepted_outcome_has_no_reply() {
        let outcome = DispatchOutcome::accepted();
        assert_eq!(outcome.status(), StatusCode::Accepted);
        assert!(outcome.reply().is_none());
        assert!(outcome.reply_text().is_none());
    }
}
