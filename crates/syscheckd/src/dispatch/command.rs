//! Command-line parsing for the control protocol.
//!
//! A command line is a verb, optionally followed by a single whitespace
//! character and an argument. The argument is everything after that first
//! whitespace character, kept verbatim.

use std::fmt;

/// Recognised command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Retrieve a configuration section.
    GetConfig,
    /// Forward a message to the database synchronization subsystem.
    DbSync,
    /// Request a daemon restart.
    Restart,
}

impl Verb {
    /// Command table, checked in order by exact comparison.
    const TABLE: [Self; 3] = [Self::GetConfig, Self::DbSync, Self::Restart];

    /// Looks up a verb by its literal (case-sensitive).
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Self::TABLE.into_iter().find(|verb| verb.as_str() == token)
    }

    /// Returns the literal used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetConfig => "getconfig",
            Self::DbSync => "dbsync",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A command line split into its verb token and argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLine<'a> {
    verb: &'a str,
    argument: Option<&'a str>,
}

impl<'a> CommandLine<'a> {
    /// Splits a line at its first ASCII whitespace character.
    ///
    /// Without whitespace the whole line is the verb and the argument is
    /// absent.
    #[must_use]
    pub fn split(line: &'a str) -> Self {
        match line.split_once(|ch: char| ch.is_ascii_whitespace()) {
            Some((verb, argument)) => Self {
                verb,
                argument: Some(argument),
            },
            None => Self {
                verb: line,
                argument: None,
            },
        }
    }

    /// The raw verb token.
    #[must_use]
    pub const fn verb_token(&self) -> &'a str {
        self.verb
    }

    /// The recognised verb, if any.
    #[must_use]
    pub fn verb(&self) -> Option<Verb> {
        Verb::parse(self.verb)
    }

    /// The argument, with an empty argument reported as absent.
    #[must_use]
    pub fn argument(&self) -> Option<&'a str> {
        self.argument.filter(|argument| !argument.is_empty())
    }
}

/// Checks that text handed to the dispatcher could have come off the wire.
///
/// The wire contract is NUL-terminated text; framing rejects NUL bytes before
/// dispatch.
///
/// # Panics
///
/// Panics when `text` contains a NUL byte.
pub(crate) fn assert_wire_text(text: &str, what: &str) {
    assert!(
        !text.contains('\0'),
        "{what} must not contain NUL bytes; transport framing was bypassed"
    );
}
