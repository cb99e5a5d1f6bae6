//! `getconfig` sub-dispatcher.
//!
//! Maps a section name to one configuration provider call and renders the
//! returned tree as compact JSON behind an `ok` token.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::collaborators::ConfigProvider;

use super::command::assert_wire_text;
use super::errors::DispatchError;
use super::reply::{DispatchOutcome, Reply, StatusCode};
use super::router::DISPATCH_TARGET;

/// Configuration sections served by `getconfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// File integrity monitoring settings.
    Syscheck,
    /// Rootkit detection settings.
    Rootcheck,
    /// Internal tuning options.
    Internal,
}

impl Section {
    /// Returns the literal used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Syscheck => "syscheck",
            Self::Rootcheck => "rootcheck",
            Self::Internal => "internal",
        }
    }

    fn fetch(self, provider: &dyn ConfigProvider) -> Option<Value> {
        match self {
            Self::Syscheck => provider.fetch_syscheck_config(),
            Self::Rootcheck => provider.fetch_rootcheck_config(),
            Self::Internal => provider.fetch_internal_options(),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Routing entry binding a section literal to its success status.
#[derive(Debug, Clone, Copy)]
struct SectionRoute {
    section: Section,
    status: StatusCode,
}

impl SectionRoute {
    const TABLE: [Self; 3] = [
        Self {
            section: Section::Syscheck,
            status: StatusCode::SyscheckSection,
        },
        Self {
            section: Section::Rootcheck,
            status: StatusCode::RootcheckSection,
        },
        Self {
            section: Section::Internal,
            status: StatusCode::SyscheckSection,
        },
    ];

    fn lookup(name: &str) -> Option<Self> {
        Self::TABLE.iter().copied().find(|route| route.section.as_str() == name)
    }
}

/// Resolves `getconfig` requests against a configuration provider.
#[derive(Clone)]
pub struct ConfigDispatcher {
    provider: Arc<dyn ConfigProvider>,
}

impl ConfigDispatcher {
    /// Creates a dispatcher backed by `provider`.
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self { provider }
    }

    /// Renders the named section.
    ///
    /// Unknown sections and sections whose provider returns nothing produce
    /// the same `err` reply and status.
    ///
    /// # Panics
    ///
    /// Panics when `section` contains a NUL byte, which no transport can
    /// deliver.
    pub fn getconfig(&self, section: &str) -> DispatchOutcome {
        assert_wire_text(section, "section name");
        match self.render(section) {
            Ok(outcome) => outcome,
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    section,
                    status = error.status().code(),
                    "section unavailable"
                );
                error.into()
            }
        }
    }

    fn render(&self, name: &str) -> Result<DispatchOutcome, DispatchError> {
        let route =
            SectionRoute::lookup(name).ok_or_else(|| DispatchError::section_unavailable(name))?;
        let tree = route
            .section
            .fetch(self.provider.as_ref())
            .ok_or_else(|| DispatchError::section_unavailable(name))?;
        let reply = Reply::json(&tree).map_err(|error| {
            warn!(
                target: DISPATCH_TARGET,
                section = %route.section,
                %error,
                "failed to render configuration tree"
            );
            DispatchError::section_unavailable(name)
        })?;
        Ok(DispatchOutcome::replied(route.status, reply))
    }
}

impl fmt::Debug for ConfigDispatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConfigDispatcher")
            .finish_non_exhaustive()
    }
}
