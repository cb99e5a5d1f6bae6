//! Configuration provider backed by the monitored-sections document.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use syscheck_config::MonitorSettings;

use crate::collaborators::ConfigProvider;

const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Serves the loaded monitored sections, each wrapped under its own name.
///
/// Sections missing from the document are reported as absent. The internal
/// options always exist and are rendered as
/// `{"internal":{"syscheck":{..},"rootcheck":{..}}}`.
#[derive(Debug, Clone, Default)]
pub struct SectionStore {
    settings: MonitorSettings,
}

impl SectionStore {
    /// Creates a store over already loaded sections.
    #[must_use]
    pub fn new(settings: MonitorSettings) -> Self {
        Self { settings }
    }
}

impl ConfigProvider for SectionStore {
    fn fetch_syscheck_config(&self) -> Option<Value> {
        self.settings
            .syscheck
            .as_ref()
            .and_then(|section| wrap("syscheck", section))
    }

    fn fetch_rootcheck_config(&self) -> Option<Value> {
        self.settings
            .rootcheck
            .as_ref()
            .and_then(|section| wrap("rootcheck", section))
    }

    fn fetch_internal_options(&self) -> Option<Value> {
        wrap("internal", &self.settings.internal)
    }
}

fn wrap<T: Serialize>(name: &str, section: &T) -> Option<Value> {
    match serde_json::to_value(section) {
        Ok(tree) => {
            let mut root = Map::new();
            root.insert(name.to_owned(), tree);
            Some(Value::Object(root))
        }
        Err(error) => {
            warn!(target: STORE_TARGET, section = name, %error, "failed to serialise section");
            None
        }
    }
}
