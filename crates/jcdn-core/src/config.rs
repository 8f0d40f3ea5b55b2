//! Deployment configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PlaygroundError, Result};
use crate::kind::SourceKind;

/// Namespace prefixed to every persisted key.
pub const DEFAULT_NAMESPACE: &str = "code.jcdn.io";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaygroundConfig {
    /// Prefix for persisted keys, joined with `_`.
    pub namespace: String,
    /// Documents used when nothing is persisted for a kind.
    pub defaults: SourceDefaults,
    /// Widget theme name.
    pub theme: String,
    /// Widget scrollbar style.
    pub scrollbar_style: String,
    /// Widget input poll interval in milliseconds.
    pub poll_interval: u32,
    /// Maximum log level for the browser console subscriber.
    pub log_level: String,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            defaults: SourceDefaults::default(),
            theme: "jcdn".to_owned(),
            scrollbar_style: "overlay".to_owned(),
            poll_interval: 10_000,
            log_level: "info".to_owned(),
        }
    }
}

impl PlaygroundConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PlaygroundError::Config(e.to_string()))
    }

    /// Fallback document for a kind, if the deployment configured one.
    pub fn default_for(&self, kind: SourceKind) -> Option<&str> {
        match kind {
            SourceKind::Markup => self.defaults.markup.as_deref(),
            SourceKind::Style => self.defaults.style.as_deref(),
            SourceKind::Script => self.defaults.script.as_deref(),
        }
    }
}

/// Per-kind fallback documents. `None` leaves the field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDefaults {
    pub markup: Option<String>,
    pub style: Option<String>,
    pub script: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlaygroundConfig::default();
        assert_eq!(config.namespace, "code.jcdn.io");
        assert_eq!(config.poll_interval, 10_000);
        assert_eq!(config.default_for(SourceKind::Markup), None);
    }

    #[test]
    fn test_partial_json() {
        let config = PlaygroundConfig::from_json(
            r##"{"namespace":"test","defaults":{"markup":"# Hello"},"pollInterval":50}"##,
        )
        .unwrap();
        assert_eq!(config.namespace, "test");
        assert_eq!(config.poll_interval, 50);
        assert_eq!(config.theme, "jcdn");
        assert_eq!(config.default_for(SourceKind::Markup), Some("# Hello"));
        assert_eq!(config.default_for(SourceKind::Style), None);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            PlaygroundConfig::from_json("{"),
            Err(PlaygroundError::Config(_))
        ));
    }
}
