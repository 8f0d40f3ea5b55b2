//! Application state: the single source of truth for editor text and
//! selection.
//!
//! Text fields only change through [`AppState::set_text`], which reports
//! whether the value actually changed. The owner dispatches each reported
//! change to the render pipeline.

use crate::config::PlaygroundConfig;
use crate::error::StoreError;
use crate::kind::SourceKind;
use crate::store::{KeyValueStore, SELECTED_EDITOR_KEY};

/// A text field whose value changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChange {
    pub kind: SourceKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    selected: usize,
    texts: [Option<String>; SourceKind::COUNT],
}

impl AppState {
    /// Restore state from the store.
    ///
    /// A missing text falls back to the configured default document (or
    /// stays empty). A missing, malformed or out-of-range selection is 0.
    pub fn load<S: KeyValueStore>(store: &S, config: &PlaygroundConfig) -> Result<Self, StoreError> {
        let mut texts: [Option<String>; SourceKind::COUNT] = Default::default();
        for kind in SourceKind::ALL {
            texts[kind.index()] = match store.get(kind.storage_key())? {
                Some(text) => Some(text),
                None => config.default_for(kind).map(str::to_owned),
            };
        }

        let selected = store
            .get(SELECTED_EDITOR_KEY)?
            .as_deref()
            .map(parse_selected)
            .unwrap_or(0);

        tracing::debug!(selected, "restored application state");
        Ok(Self { selected, texts })
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_kind(&self) -> SourceKind {
        // `selected` is kept in range by `select`.
        SourceKind::from_index(self.selected).unwrap_or(SourceKind::Markup)
    }

    /// Set the selected index. Out-of-range indices are rejected.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= SourceKind::COUNT {
            return false;
        }
        self.selected = index;
        true
    }

    pub fn text(&self, kind: SourceKind) -> Option<&str> {
        self.texts[kind.index()].as_deref()
    }

    /// Store new text for a kind. Returns the change to dispatch, or `None`
    /// if the text is identical to what was already there.
    pub fn set_text(&mut self, kind: SourceKind, text: &str) -> Option<FieldChange> {
        let slot = &mut self.texts[kind.index()];
        if slot.as_deref() == Some(text) {
            return None;
        }
        *slot = Some(text.to_owned());
        Some(FieldChange { kind })
    }
}

fn parse_selected(raw: &str) -> usize {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|&index| index < SourceKind::COUNT)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceDefaults;
    use crate::store::MemoryStore;

    #[test]
    fn test_load_empty_store() {
        let state = AppState::load(&MemoryStore::new(), &PlaygroundConfig::default()).unwrap();
        assert_eq!(state.selected(), 0);
        for kind in SourceKind::ALL {
            assert_eq!(state.text(kind), None);
        }
    }

    #[test]
    fn test_load_uses_configured_defaults_only_when_absent() {
        let store = MemoryStore::with_entries([("css", "p{}")]);
        let config = PlaygroundConfig {
            defaults: SourceDefaults {
                markup: Some("# Welcome".into()),
                style: Some("body{}".into()),
                script: None,
            },
            ..Default::default()
        };
        let state = AppState::load(&store, &config).unwrap();
        assert_eq!(state.text(SourceKind::Markup), Some("# Welcome"));
        assert_eq!(state.text(SourceKind::Style), Some("p{}"));
        assert_eq!(state.text(SourceKind::Script), None);
    }

    #[test]
    fn test_selected_parsing() {
        assert_eq!(parse_selected("2"), 2);
        assert_eq!(parse_selected(" 1 "), 1);
        assert_eq!(parse_selected("garbage"), 0);
        assert_eq!(parse_selected("-1"), 0);
        assert_eq!(parse_selected("7"), 0);
    }

    #[test]
    fn test_set_text_reports_only_real_changes() {
        let mut state = AppState::default();
        assert_eq!(
            state.set_text(SourceKind::Style, "a{}"),
            Some(FieldChange {
                kind: SourceKind::Style
            })
        );
        assert_eq!(state.set_text(SourceKind::Style, "a{}"), None);
        assert_eq!(state.text(SourceKind::Style), Some("a{}"));
        // Empty text is still a change from "never set".
        assert!(state.set_text(SourceKind::Script, "").is_some());
    }

    #[test]
    fn test_select_bounds() {
        let mut state = AppState::default();
        assert!(state.select(2));
        assert!(!state.select(3));
        assert_eq!(state.selected(), 2);
        assert_eq!(state.selected_kind(), SourceKind::Script);
    }
}
