//! Editor slots: one code-editing widget per [`SourceKind`].

use serde::Serialize;

use crate::config::PlaygroundConfig;
use crate::error::{Result, StoreError};
use crate::kind::SourceKind;
use crate::store::KeyValueStore;

/// A code-editing widget attached to a host element.
///
/// Implementations wrap whatever editor the platform provides. Subscribing
/// to changes is platform wiring; changes are fed back through
/// [`crate::Playground::handle_editor_change`].
pub trait EditorWidget: Sized {
    /// Where the widget is attached (a DOM element, a headless handle, ...).
    type Host;

    fn create(host: Self::Host, config: &WidgetConfig) -> Result<Self>;

    fn value(&self) -> String;

    /// Replace the widget's text. Only used for the initial load.
    fn set_value(&mut self, text: &str);

    fn focus(&self);
}

/// Widget syntax mode, serialized as `{ "name": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeSpec {
    pub name: &'static str,
}

/// Commands bound in [`WidgetConfig::extra_keys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Open the colour picker popup at the cursor.
    ColorPicker,
    /// Expand the abbreviation before the cursor into markup.
    ExpandAbbreviation,
}

impl KeyCommand {
    /// Name of the built-in widget command, if the binding is a plain
    /// command name rather than a callback.
    pub fn widget_command(self) -> Option<&'static str> {
        match self {
            KeyCommand::ColorPicker => None,
            KeyCommand::ExpandAbbreviation => Some("emmetExpandAbbreviation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: &'static str,
    pub command: KeyCommand,
}

/// Options handed to [`EditorWidget::create`].
///
/// Serializes to the widget's camelCase option object. `extra_keys` is
/// skipped because its color picker entry is a callback; platforms install
/// the bindings themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(skip)]
    pub kind: SourceKind,
    pub mode: ModeSpec,
    pub theme: String,
    pub autofocus: bool,
    pub line_numbers: bool,
    pub scrollbar_style: String,
    pub poll_interval: u32,
    pub tab_size: u32,
    pub auto_close_brackets: bool,
    pub colorpicker: bool,
    #[serde(skip)]
    pub extra_keys: Vec<KeyBinding>,
}

impl WidgetConfig {
    pub fn for_kind(kind: SourceKind, autofocus: bool, config: &PlaygroundConfig) -> Self {
        let mut extra_keys = vec![KeyBinding {
            key: "Ctrl-K",
            command: KeyCommand::ColorPicker,
        }];
        if kind == SourceKind::Markup {
            extra_keys.push(KeyBinding {
                key: "Tab",
                command: KeyCommand::ExpandAbbreviation,
            });
        }

        Self {
            kind,
            mode: ModeSpec {
                name: kind.syntax_mode(),
            },
            theme: config.theme.clone(),
            autofocus,
            line_numbers: true,
            scrollbar_style: config.scrollbar_style.clone(),
            poll_interval: config.poll_interval,
            tab_size: 2,
            auto_close_brackets: true,
            colorpicker: true,
            extra_keys,
        }
    }
}

/// A widget bound to one kind, with its activity flag.
#[derive(Debug)]
pub struct EditorSlot<W> {
    kind: SourceKind,
    widget: W,
    active: bool,
}

impl<W: EditorWidget> EditorSlot<W> {
    /// Create the widget on `host` and load the initial content into it:
    /// the persisted text, else the configured default, else empty.
    pub fn mount<S: KeyValueStore>(
        kind: SourceKind,
        host: W::Host,
        store: &S,
        config: &PlaygroundConfig,
        active: bool,
    ) -> Result<Self> {
        let widget_config = WidgetConfig::for_kind(kind, active, config);
        let mut widget = W::create(host, &widget_config)?;
        let initial = initial_content(kind, store, config)?;
        widget.set_value(&initial);
        tracing::debug!(%kind, active, len = initial.len(), "mounted editor");

        Ok(Self {
            kind,
            widget,
            active,
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn focus(&self) {
        self.widget.focus();
    }

    /// Persist text under this slot's kind key.
    pub fn persist<S: KeyValueStore>(&self, store: &mut S, text: &str) -> Result<(), StoreError> {
        store.set(self.kind.storage_key(), text)
    }
}

/// Text a widget starts with.
pub fn initial_content<S: KeyValueStore>(
    kind: SourceKind,
    store: &S,
    config: &PlaygroundConfig,
) -> Result<String, StoreError> {
    Ok(match store.get(kind.storage_key())? {
        Some(text) => text,
        None => config.default_for(kind).unwrap_or_default().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceDefaults;
    use crate::store::MemoryStore;

    #[test]
    fn test_widget_config_fixed_values() {
        let config = WidgetConfig::for_kind(SourceKind::Style, false, &PlaygroundConfig::default());
        assert_eq!(config.mode.name, "css");
        assert!(config.line_numbers);
        assert_eq!(config.tab_size, 2);
        assert!(config.auto_close_brackets);
        assert!(config.colorpicker);
        assert!(!config.autofocus);
        assert_eq!(
            config.extra_keys,
            vec![KeyBinding {
                key: "Ctrl-K",
                command: KeyCommand::ColorPicker
            }]
        );
    }

    #[test]
    fn test_markup_gets_abbreviation_expansion() {
        let config = WidgetConfig::for_kind(SourceKind::Markup, true, &PlaygroundConfig::default());
        assert_eq!(config.mode.name, "text/html");
        assert!(
            config
                .extra_keys
                .iter()
                .any(|b| b.key == "Tab" && b.command == KeyCommand::ExpandAbbreviation)
        );
    }

    #[test]
    fn test_widget_config_json_shape() {
        let config = WidgetConfig::for_kind(SourceKind::Script, true, &PlaygroundConfig::default());
        let json = serde_json::to_string(&config).unwrap();
        insta::assert_snapshot!(json, @r#"{"mode":{"name":"javascript"},"theme":"jcdn","autofocus":true,"lineNumbers":true,"scrollbarStyle":"overlay","pollInterval":10000,"tabSize":2,"autoCloseBrackets":true,"colorpicker":true}"#);
    }

    #[test]
    fn test_initial_content_precedence() {
        let store = MemoryStore::with_entries([("css", "stored")]);
        let config = PlaygroundConfig {
            defaults: SourceDefaults {
                style: Some("default css".into()),
                script: Some("default js".into()),
                markup: None,
            },
            ..Default::default()
        };
        assert_eq!(initial_content(SourceKind::Style, &store, &config).unwrap(), "stored");
        assert_eq!(
            initial_content(SourceKind::Script, &store, &config).unwrap(),
            "default js"
        );
        assert_eq!(initial_content(SourceKind::Markup, &store, &config).unwrap(), "");
    }
}
