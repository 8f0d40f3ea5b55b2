//! Source kinds and their dispatch table.
//!
//! Every per-kind decision (storage key, widget mode, preview mount, editor
//! index) is looked up here instead of being spread across conditionals.

use std::fmt;

/// One of the three edited sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Markdown with inline HTML, rendered into the content mount.
    Markup,
    /// CSS, written verbatim into the style mount.
    Style,
    /// JavaScript, written verbatim into the script mount.
    Script,
}

/// Static per-kind properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindInfo {
    /// Key under which the source text is persisted.
    pub storage_key: &'static str,
    /// Syntax mode handed to the editing widget.
    pub syntax_mode: &'static str,
    /// Value of the `data-mode` attribute on the editor host element.
    pub mode_attr: &'static str,
    /// Tag of the preview mount this kind renders into.
    pub mount_tag: &'static str,
}

const KIND_TABLE: [KindInfo; 3] = [
    KindInfo {
        storage_key: "html",
        syntax_mode: "text/html",
        mode_attr: "html",
        mount_tag: "main",
    },
    KindInfo {
        storage_key: "css",
        syntax_mode: "css",
        mode_attr: "css",
        mount_tag: "style",
    },
    KindInfo {
        storage_key: "javascript",
        syntax_mode: "javascript",
        mode_attr: "javascript",
        mount_tag: "script",
    },
];

impl SourceKind {
    /// All kinds, in editor order.
    pub const ALL: [SourceKind; 3] = [SourceKind::Markup, SourceKind::Style, SourceKind::Script];

    /// Number of editors in the playground.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this kind's editor in the editor strip.
    pub fn index(self) -> usize {
        match self {
            SourceKind::Markup => 0,
            SourceKind::Style => 1,
            SourceKind::Script => 2,
        }
    }

    /// Kind at an editor index, if the index is in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn info(self) -> &'static KindInfo {
        &KIND_TABLE[self.index()]
    }

    pub fn storage_key(self) -> &'static str {
        self.info().storage_key
    }

    pub fn syntax_mode(self) -> &'static str {
        self.info().syntax_mode
    }

    pub fn mount_tag(self) -> &'static str {
        self.info().mount_tag
    }

    /// Resolve a `data-mode` attribute value.
    pub fn from_mode_attr(attr: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.info().mode_attr == attr)
    }

    /// Resolve a storage key (`html`, `css`, `javascript`).
    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.info().storage_key == key)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Keys that move the editor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKey {
    Next,
    Previous,
}

impl NavigationKey {
    /// Map a `KeyboardEvent.key` value. Anything but `PageDown`/`PageUp` is
    /// not a navigation key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "PageDown" => Some(NavigationKey::Next),
            "PageUp" => Some(NavigationKey::Previous),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for kind in SourceKind::ALL {
            assert_eq!(SourceKind::from_index(kind.index()), Some(kind));
        }
        assert_eq!(SourceKind::from_index(3), None);
    }

    #[test]
    fn test_dispatch_table() {
        assert_eq!(SourceKind::Markup.storage_key(), "html");
        assert_eq!(SourceKind::Style.storage_key(), "css");
        assert_eq!(SourceKind::Script.storage_key(), "javascript");
        assert_eq!(SourceKind::Markup.syntax_mode(), "text/html");
        assert_eq!(SourceKind::Script.mount_tag(), "script");
    }

    #[test]
    fn test_from_mode_attr() {
        assert_eq!(SourceKind::from_mode_attr("css"), Some(SourceKind::Style));
        assert_eq!(SourceKind::from_mode_attr("text/html"), None);
        assert_eq!(
            SourceKind::from_storage_key("javascript"),
            Some(SourceKind::Script)
        );
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(NavigationKey::from_key("PageDown"), Some(NavigationKey::Next));
        assert_eq!(NavigationKey::from_key("PageUp"), Some(NavigationKey::Previous));
        assert_eq!(NavigationKey::from_key("ArrowDown"), None);
    }
}
