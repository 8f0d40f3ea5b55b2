//! In-memory implementations of the platform traits.
//!
//! Used by the test suites and by anything that drives a playground
//! without a browser.

use std::cell::Cell;
use std::rc::Rc;

use crate::diff::{self, Patch};
use crate::error::{PlaygroundError, Result};
use crate::kind::SourceKind;
use crate::slot::{EditorWidget, WidgetConfig};
use crate::surface::PreviewSurface;
use crate::tree::{self, RenderNode};

/// Preview surface holding mount contents in memory.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    ready: bool,
    mounted: bool,
    attach_count: usize,
    style: String,
    script: String,
    content: Vec<RenderNode>,
    mutations: usize,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    /// A surface that is ready immediately.
    pub fn new() -> Self {
        Self {
            ready: true,
            mounted: false,
            attach_count: 0,
            style: String::new(),
            script: String::new(),
            content: Vec::new(),
            mutations: 0,
        }
    }

    /// A surface whose document has not loaded yet.
    pub fn pending() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// How many times mounts were attached. Stays at most 1.
    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn content(&self) -> &[RenderNode] {
        &self.content
    }

    /// Serialized content mount.
    pub fn content_html(&self) -> String {
        tree::to_html(&self.content)
    }

    /// Total mutations applied since creation.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.mounted {
            Ok(())
        } else {
            Err(PlaygroundError::Surface("mounts are not attached".into()))
        }
    }
}

impl PreviewSurface for MemorySurface {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn attach_mounts(&mut self) -> Result<()> {
        if !self.ready {
            return Err(PlaygroundError::SurfaceNotReady);
        }
        self.mounted = true;
        self.attach_count += 1;
        Ok(())
    }

    fn replace_raw(&mut self, kind: SourceKind, text: &str) -> Result<()> {
        self.ensure_mounted()?;
        match kind {
            SourceKind::Style => self.style = text.to_owned(),
            SourceKind::Script => self.script = text.to_owned(),
            SourceKind::Markup => {
                return Err(PlaygroundError::Surface(
                    "the content mount only accepts patches".into(),
                ));
            }
        }
        self.mutations += 1;
        Ok(())
    }

    fn patch_content(&mut self, patches: &[Patch]) -> Result<()> {
        self.ensure_mounted()?;
        diff::apply(&mut self.content, patches)?;
        self.mutations += patches.len();
        Ok(())
    }

    fn reset_content(&mut self) -> Result<()> {
        self.ensure_mounted()?;
        self.content.clear();
        self.mutations += 1;
        Ok(())
    }
}

/// Shared record of which editor currently has focus.
#[derive(Debug, Clone, Default)]
pub struct FocusRing(Rc<Cell<Option<SourceKind>>>);

impl FocusRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<SourceKind> {
        self.0.get()
    }

    fn focus(&self, kind: SourceKind) {
        self.0.set(Some(kind));
    }
}

/// Widget that keeps its text in memory and reports focus to a
/// [`FocusRing`].
#[derive(Debug, Clone)]
pub struct HeadlessWidget {
    value: String,
    config: WidgetConfig,
    ring: FocusRing,
}

impl HeadlessWidget {
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }
}

impl EditorWidget for HeadlessWidget {
    type Host = FocusRing;

    fn create(host: FocusRing, config: &WidgetConfig) -> Result<Self> {
        if config.autofocus {
            host.focus(config.kind);
        }
        Ok(Self {
            value: String::new(),
            config: config.clone(),
            ring: host,
        })
    }

    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, text: &str) {
        self.value = text.to_owned();
    }

    fn focus(&self) {
        self.ring.focus(self.config.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaygroundConfig;

    #[test]
    fn test_raw_replace_requires_mounts() {
        let mut surface = MemorySurface::new();
        assert!(surface.replace_raw(SourceKind::Style, "a{}").is_err());
        surface.attach_mounts().unwrap();
        surface.replace_raw(SourceKind::Style, "a{}").unwrap();
        assert_eq!(surface.style(), "a{}");
        assert!(surface.replace_raw(SourceKind::Markup, "x").is_err());
    }

    #[test]
    fn test_pending_surface() {
        let mut surface = MemorySurface::pending();
        assert!(!surface.is_ready());
        assert!(matches!(
            surface.attach_mounts(),
            Err(PlaygroundError::SurfaceNotReady)
        ));
        surface.mark_ready();
        surface.attach_mounts().unwrap();
        assert_eq!(surface.attach_count(), 1);
    }

    #[test]
    fn test_reset_content_clears_markup_only() {
        let mut surface = MemorySurface::new();
        assert!(surface.reset_content().is_err());
        surface.attach_mounts().unwrap();
        surface.replace_raw(SourceKind::Style, "a{}").unwrap();
        surface
            .patch_content(&[Patch::Insert {
                parent: vec![],
                index: 0,
                node: RenderNode::Text("x".into()),
            }])
            .unwrap();
        surface.reset_content().unwrap();
        assert!(surface.content().is_empty());
        assert_eq!(surface.style(), "a{}");
    }

    #[test]
    fn test_widget_autofocus() {
        let ring = FocusRing::new();
        let config = WidgetConfig::for_kind(SourceKind::Style, true, &PlaygroundConfig::default());
        let widget = HeadlessWidget::create(ring.clone(), &config).unwrap();
        assert_eq!(ring.focused(), Some(SourceKind::Style));
        assert_eq!(widget.value(), "");
    }
}
