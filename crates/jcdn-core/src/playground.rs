//! The playground: one value owning state, editors, store, pipeline and
//! preview surface.
//!
//! Every field change goes through [`Playground::handle_editor_change`],
//! which updates [`AppState`], dispatches the resulting [`FieldChange`] to the
//! render pipeline, and persists the text, in that order and synchronously.

use crate::config::PlaygroundConfig;
use crate::error::{PlaygroundError, Result};
use crate::highlight::{CodeHighlighter, SyntectHighlighter};
use crate::kind::{NavigationKey, SourceKind};
use crate::pipeline::{RenderPipeline, RenderStats};
use crate::slot::{EditorSlot, EditorWidget};
use crate::state::{AppState, FieldChange};
use crate::store::{KeyValueStore, NamespacedStore, SELECTED_EDITOR_KEY};
use crate::surface::PreviewSurface;

pub struct Playground<S, P, W, H = SyntectHighlighter> {
    config: PlaygroundConfig,
    store: NamespacedStore<S>,
    state: AppState,
    /// Mounted editors in kind order. Empty until `mount_editors`.
    slots: Vec<EditorSlot<W>>,
    pipeline: RenderPipeline<H>,
    surface: P,
    bootstrapped: bool,
}

impl<S, P, W> Playground<S, P, W, SyntectHighlighter>
where
    S: KeyValueStore,
    P: PreviewSurface,
    W: EditorWidget,
{
    /// Restore state from `backend` under the configured namespace.
    pub fn new(backend: S, surface: P, config: PlaygroundConfig) -> Result<Self> {
        Self::with_highlighter(backend, surface, config, SyntectHighlighter)
    }
}

impl<S, P, W, H> Playground<S, P, W, H>
where
    S: KeyValueStore,
    P: PreviewSurface,
    W: EditorWidget,
    H: CodeHighlighter,
{
    pub fn with_highlighter(
        backend: S,
        surface: P,
        config: PlaygroundConfig,
        highlighter: H,
    ) -> Result<Self> {
        let store = NamespacedStore::new(config.namespace.clone(), backend);
        let state = AppState::load(&store, &config)?;
        tracing::debug!(namespace = store.namespace(), "playground created");

        Ok(Self {
            config,
            store,
            state,
            slots: Vec::new(),
            pipeline: RenderPipeline::new(highlighter),
            surface,
            bootstrapped: false,
        })
    }

    /// Create one editor per kind. The initially selected kind is active
    /// and autofocused. Every kind needs a host.
    pub fn mount_editors<I>(&mut self, hosts: I) -> Result<()>
    where
        I: IntoIterator<Item = (SourceKind, W::Host)>,
    {
        if !self.slots.is_empty() {
            tracing::warn!("editors already mounted, ignoring");
            return Ok(());
        }

        let mut by_kind: [Option<W::Host>; SourceKind::COUNT] = Default::default();
        for (kind, host) in hosts {
            by_kind[kind.index()] = Some(host);
        }

        let selected = self.state.selected();
        let mut slots = Vec::with_capacity(SourceKind::COUNT);
        for (kind, host) in SourceKind::ALL.into_iter().zip(by_kind) {
            let Some(host) = host else {
                return Err(PlaygroundError::MissingEditorHost(kind));
            };
            let active = kind.index() == selected;
            slots.push(EditorSlot::mount(kind, host, &self.store, &self.config, active)?);
        }
        self.slots = slots;
        Ok(())
    }

    /// Attach the preview mounts and render every field once.
    ///
    /// Fails with [`PlaygroundError::SurfaceNotReady`] if the surface has no
    /// document yet. Calling it again after success does nothing.
    pub fn bootstrap_preview(&mut self) -> Result<()> {
        if self.bootstrapped {
            tracing::warn!("preview already bootstrapped");
            return Ok(());
        }
        if !self.surface.is_ready() {
            return Err(PlaygroundError::SurfaceNotReady);
        }

        self.surface.attach_mounts()?;
        self.bootstrapped = true;
        for kind in SourceKind::ALL {
            self.pipeline
                .render(kind, self.state.text(kind), &mut self.surface)?;
        }
        tracing::debug!("preview bootstrapped");
        Ok(())
    }

    /// Entry point for editor changes.
    ///
    /// The text is rendered before it is persisted, so a failing store
    /// leaves the preview current and the error is returned afterwards.
    pub fn handle_editor_change(&mut self, kind: SourceKind, text: &str) -> Result<()> {
        let rendered = match self.state.set_text(kind, text) {
            Some(change) => self.dispatch(change),
            None => Ok(()),
        };

        match self.slots.get(kind.index()) {
            Some(slot) => slot.persist(&mut self.store, text)?,
            None => self.store.set(kind.storage_key(), text)?,
        }
        rendered
    }

    /// Render the kind a change refers to. Before bootstrap there is nothing
    /// to render into; the change is picked up by the bootstrap render.
    fn dispatch(&mut self, change: FieldChange) -> Result<()> {
        if !self.bootstrapped {
            tracing::trace!(kind = %change.kind, "preview not bootstrapped, deferring render");
            return Ok(());
        }
        self.pipeline.render(
            change.kind,
            self.state.text(change.kind),
            &mut self.surface,
        )
    }

    /// Make the editor at `index` the active one, focus it and persist the
    /// selection. Out-of-range indices are ignored and return `Ok(false)`.
    pub fn select_editor(&mut self, index: usize) -> Result<bool> {
        if !self.state.select(index) {
            tracing::debug!(index, "ignoring out-of-range editor selection");
            return Ok(false);
        }

        for slot in &mut self.slots {
            slot.set_active(slot.kind().index() == index);
        }
        if let Some(slot) = self.slots.get(index) {
            slot.focus();
        }
        self.store
            .set(SELECTED_EDITOR_KEY, &index.to_string())?;
        tracing::debug!(index, "selected editor");
        Ok(true)
    }

    /// Move the selection one step. Stops at either end.
    pub fn switch_editor(&mut self, key: NavigationKey) -> Result<bool> {
        let selected = self.state.selected();
        let target = match key {
            NavigationKey::Next if selected + 1 < SourceKind::COUNT => selected + 1,
            NavigationKey::Previous if selected > 0 => selected - 1,
            _ => return Ok(false),
        };
        self.select_editor(target)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn selected(&self) -> usize {
        self.state.selected()
    }

    pub fn text(&self, kind: SourceKind) -> Option<&str> {
        self.state.text(kind)
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub fn slot(&self, kind: SourceKind) -> Option<&EditorSlot<W>> {
        self.slots.get(kind.index())
    }

    pub fn slots(&self) -> &[EditorSlot<W>] {
        &self.slots
    }

    pub fn store(&self) -> &NamespacedStore<S> {
        &self.store
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut P {
        &mut self.surface
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    pub fn render_stats(&self) -> &RenderStats {
        self.pipeline.stats()
    }
}
