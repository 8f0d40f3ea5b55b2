//! Per-kind rendering into the preview surface.

use crate::diff::{self, Patch};
use crate::error::Result;
use crate::highlight::{CodeHighlighter, SyntectHighlighter};
use crate::kind::SourceKind;
use crate::markdown::MarkdownRenderer;
use crate::surface::PreviewSurface;
use crate::tree::RenderNode;

/// Counters for observing render behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Renders per kind, indexed by [`SourceKind::index`].
    pub invocations: [usize; SourceKind::COUNT],
    /// Mutations issued by the most recent render of any kind. A raw
    /// replacement counts as one.
    pub last_mutations: usize,
}

impl RenderStats {
    pub fn invocations(&self, kind: SourceKind) -> usize {
        self.invocations[kind.index()]
    }
}

/// Renders each kind into its mount.
///
/// Style and script text is written verbatim. Markup goes through the
/// markdown renderer and only the difference from the previous render is
/// applied.
#[derive(Debug)]
pub struct RenderPipeline<H = SyntectHighlighter> {
    markdown: MarkdownRenderer<H>,
    rendered: Vec<RenderNode>,
    /// Set while the content mount may not match `rendered`.
    content_stale: bool,
    stats: RenderStats,
}

impl Default for RenderPipeline<SyntectHighlighter> {
    fn default() -> Self {
        Self::new(SyntectHighlighter)
    }
}

impl<H: CodeHighlighter> RenderPipeline<H> {
    pub fn new(highlighter: H) -> Self {
        Self {
            markdown: MarkdownRenderer::new(highlighter),
            rendered: Vec::new(),
            content_stale: false,
            stats: RenderStats::default(),
        }
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// The tree currently applied to the content mount.
    pub fn rendered_markup(&self) -> &[RenderNode] {
        &self.rendered
    }

    /// Render one kind. `None` text renders as empty.
    pub fn render<P: PreviewSurface + ?Sized>(
        &mut self,
        kind: SourceKind,
        text: Option<&str>,
        surface: &mut P,
    ) -> Result<()> {
        let text = text.unwrap_or_default();
        self.stats.invocations[kind.index()] += 1;

        let mutations = match kind {
            SourceKind::Style | SourceKind::Script => {
                surface.replace_raw(kind, text)?;
                1
            }
            SourceKind::Markup => self.render_markup(text, surface)?,
        };
        self.stats.last_mutations = mutations;
        tracing::debug!(%kind, mutations, "rendered");
        Ok(())
    }

    fn render_markup<P: PreviewSurface + ?Sized>(&mut self, text: &str, surface: &mut P) -> Result<usize> {
        let next = self.markdown.render(text);
        if self.content_stale {
            return self.rebuild_markup(next, surface);
        }
        let patches: Vec<Patch> = diff::diff(&self.rendered, &next);
        if patches.is_empty() {
            return Ok(0);
        }
        tracing::trace!(count = patches.len(), "patching content mount");
        match surface.patch_content(&patches) {
            Ok(()) => {
                self.rendered = next;
                Ok(patches.len())
            }
            // Part of the batch may have landed, so the mount no longer
            // matches either tree.
            Err(err) => {
                tracing::warn!(%err, "content patch failed, rebuilding content mount");
                self.rebuild_markup(next, surface)
            }
        }
    }

    /// Clear the content mount and insert `next` in full.
    fn rebuild_markup<P: PreviewSurface + ?Sized>(
        &mut self,
        next: Vec<RenderNode>,
        surface: &mut P,
    ) -> Result<usize> {
        self.content_stale = true;
        self.rendered.clear();
        surface.reset_content()?;
        let patches = diff::diff(&self.rendered, &next);
        surface.patch_content(&patches)?;
        self.rendered = next;
        self.content_stale = false;
        Ok(patches.len() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaygroundError;
    use crate::headless::MemorySurface;
    use crate::tree;

    /// Applies only part of the next patch batch before failing, and can
    /// refuse one reset.
    struct TornSurface {
        inner: MemorySurface,
        fail_after: Option<usize>,
        fail_reset: bool,
    }

    impl TornSurface {
        fn new() -> Self {
            let mut inner = MemorySurface::new();
            inner.attach_mounts().unwrap();
            Self {
                inner,
                fail_after: None,
                fail_reset: false,
            }
        }
    }

    impl PreviewSurface for TornSurface {
        fn is_ready(&self) -> bool {
            self.inner.is_ready()
        }

        fn attach_mounts(&mut self) -> Result<()> {
            self.inner.attach_mounts()
        }

        fn replace_raw(&mut self, kind: SourceKind, text: &str) -> Result<()> {
            self.inner.replace_raw(kind, text)
        }

        fn patch_content(&mut self, patches: &[Patch]) -> Result<()> {
            match self.fail_after.take() {
                Some(applied) => {
                    self.inner.patch_content(&patches[..applied.min(patches.len())])?;
                    Err(PlaygroundError::Patch("node went missing".into()))
                }
                None => self.inner.patch_content(patches),
            }
        }

        fn reset_content(&mut self) -> Result<()> {
            if std::mem::take(&mut self.fail_reset) {
                return Err(PlaygroundError::Surface("reset refused".into()));
            }
            self.inner.reset_content()
        }
    }

    fn pipeline() -> RenderPipeline<()> {
        RenderPipeline::new(())
    }

    fn expected(text: &str) -> String {
        tree::to_html(&MarkdownRenderer::new(()).render(text))
    }

    #[test]
    fn test_torn_patch_rebuilds_content() {
        let mut pipeline = pipeline();
        let mut surface = TornSurface::new();
        pipeline
            .render(SourceKind::Markup, Some("a"), &mut surface)
            .unwrap();

        surface.fail_after = Some(1);
        pipeline
            .render(SourceKind::Markup, Some("a\n\nb\n\nc"), &mut surface)
            .unwrap();
        assert_eq!(surface.inner.content_html(), expected("a\n\nb\n\nc"));
        assert_eq!(pipeline.rendered_markup(), surface.inner.content());

        // Later edits diff against what is actually mounted.
        pipeline
            .render(SourceKind::Markup, Some("a\n\nc"), &mut surface)
            .unwrap();
        assert_eq!(
            surface.inner.content_html(),
            tree::to_html(pipeline.rendered_markup())
        );
        assert_eq!(surface.inner.content_html(), expected("a\n\nc"));
    }

    #[test]
    fn test_failed_rebuild_is_retried_on_next_render() {
        let mut pipeline = pipeline();
        let mut surface = TornSurface::new();
        pipeline
            .render(SourceKind::Markup, Some("a"), &mut surface)
            .unwrap();

        surface.fail_after = Some(1);
        surface.fail_reset = true;
        assert!(
            pipeline
                .render(SourceKind::Markup, Some("a\n\nb\n\nc"), &mut surface)
                .is_err()
        );

        // Same text again: no diff is possible against a torn mount, so the
        // mount is rebuilt instead.
        pipeline
            .render(SourceKind::Markup, Some("a\n\nb\n\nc"), &mut surface)
            .unwrap();
        assert_eq!(surface.inner.content_html(), expected("a\n\nb\n\nc"));
    }

    #[test]
    fn test_unchanged_markup_issues_no_mutations() {
        let mut pipeline = pipeline();
        let mut surface = TornSurface::new();
        pipeline
            .render(SourceKind::Markup, Some("# t"), &mut surface)
            .unwrap();
        let before = surface.inner.mutations();
        pipeline
            .render(SourceKind::Markup, Some("# t"), &mut surface)
            .unwrap();
        assert_eq!(surface.inner.mutations(), before);
        assert_eq!(pipeline.stats().last_mutations, 0);
        assert_eq!(pipeline.stats().invocations(SourceKind::Markup), 2);
    }
}
