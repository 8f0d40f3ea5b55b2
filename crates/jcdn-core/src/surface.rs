//! The isolated preview document.

use crate::diff::Patch;
use crate::error::Result;
use crate::kind::SourceKind;

/// A preview document with one mount point per [`SourceKind`].
///
/// The style and script mounts hold raw text (`<style>` / `<script>`
/// content); the markup mount (`<main>`) holds rendered nodes and is only
/// updated through patches.
pub trait PreviewSurface {
    /// Whether the document has a head and a body to attach mounts to.
    fn is_ready(&self) -> bool;

    /// Create the three mount points. Called once, after [`Self::is_ready`]
    /// reports true.
    fn attach_mounts(&mut self) -> Result<()>;

    /// Replace the text content of the style or script mount.
    fn replace_raw(&mut self, kind: SourceKind, text: &str) -> Result<()>;

    /// Apply patches to the children of the markup mount.
    fn patch_content(&mut self, patches: &[Patch]) -> Result<()>;

    /// Remove every node from the markup mount.
    fn reset_content(&mut self) -> Result<()>;
}

impl<T: PreviewSurface + ?Sized> PreviewSurface for &mut T {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn attach_mounts(&mut self) -> Result<()> {
        (**self).attach_mounts()
    }

    fn replace_raw(&mut self, kind: SourceKind, text: &str) -> Result<()> {
        (**self).replace_raw(kind, text)
    }

    fn patch_content(&mut self, patches: &[Patch]) -> Result<()> {
        (**self).patch_content(patches)
    }

    fn reset_content(&mut self) -> Result<()> {
        (**self).reset_content()
    }
}
