//! Preview surface backed by an `<iframe>` document.
//!
//! Mounts are created with the iframe's own document: a `<style>` in the
//! head, then `<main>` and `<script>` in the body. Patches are applied to
//! the live nodes under `<main>` by walking `childNodes` along each path.

use jcdn_core::{Patch, PlaygroundError, PreviewSurface, RenderNode, Result, SourceKind};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlIFrameElement, Node};

use crate::js_error_message;

fn surface_error(err: wasm_bindgen::JsValue) -> PlaygroundError {
    PlaygroundError::Surface(js_error_message(&err))
}

#[derive(Debug, Clone)]
struct Mounts {
    document: Document,
    style: Element,
    content: Element,
    script: Element,
}

#[derive(Debug, Clone)]
pub struct IframeSurface {
    iframe: HtmlIFrameElement,
    mounts: Option<Mounts>,
}

impl IframeSurface {
    pub fn new(iframe: HtmlIFrameElement) -> Self {
        Self {
            iframe,
            mounts: None,
        }
    }

    pub fn iframe(&self) -> &HtmlIFrameElement {
        &self.iframe
    }

    /// The element a kind renders into, once mounts are attached.
    pub fn mount_node(&self, kind: SourceKind) -> Option<Element> {
        let mounts = self.mounts.as_ref()?;
        Some(match kind {
            SourceKind::Markup => mounts.content.clone(),
            SourceKind::Style => mounts.style.clone(),
            SourceKind::Script => mounts.script.clone(),
        })
    }

    fn mounts(&self) -> Result<&Mounts> {
        self.mounts
            .as_ref()
            .ok_or_else(|| PlaygroundError::Surface("mounts are not attached".into()))
    }

    fn apply(&self, mounts: &Mounts, patch: &Patch) -> Result<()> {
        match patch {
            Patch::Insert {
                parent,
                index,
                node,
            } => {
                let parent = resolve(&mounts.content, parent)?;
                let new = build_node(&mounts.document, node)?;
                let reference = parent.child_nodes().item(*index as u32);
                parent
                    .insert_before(&new, reference.as_ref())
                    .map_err(surface_error)?;
            }
            Patch::Remove { parent, index } => {
                let parent = resolve(&mounts.content, parent)?;
                let child = child_at(&parent, *index)?;
                parent.remove_child(&child).map_err(surface_error)?;
            }
            Patch::Replace { path, node } => {
                let old = resolve(&mounts.content, path)?;
                let parent = old
                    .parent_node()
                    .ok_or_else(|| PlaygroundError::Patch(format!("detached node at {path:?}")))?;
                let new = build_node(&mounts.document, node)?;
                parent.replace_child(&new, &old).map_err(surface_error)?;
            }
            Patch::SetText { path, text } => {
                resolve(&mounts.content, path)?.set_node_value(Some(text));
            }
            Patch::SetAttribute { path, name, value } => {
                let element = resolve_element(&mounts.content, path)?;
                if let Err(err) = element.set_attribute(name, value) {
                    tracing::debug!(%name, error = %js_error_message(&err), "skipping attribute");
                }
            }
            Patch::RemoveAttribute { path, name } => {
                resolve_element(&mounts.content, path)?
                    .remove_attribute(name)
                    .map_err(surface_error)?;
            }
        }
        Ok(())
    }
}

impl PreviewSurface for IframeSurface {
    fn is_ready(&self) -> bool {
        self.iframe
            .content_document()
            .is_some_and(|doc| doc.head().is_some() && doc.body().is_some())
    }

    fn attach_mounts(&mut self) -> Result<()> {
        if self.mounts.is_some() {
            tracing::warn!("preview mounts already attached");
            return Ok(());
        }
        let document = self
            .iframe
            .content_document()
            .ok_or(PlaygroundError::SurfaceNotReady)?;
        let head = document.head().ok_or(PlaygroundError::SurfaceNotReady)?;
        let body = document.body().ok_or(PlaygroundError::SurfaceNotReady)?;

        let style = document.create_element("style").map_err(surface_error)?;
        let content = document.create_element("main").map_err(surface_error)?;
        let script = document.create_element("script").map_err(surface_error)?;
        head.append_child(&style).map_err(surface_error)?;
        body.append_child(&content).map_err(surface_error)?;
        body.append_child(&script).map_err(surface_error)?;

        tracing::debug!("attached preview mounts");
        self.mounts = Some(Mounts {
            document,
            style,
            content,
            script,
        });
        Ok(())
    }

    fn replace_raw(&mut self, kind: SourceKind, text: &str) -> Result<()> {
        let mounts = self.mounts()?;
        let mount = match kind {
            SourceKind::Style => &mounts.style,
            SourceKind::Script => &mounts.script,
            SourceKind::Markup => {
                return Err(PlaygroundError::Surface(
                    "the content mount only accepts patches".into(),
                ));
            }
        };
        mount.set_text_content(Some(text));
        Ok(())
    }

    fn patch_content(&mut self, patches: &[Patch]) -> Result<()> {
        let mounts = self.mounts()?;
        for patch in patches {
            self.apply(mounts, patch)?;
        }
        tracing::trace!(count = patches.len(), "applied preview patches");
        Ok(())
    }

    fn reset_content(&mut self) -> Result<()> {
        self.mounts()?.content.set_text_content(None);
        tracing::debug!("cleared content mount");
        Ok(())
    }
}

fn child_at(parent: &Node, index: usize) -> Result<Node> {
    parent
        .child_nodes()
        .item(index as u32)
        .ok_or_else(|| PlaygroundError::Patch(format!("no child {index}")))
}

fn resolve(content: &Element, path: &[usize]) -> Result<Node> {
    let mut node: Node = content.clone().into();
    for &index in path {
        node = child_at(&node, index)?;
    }
    Ok(node)
}

fn resolve_element(content: &Element, path: &[usize]) -> Result<Element> {
    resolve(content, path)?
        .dyn_into::<Element>()
        .map_err(|_| PlaygroundError::Patch(format!("expected element at {path:?}")))
}

/// Create live DOM for a render node in `document`.
fn build_node(document: &Document, node: &RenderNode) -> Result<Node> {
    match node {
        RenderNode::Text(text) => Ok(document.create_text_node(text).into()),
        RenderNode::Element(el) => {
            let element = document.create_element(&el.tag).map_err(surface_error)?;
            for (name, value) in &el.attrs {
                // Raw HTML may carry attribute names the DOM rejects. Those
                // are dropped.
                if let Err(err) = element.set_attribute(name, value) {
                    tracing::debug!(%name, error = %js_error_message(&err), "skipping attribute");
                }
            }
            for child in &el.children {
                let child = build_node(document, child)?;
                element.append_child(&child).map_err(surface_error)?;
            }
            Ok(element.into())
        }
    }
}
