//! Wiring a playground into a page.
//!
//! The playground is shared with DOM and widget callbacks through
//! `Rc<RefCell<_>>`. Callbacks hold weak references and release their borrow
//! before reporting an error, so a failing store never leaves the playground
//! borrowed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use jcdn_core::{
    NavigationKey, Playground, PlaygroundConfig, PlaygroundError, PreviewSurface, Result,
    SourceKind,
};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlIFrameElement, HtmlTextAreaElement, KeyboardEvent};

use crate::js_error_message;
use crate::storage::LocalStorage;
use crate::surface::IframeSurface;
use crate::widget::{ChangeHandler, CodeMirrorWidget};

pub type BrowserPlayground = Playground<LocalStorage, IframeSurface, CodeMirrorWidget>;
pub type SharedPlayground = Rc<RefCell<BrowserPlayground>>;

/// Find the editor hosts under `root`: elements with a `data-mode`
/// attribute naming a kind, each containing a `<textarea>`.
pub fn discover_hosts(root: &Element) -> Result<Vec<(SourceKind, HtmlTextAreaElement)>> {
    let nodes = root
        .query_selector_all("[data-mode]")
        .map_err(|e| PlaygroundError::Widget(js_error_message(&e)))?;

    let mut hosts = Vec::new();
    for index in 0..nodes.length() {
        let Some(element) = nodes.item(index).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let mode = element.get_attribute("data-mode").unwrap_or_default();
        let Some(kind) = SourceKind::from_mode_attr(&mode) else {
            tracing::debug!(%mode, "ignoring unknown editor mode");
            continue;
        };
        let textarea = element
            .query_selector("textarea")
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok())
            .ok_or(PlaygroundError::MissingEditorHost(kind))?;
        hosts.push((kind, textarea));
    }
    Ok(hosts)
}

/// Log an error raised inside a callback and rethrow it to the page.
fn report(err: PlaygroundError) {
    tracing::error!(%err, "playground error");
    wasm_bindgen::throw_str(&err.to_string());
}

/// A running playground and the callbacks keeping it wired to the page.
pub struct PlaygroundApp {
    playground: SharedPlayground,
    _change_handlers: Vec<ChangeHandler>,
    _listeners: Vec<EventListener>,
}

impl PlaygroundApp {
    /// Mount editors under `root`, connect the preview `iframe` and start
    /// rendering.
    ///
    /// Editors receive their initial content before change handlers are
    /// registered. The preview is bootstrapped now if the iframe document
    /// is ready, otherwise on its `load` event.
    pub fn start(root: &Element, iframe: HtmlIFrameElement, config: PlaygroundConfig) -> Result<Self> {
        let store = LocalStorage::new()?;
        let surface = IframeSurface::new(iframe.clone());
        let mut playground = Playground::new(store, surface, config)?;
        playground.mount_editors(discover_hosts(root)?)?;
        let playground = Rc::new(RefCell::new(playground));

        let change_handlers: Vec<ChangeHandler> = {
            let borrowed = playground.borrow();
            borrowed
                .slots()
                .iter()
                .map(|slot| {
                    let kind = slot.kind();
                    let weak = Rc::downgrade(&playground);
                    slot.widget().on_change(move |text| {
                        let Some(playground) = weak.upgrade() else {
                            return;
                        };
                        let result = playground.borrow_mut().handle_editor_change(kind, &text);
                        drop(playground);
                        if let Err(err) = result {
                            report(err);
                        }
                    })
                })
                .collect()
        };

        let mut listeners = vec![navigation_listener(root, Rc::downgrade(&playground))];

        let ready = playground.borrow().surface().is_ready();
        if ready {
            playground.borrow_mut().bootstrap_preview()?;
        } else {
            tracing::debug!("preview document not ready, waiting for load");
            let weak = Rc::downgrade(&playground);
            listeners.push(EventListener::once(&iframe, "load", move |_| {
                let Some(playground) = weak.upgrade() else {
                    return;
                };
                let result = playground.borrow_mut().bootstrap_preview();
                drop(playground);
                if let Err(err) = result {
                    report(err);
                }
            }));
        }

        Ok(Self {
            playground,
            _change_handlers: change_handlers,
            _listeners: listeners,
        })
    }

    pub fn playground(&self) -> &SharedPlayground {
        &self.playground
    }
}

/// `PageDown` / `PageUp` anywhere under `root` switch editors.
fn navigation_listener(root: &Element, playground: Weak<RefCell<BrowserPlayground>>) -> EventListener {
    EventListener::new(root, "keydown", move |event| {
        let Some(key) = event
            .dyn_ref::<KeyboardEvent>()
            .and_then(|event| NavigationKey::from_key(&event.key()))
        else {
            return;
        };
        let Some(playground) = playground.upgrade() else {
            return;
        };
        let result = playground.borrow_mut().switch_editor(key);
        drop(playground);
        if let Err(err) = result {
            report(err);
        }
    })
}
