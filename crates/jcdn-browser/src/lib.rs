//! Browser layer for the jcdn playground.
//!
//! Implements the `jcdn-core` platform traits over `web-sys`. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `storage`: `localStorage`-backed `KeyValueStore`
//! - `surface`: iframe preview document with DOM patch application
//! - `widget`: CodeMirror binding implementing `EditorWidget`
//! - `app`: host discovery, change/keyboard wiring and deferred bootstrap
//!
//! # Re-exports
//!
//! This crate re-exports `jcdn-core` for convenience, so consumers only need
//! to depend on `jcdn-browser`.

// Re-export core crate
pub use jcdn_core;
pub use jcdn_core::*;

pub mod app;
pub mod storage;
pub mod surface;
pub mod widget;

pub use app::{BrowserPlayground, PlaygroundApp, SharedPlayground, discover_hosts};
pub use storage::LocalStorage;
pub use surface::IframeSurface;
pub use widget::{ChangeHandler, CodeMirror, CodeMirrorWidget};

use wasm_bindgen::{JsCast, JsValue};

/// Best-effort readable message for a thrown JS value: the `name` and
/// `message` of an error object, a thrown string, or its debug form.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return format!("{}: {}", String::from(err.name()), String::from(err.message()));
    }
    let name = js_sys::Reflect::get(value, &"name".into())
        .ok()
        .and_then(|v| v.as_string());
    match name {
        Some(name) => name,
        None => format!("{value:?}"),
    }
}
