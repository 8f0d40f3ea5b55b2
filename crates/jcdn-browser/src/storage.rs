//! `window.localStorage` backend.

use jcdn_core::{KeyValueStore, StoreError};
use wasm_bindgen::JsValue;

use crate::js_error_message;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Open the window's local storage. Fails with
    /// [`StoreError::Unavailable`] when there is no window or storage is
    /// disabled (private browsing, blocked third-party storage).
    pub fn new() -> Result<Self, StoreError> {
        let window = web_sys::window().ok_or(StoreError::Unavailable)?;
        match window.local_storage() {
            Ok(Some(storage)) => Ok(Self { storage }),
            Ok(None) => Err(StoreError::Unavailable),
            Err(err) => {
                tracing::warn!(error = %js_error_message(&err), "localStorage is not accessible");
                Err(StoreError::Unavailable)
            }
        }
    }

    pub fn from_storage(storage: web_sys::Storage) -> Self {
        Self { storage }
    }
}

fn backend_error(err: JsValue) -> StoreError {
    StoreError::Backend(js_error_message(&err))
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(backend_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(backend_error)
    }
}
