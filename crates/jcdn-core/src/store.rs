//! Persistent key-value storage.
//!
//! The playground only needs string get/set. Backends are the browser's
//! `localStorage` (in `jcdn-browser`) and [`MemoryStore`].

use std::collections::HashMap;

use crate::error::StoreError;

/// Key under which the selected editor index is persisted.
pub const SELECTED_EDITOR_KEY: &str = "selected_editor";

/// String key-value storage. Errors are returned as-is; callers do not retry.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Prefixes every key with `{namespace}_` so playground data does not
/// collide with other users of the same backend.
#[derive(Debug, Clone)]
pub struct NamespacedStore<B> {
    namespace: String,
    backend: B,
}

impl<B: KeyValueStore> NamespacedStore<B> {
    pub fn new(namespace: impl Into<String>, backend: B) -> Self {
        Self {
            namespace: namespace.into(),
            backend,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full backend key for a logical key.
    pub fn full_key(&self, key: &str) -> String {
        format!("{}_{}", self.namespace, key)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }
}

impl<B: KeyValueStore> KeyValueStore for NamespacedStore<B> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.backend.get(&self.full_key(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let full_key = self.full_key(key);
        tracing::trace!(key = %full_key, len = value.len(), "store set");
        self.backend.set(&full_key, value)
    }
}

/// In-memory backend. Optionally fails every write, to mimic an exhausted
/// or disabled browser store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: Option<StoreError>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate entries (raw backend keys, no namespace applied).
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            fail_writes: None,
        }
    }

    /// Make every subsequent `set` fail with `error`.
    pub fn fail_writes_with(&mut self, error: StoreError) {
        self.fail_writes = Some(error);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw backend lookup, bypassing any namespace.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(err) = &self.fail_writes {
            return Err(err.clone());
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_keys() {
        let mut store = NamespacedStore::new("code.jcdn.io", MemoryStore::new());
        store.set("html", "# hi").unwrap();
        assert_eq!(store.backend().raw("code.jcdn.io_html"), Some("# hi"));
        assert_eq!(store.get("html").unwrap().as_deref(), Some("# hi"));
        assert_eq!(store.get("css").unwrap(), None);
    }

    #[test]
    fn test_namespace_isolation() {
        let backend = MemoryStore::with_entries([("other_html", "foreign")]);
        let store = NamespacedStore::new("code.jcdn.io", backend);
        assert_eq!(store.get("html").unwrap(), None);
    }

    #[test]
    fn test_write_failure_propagates() {
        let mut store = MemoryStore::new();
        store.fail_writes_with(StoreError::Backend("QuotaExceededError".into()));
        let err = store.set("k", "v").unwrap_err();
        assert_eq!(err, StoreError::Backend("QuotaExceededError".into()));
        assert!(store.is_empty());
    }
}
