use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use fishledger_core::{DomainError, DomainResult, Entity};

/// Keyed create/read/update storage for business documents.
pub trait DocumentStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> DomainResult<Option<V>>;
    /// Fails with `Conflict` when the key is taken.
    fn create(&self, key: K, value: V) -> DomainResult<()>;
    /// Fails with `NotFound` when the key is unknown.
    fn update(&self, key: K, value: V) -> DomainResult<()>;
    fn list(&self) -> DomainResult<Vec<V>>;
}

impl<K, V, S> DocumentStore<K, V> for Arc<S>
where
    S: DocumentStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> DomainResult<Option<V>> {
        (**self).get(key)
    }

    fn create(&self, key: K, value: V) -> DomainResult<()> {
        (**self).create(key, value)
    }

    fn update(&self, key: K, value: V) -> DomainResult<()> {
        (**self).update(key, value)
    }

    fn list(&self) -> DomainResult<Vec<V>> {
        (**self).list()
    }
}

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryDocumentStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryDocumentStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryDocumentStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> DomainError {
    DomainError::invariant("document store lock poisoned")
}

impl<K, V> DocumentStore<K, V> for InMemoryDocumentStore<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> DomainResult<Option<V>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn create(&self, key: K, value: V) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&key) {
            return Err(DomainError::conflict(format!("document {key} already exists")));
        }
        map.insert(key, value);
        Ok(())
    }

    fn update(&self, key: K, value: V) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("document {key}"))),
        }
    }

    fn list(&self) -> DomainResult<Vec<V>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }
}

/// Load a document or fail with `NotFound`.
pub(crate) fn load<K, V>(store: &dyn DocumentStore<K, V>, key: &K, kind: &str) -> DomainResult<V>
where
    K: Display,
{
    store
        .get(key)?
        .ok_or_else(|| DomainError::not_found(format!("{kind} {key}")))
}

/// Store a brand-new entity under its own id.
pub(crate) fn insert<V>(store: &dyn DocumentStore<V::Id, V>, value: V) -> DomainResult<()>
where
    V: Entity,
{
    store.create(value.id().clone(), value)
}

/// Replace an entity under its own id.
pub(crate) fn save<V>(store: &dyn DocumentStore<V::Id, V>, value: V) -> DomainResult<()>
where
    V: Entity,
{
    store.update(value.id().clone(), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_refuses_existing_keys() {
        let store = InMemoryDocumentStore::<u32, String>::new();
        store.create(1, "a".to_string()).unwrap();
        assert!(matches!(store.create(1, "b".to_string()), Err(DomainError::Conflict(_))));
        assert_eq!(store.get(&1).unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn update_requires_an_existing_document() {
        let store = InMemoryDocumentStore::<u32, String>::new();
        assert!(matches!(store.update(7, "x".to_string()), Err(DomainError::NotFound(_))));
        store.create(7, "x".to_string()).unwrap();
        store.update(7, "y".to_string()).unwrap();
        assert_eq!(store.list().unwrap(), vec!["y".to_string()]);
    }

    #[test]
    fn load_names_the_missing_document() {
        let store = InMemoryDocumentStore::<u32, String>::new();
        let err = load(&store, &3, "arrival").unwrap_err();
        assert_eq!(err, DomainError::NotFound("arrival 3".to_string()));
    }

    #[test]
    fn poisoned_lock_is_an_error_not_a_missing_document() {
        let store = InMemoryDocumentStore::<u32, String>::new();
        store.create(1, "a".to_string()).unwrap();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.inner.write().unwrap();
            panic!("writer died");
        }));

        assert!(matches!(store.get(&1), Err(DomainError::InvariantViolation(_))));
        assert!(matches!(store.list(), Err(DomainError::InvariantViolation(_))));
        let err = load(&store, &1, "arrival").unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }
}
