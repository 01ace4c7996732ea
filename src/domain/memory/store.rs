use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

/// Writer attribution used for orchestrator-provided entries
pub const SEED_WRITER: &str = "orchestrator";

/// A write that replaced a value owned by a different writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteConflict {
    pub key: String,
    pub previous_writer: String,
    pub writer: String,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Value>,
    writers: HashMap<String, String>,
    seeded: Vec<String>,
    conflicts: Vec<WriteConflict>,
}

/// Team-scoped key-value store through which agents exchange data
///
/// Cloning yields another handle to the same store; a `put` is visible to
/// every handle as soon as it returns. Writes to an existing key replace the
/// previous value (last writer wins, no versioning).
///
/// # Example
/// ```
/// use seo_agent_hub::domain::memory::SharedMemory;
/// use serde_json::json;
///
/// let memory = SharedMemory::new();
/// memory.put("ga_data", json!({"sessions": 10}));
/// assert_eq!(memory.get("ga_data"), Some(json!({"sessions": 10})));
/// assert_eq!(memory.get("semrush_data"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedMemory {
    inner: Arc<RwLock<Inner>>,
}

impl SharedMemory {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value. Never fails.
    pub fn put(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut inner = self.inner.write();
        inner.writers.remove(&key);
        inner.entries.insert(key, value);
    }

    /// Stores `value` under `key` on behalf of `writer`
    ///
    /// If another writer owned the key, the write still goes through but a
    /// [`WriteConflict`] is recorded.
    pub fn put_as(&self, writer: &str, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut inner = self.inner.write();
        if let Some(previous) = inner.writers.get(&key) {
            if previous != writer {
                tracing::warn!(
                    key = %key,
                    previous_writer = %previous,
                    writer = %writer,
                    "Shared memory key overwritten by a different writer"
                );
                let conflict = WriteConflict {
                    key: key.clone(),
                    previous_writer: previous.clone(),
                    writer: writer.to_string(),
                };
                inner.conflicts.push(conflict);
            }
        }
        inner.writers.insert(key.clone(), writer.to_string());
        inner.entries.insert(key, value);
    }

    /// Stores an orchestrator input; seeded keys are read-only for agents
    pub fn seed(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut inner = self.inner.write();
        if !inner.seeded.contains(&key) {
            inner.seeded.push(key.clone());
        }
        inner.writers.insert(key.clone(), SEED_WRITER.to_string());
        inner.entries.insert(key, value);
    }

    /// Returns the current value, or `None` if the key was never written.
    /// A key written as JSON null yields `Some(Value::Null)`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().entries.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    pub fn is_seeded(&self, key: &str) -> bool {
        self.inner.read().seeded.iter().any(|k| k == key)
    }

    /// Agent that last wrote `key` through [`put_as`](Self::put_as)
    pub fn writer_of(&self, key: &str) -> Option<String> {
        self.inner.read().writers.get(key).cloned()
    }

    /// Seeded entries, in seeding order
    pub fn seeds(&self) -> Vec<(String, Value)> {
        let inner = self.inner.read();
        inner
            .seeded
            .iter()
            .filter_map(|k| inner.entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }

    /// Consistent copy of every entry, ordered by key
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Keys currently present, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn conflicts(&self) -> Vec<WriteConflict> {
        self.inner.read().conflicts.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Drops every entry, seed and recorded conflict
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        *inner = Inner::default();
    }

    /// Returns true if both handles point at the same store
    pub fn same_store(&self, other: &SharedMemory) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
