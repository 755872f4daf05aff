//! Key-value store abstraction.
//!
//! Reads go through individual calls; every write goes through [`KeyValueStore::apply`],
//! which applies a batch of [`StoreOp`]s atomically.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// A single write, applied as part of an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Set { key: String, value: String },
    SetEx { key: String, value: String, ttl_seconds: u64 },
    Delete { key: String },
    SetAdd { key: String, member: String },
    SetRemove { key: String, member: String },
    ListPush { key: String, value: String },
    Expire { key: String, ttl_seconds: u64 },
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Check connectivity
    async fn ping(&self) -> AppResult<()>;

    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Members of a set; empty when the key is missing
    async fn members(&self, key: &str) -> AppResult<Vec<String>>;

    /// Elements of a list in insertion order; empty when the key is missing
    async fn list(&self, key: &str) -> AppResult<Vec<String>>;

    /// All keys starting with `prefix`
    async fn keys_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;

    /// Remaining lifetime in seconds, `None` when the key is missing or persistent
    async fn ttl(&self, key: &str) -> AppResult<Option<u64>>;

    /// Apply all operations atomically, in order
    async fn apply(&self, ops: Vec<StoreOp>) -> AppResult<()>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// Fetch and decode a JSON value
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> AppResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::Store(format!("Malformed value at {}: {}", key, e))),
        None => Ok(None),
    }
}

#[derive(Debug, Clone)]
enum Value {
    String(String),
    Set(BTreeSet<String>),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process store, used for local development and tests
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, HashMap<String, Entry>>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Store("Memory store lock poisoned".to_string()))?;
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(entries)
    }
}

fn wrong_type(key: &str) -> AppError {
    AppError::Store(format!(
        "WRONGTYPE Operation against a key holding the wrong kind of value: {}",
        key
    ))
}

fn apply_op(entries: &mut HashMap<String, Entry>, op: StoreOp) -> AppResult<()> {
    match op {
        StoreOp::Set { key, value } => {
            entries.insert(
                key,
                Entry {
                    value: Value::String(value),
                    expires_at: None,
                },
            );
        }
        StoreOp::SetEx {
            key,
            value,
            ttl_seconds,
        } => {
            entries.insert(
                key,
                Entry {
                    value: Value::String(value),
                    expires_at: Some(Instant::now() + Duration::from_secs(ttl_seconds)),
                },
            );
        }
        StoreOp::Delete { key } => {
            entries.remove(&key);
        }
        StoreOp::SetAdd { key, member } => {
            let entry = entries.entry(key.clone()).or_insert_with(|| Entry {
                value: Value::Set(BTreeSet::new()),
                expires_at: None,
            });
            match &mut entry.value {
                Value::Set(set) => {
                    set.insert(member);
                }
                _ => return Err(wrong_type(&key)),
            }
        }
        StoreOp::SetRemove { key, member } => {
            let now_empty = match entries.get_mut(&key).map(|entry| &mut entry.value) {
                Some(Value::Set(set)) => {
                    set.remove(&member);
                    set.is_empty()
                }
                Some(_) => return Err(wrong_type(&key)),
                None => false,
            };
            // Redis drops a set once its last member is gone
            if now_empty {
                entries.remove(&key);
            }
        }
        StoreOp::ListPush { key, value } => {
            let entry = entries.entry(key.clone()).or_insert_with(|| Entry {
                value: Value::List(Vec::new()),
                expires_at: None,
            });
            match &mut entry.value {
                Value::List(list) => list.push(value),
                _ => return Err(wrong_type(&key)),
            }
        }
        StoreOp::Expire { key, ttl_seconds } => {
            if let Some(entry) = entries.get_mut(&key) {
                entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_seconds));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.lock().map(|_| ())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        match self.lock()?.get(key).map(|entry| &entry.value) {
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn members(&self, key: &str) -> AppResult<Vec<String>> {
        match self.lock()?.get(key).map(|entry| &entry.value) {
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn list(&self, key: &str) -> AppResult<Vec<String>> {
        match self.lock()?.get(key).map(|entry| &entry.value) {
            Some(Value::List(list)) => Ok(list.clone()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn keys_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .lock()?
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<u64>> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now).as_secs()))
    }

    async fn apply(&self, ops: Vec<StoreOp>) -> AppResult<()> {
        let mut entries = self.lock()?;
        // Work on a copy so a failing op leaves nothing half-applied
        let mut staged = entries.clone();
        for op in ops {
            apply_op(&mut staged, op)?;
        }
        *entries = staged;
        Ok(())
    }
}
