//! Persistent cache of post-date ledgers.
//!
//! All partitions live in one record under [`STORE_KEY`] as a JSON map of
//! partition key to ledger. The record is advisory: unreadable data is
//! dropped and treated as an empty cache.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const STORE_KEY: &str = "postData";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read cache file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache file: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache record: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value port standing in for the browser's persistent storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Key-value store persisted as a JSON object in a single file.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> HashMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("ignoring unreadable cache file {}: {e}", self.path.display());
                return HashMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("discarding corrupt cache file {}: {e}", self.path.display());
            HashMap::new()
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut values = self.load();
        values.insert(key.to_string(), value);
        let encoded = serde_json::to_vec(&values).map_err(|e| StoreError::Encode { source: e })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(&self.path, encoded).map_err(|e| StoreError::Write {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}

/// Post count, per-post timestamps and last-modified marker for one
/// query/label partition of the feed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostDateLedger {
    pub total_posts: usize,
    pub post_dates: Vec<String>,
    pub blog_updated: Option<String>,
}

impl PostDateLedger {
    pub fn has_dates(&self) -> bool {
        self.total_posts > 0 && !self.post_dates.is_empty()
    }
}

// djb2 with xor, folded to 32 bits and printed in base 36.
fn hash_key(value: &str) -> String {
    let mut hash: u32 = 5381;
    for unit in value.encode_utf16() {
        hash = hash.wrapping_mul(33) ^ u32::from(unit);
    }
    to_base36(hash)
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Cache partition for a query/label pair. A query takes precedence over a
/// label; neither selects the chronological `all` partition.
pub fn partition_key(query: Option<&str>, label: Option<&str>) -> String {
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        return format!("query-{}", hash_key(query));
    }
    if let Some(label) = label.filter(|l| !l.is_empty()) {
        return format!("label-{}", hash_key(label));
    }
    "all".to_string()
}

pub struct PostCache<S> {
    store: S,
}

impl<S: KeyValueStore> PostCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn load_record(&self) -> HashMap<String, PostDateLedger> {
        let Some(raw) = self.store.get(STORE_KEY) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("discarding unparseable pager cache: {e}");
                HashMap::new()
            }
        }
    }

    pub fn get(&self, query: Option<&str>, label: Option<&str>) -> PostDateLedger {
        let key = partition_key(query, label);
        let ledger = self.load_record().remove(&key).unwrap_or_default();
        debug!(
            "cache partition {key}: {} posts, {} dates",
            ledger.total_posts,
            ledger.post_dates.len()
        );
        ledger
    }

    pub fn set(
        &mut self,
        query: Option<&str>,
        label: Option<&str>,
        ledger: &PostDateLedger,
    ) -> Result<(), StoreError> {
        let mut record = self.load_record();
        record.insert(partition_key(query, label), ledger.clone());
        let encoded = serde_json::to_string(&record).map_err(|e| StoreError::Encode { source: e })?;
        self.store.set(STORE_KEY, encoded)
    }

    /// Read-modify-write of one partition.
    pub fn update<F>(&mut self, query: Option<&str>, label: Option<&str>, f: F) -> Result<PostDateLedger, StoreError>
    where
        F: FnOnce(&mut PostDateLedger),
    {
        let mut ledger = self.get(query, label);
        f(&mut ledger);
        self.set(query, label, &ledger)?;
        Ok(ledger)
    }
}
