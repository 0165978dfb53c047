//! In-memory record storage.
//!
//! [`MemoryStorage`] keeps sub-records in a [`BTreeMap`] keyed by entry name.
//! Clones share the same map, so a test can hand one clone to a store and
//! inspect the data through another.
//!
//! With the `testing` feature, raw entries can be planted and write or
//! remove failures injected to exercise the store's error paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, SigDbError};
use crate::storage::{RecordKey, RecordKind, RecordStorage, StorageEntry};

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<String, Vec<u8>>,
    directories: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct Faults {
    writes: AtomicBool,
    removes: AtomicBool,
    owner_removes: AtomicBool,
}

/// Shared in-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
    faults: Arc<Faults>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes stored under an entry name.
    pub fn raw(&self, name: &str) -> Option<Vec<u8>> {
        self.inner.read().records.get(name).cloned()
    }

    /// Names of all stored sub-records, sorted.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().records.keys().cloned().collect()
    }

    fn fails_removal_of(&self, key: &RecordKey) -> bool {
        self.faults.removes.load(Ordering::SeqCst)
            || (key.kind == RecordKind::Owner && self.faults.owner_removes.load(Ordering::SeqCst))
    }
}

#[cfg(any(test, feature = "testing"))]
impl MemoryStorage {
    /// Insert raw bytes under an arbitrary entry name.
    pub fn insert_raw(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.inner.write().records.insert(name.into(), bytes.into());
    }

    /// Add a directory entry to the listing.
    pub fn insert_dir(&self, name: impl Into<String>) {
        self.inner.write().directories.insert(name.into());
    }

    /// Make every subsequent write fail with `StorageWrite`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.faults.writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent remove or quarantine fail with `StorageWrite`.
    pub fn set_fail_removes(&self, fail: bool) {
        self.faults.removes.store(fail, Ordering::SeqCst);
    }

    /// Make removals of owner sub-records fail with `StorageWrite`.
    pub fn set_fail_owner_removes(&self, fail: bool) {
        self.faults.owner_removes.store(fail, Ordering::SeqCst);
    }
}

impl RecordStorage for MemoryStorage {
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn exists(&self, key: &RecordKey) -> bool {
        self.inner.read().records.contains_key(&key.file_name())
    }

    fn read_record(&self, key: &RecordKey) -> Result<Option<Vec<u8>>> {
        Ok(self.raw(&key.file_name()))
    }

    fn write_record(&self, key: &RecordKey, bytes: &[u8]) -> Result<()> {
        if self.faults.writes.load(Ordering::SeqCst) {
            return Err(SigDbError::StorageWrite(format!(
                "injected write failure for {key}"
            )));
        }
        self.inner
            .write()
            .records
            .insert(key.file_name(), bytes.to_vec());
        Ok(())
    }

    fn remove_record(&self, key: &RecordKey) -> Result<bool> {
        if self.fails_removal_of(key) {
            return Err(SigDbError::StorageWrite(format!(
                "injected remove failure for {key}"
            )));
        }
        Ok(self.inner.write().records.remove(&key.file_name()).is_some())
    }

    fn list_entries(&self) -> Result<Vec<StorageEntry>> {
        let inner = self.inner.read();
        let files = inner.records.keys().map(|name| StorageEntry {
            name: name.clone(),
            is_regular_file: true,
        });
        let dirs = inner.directories.iter().map(|name| StorageEntry {
            name: name.clone(),
            is_regular_file: false,
        });
        Ok(files.chain(dirs).collect())
    }

    fn quarantine(&self, key: &RecordKey) -> Result<bool> {
        if self.fails_removal_of(key) {
            return Err(SigDbError::StorageWrite(format!(
                "injected quarantine failure for {key}"
            )));
        }
        let mut inner = self.inner.write();
        let Some(bytes) = inner.records.remove(&key.file_name()) else {
            return Ok(false);
        };
        let target = key
            .quarantine_names()
            .find(|name| !inner.records.contains_key(name))
            .unwrap_or_else(|| key.quarantine_name());
        inner.records.insert(target, bytes);
        Ok(true)
    }
}
