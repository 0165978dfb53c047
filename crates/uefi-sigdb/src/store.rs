//! Signature store: the authoritative collection of one signature database.
//!
//! The store owns the live records and the id allocator. Construction
//! prepares the install directory and restores every stored record; a record
//! that fails to load is logged, moved aside, and its id recycled, without
//! aborting the rest of the restoration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::allocator::IdAllocator;
use crate::database::SignatureDatabase;
use crate::error::{Result, SigDbError};
use crate::format::SignatureFormat;
use crate::record::{NewSignature, SignatureRecord, SignatureView};
use crate::storage::{FsStorage, RecordKey, RecordStorage};

/// Lifecycle of a store. Restoration runs once, inside construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Restoring,
    Ready,
}

/// Outcome of the restoration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Number of records restored.
    pub restored: usize,
    /// Ids whose records failed to load and were quarantined.
    pub failed: Vec<u64>,
}

/// Collection of signature records backed by durable storage.
///
/// Mutations take `&mut self`; the store does no internal locking. Two
/// stores over the same install directory are not supported.
pub struct SignatureStore {
    storage: Arc<dyn RecordStorage>,
    install_path: Option<PathBuf>,
    records: Vec<SignatureRecord>,
    allocator: IdAllocator,
    /// Ids skipped by `add` because storage already held a record there.
    occupied: BTreeSet<u64>,
    state: StoreState,
    restore_summary: RestoreSummary,
}

impl SignatureStore {
    /// Open the store kept in `install_path`, creating the directory if
    /// needed and restoring any records already there.
    ///
    /// # Errors
    ///
    /// Returns `SigDbError::InternalFailure` if `install_path` exists but is
    /// not a directory, or `SigDbError::StorageRead` if it cannot be listed.
    /// A directory that cannot be created is logged and yields an empty
    /// store; later writes then fail with `StorageWrite`.
    pub fn open(install_path: impl Into<PathBuf>) -> Result<Self> {
        let install_path = install_path.into();
        let storage = Arc::new(FsStorage::new(&install_path));
        let mut store = Self::unrestored(storage, Some(install_path));
        store.initialize()?;
        Ok(store)
    }

    /// Open the store of one Secure-Boot database under `root`.
    pub fn open_database(root: impl AsRef<Path>, database: SignatureDatabase) -> Result<Self> {
        Self::open(database.install_path(root))
    }

    /// Build a store over an arbitrary storage backend.
    pub fn with_storage(storage: Arc<dyn RecordStorage>) -> Result<Self> {
        let mut store = Self::unrestored(storage, None);
        store.initialize()?;
        Ok(store)
    }

    fn unrestored(storage: Arc<dyn RecordStorage>, install_path: Option<PathBuf>) -> Self {
        Self {
            storage,
            install_path,
            records: Vec::new(),
            allocator: IdAllocator::new(),
            occupied: BTreeSet::new(),
            state: StoreState::Uninitialized,
            restore_summary: RestoreSummary::default(),
        }
    }

    fn initialize(&mut self) -> Result<()> {
        // A directory we cannot create or chmod is reported but does not
        // stop the store from coming up.
        if let Err(e) = self.storage.prepare() {
            log::error!(
                "failed to prepare signature directory; path={} err={e}",
                self.location()
            );
        }
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        self.state = StoreState::Restoring;

        let entries = self.storage.list_entries().map_err(|e| {
            log::error!(
                "failed to restore signatures; path={} err={e}",
                self.location()
            );
            e
        })?;

        for entry in entries {
            let Some(id) = entry.candidate_id() else {
                continue;
            };

            self.allocator.allocate_designated(id);
            match SignatureRecord::create(id, NewSignature::default(), self.storage.clone()) {
                Ok(record) => {
                    self.records.push(record);
                    self.restore_summary.restored += 1;
                }
                Err(e) => {
                    log::error!("skipping unreadable signature record; id={id} err={e}");
                    self.allocator.release(id);
                    self.quarantine(id);
                    self.restore_summary.failed.push(id);
                }
            }
        }

        log::info!(
            "restored signatures; path={} restored={} failed={}",
            self.location(),
            self.restore_summary.restored,
            self.restore_summary.failed.len()
        );

        self.state = StoreState::Ready;
        Ok(())
    }

    /// Move both sub-records of a failed id out of the candidate namespace
    /// so the id can be reused cleanly.
    fn quarantine(&self, id: u64) {
        for key in [RecordKey::primary(id), RecordKey::owner(id)] {
            match self.storage.quarantine(&key) {
                Ok(true) => log::warn!(
                    "quarantined signature record; path={}",
                    self.storage.locate(&key)
                ),
                Ok(false) => {}
                Err(e) => log::error!(
                    "failed to quarantine signature record; path={} err={e}",
                    self.storage.locate(&key)
                ),
            }
        }
    }

    // ── Mutations ─────────────────────────────────────────────────────────────

    /// Add a signature and return its id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for empty content, `AlreadyExists` if a live record
    /// already holds `content`, or the storage error that prevented the
    /// record from being persisted. No record is added on error.
    pub fn add(&mut self, content: impl Into<String>, format: SignatureFormat) -> Result<u64> {
        self.add_signature(NewSignature::new(content).format(format))
    }

    /// Add a signature with all initial fields, including its owner GUID.
    pub fn add_signature(&mut self, init: NewSignature) -> Result<u64> {
        self.ensure_ready()?;

        if init.content.is_empty() {
            return Err(SigDbError::InvalidArgument(
                "signature content must not be empty".to_string(),
            ));
        }
        if !self.is_unique(&init.content) {
            return Err(SigDbError::AlreadyExists(
                "signature content already present".to_string(),
            ));
        }

        let id = self.allocate_unoccupied();

        match SignatureRecord::create(id, init, self.storage.clone()) {
            Ok(record) => {
                log::info!("added signature; id={id} format={}", record.format());
                self.records.push(record);
                Ok(id)
            }
            Err(e) => {
                log::error!("failed to add signature; id={id} err={e}");
                self.allocator.release(id);
                Err(e)
            }
        }
    }

    /// Delete one signature and release its id.
    ///
    /// # Errors
    ///
    /// `InternalFailure` if no live record has `id`; the storage error if its
    /// sub-records cannot be removed, in which case the record stays live.
    pub fn delete(&mut self, id: u64) -> Result<()> {
        self.ensure_ready()?;

        let Some(pos) = self.records.iter().position(|r| r.id() == id) else {
            log::error!("signature does not exist; id={id}");
            return Err(SigDbError::InternalFailure(format!(
                "signature {id} does not exist"
            )));
        };

        self.records[pos].delete_storage()?;
        self.allocator.release(id);
        self.records.remove(pos);

        log::info!("deleted signature; id={id}");
        Ok(())
    }

    /// Delete every signature and reset the id space to start at `1`.
    ///
    /// Records whose storage cannot be removed stay live; in that case the
    /// id space is not reset and the first error is returned.
    pub fn delete_all(&mut self) -> Result<()> {
        self.ensure_ready()?;

        let mut first_error = None;
        let mut kept = Vec::new();
        let mut released = Vec::new();

        for record in self.records.drain(..) {
            match record.delete_storage() {
                Ok(()) => released.push(record.id()),
                Err(e) => {
                    log::error!("failed to delete signature; id={} err={e}", record.id());
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    kept.push(record);
                }
            }
        }
        self.records = kept;

        match first_error {
            None => {
                self.allocator.reset_all();
                self.occupied.clear();
                log::info!("deleted all signatures; count={}", released.len());
                Ok(())
            }
            Some(e) => {
                for id in released {
                    self.allocator.release(id);
                }
                Err(e)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Live records in insertion order. Restored records come first, in the
    /// order the storage listed them.
    pub fn list(&self) -> &[SignatureRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignatureRecord> {
        self.records.iter()
    }

    /// Snapshots of every live record.
    pub fn views(&self) -> Vec<SignatureView> {
        self.records.iter().map(SignatureRecord::view).collect()
    }

    pub fn get(&self, id: u64) -> Option<&SignatureRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Mutable access for field updates. Setters write through to storage;
    /// content changes made here are not checked for uniqueness.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut SignatureRecord> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return `true` if no live record holds `content`.
    pub fn is_unique(&self, content: &str) -> bool {
        !self.records.iter().any(|r| r.matches_content(content))
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    pub fn restore_summary(&self) -> &RestoreSummary {
        &self.restore_summary
    }

    /// Install directory, for stores opened from the filesystem.
    pub fn install_path(&self) -> Option<&Path> {
        self.install_path.as_deref()
    }

    /// Ids held back because storage had a record the store did not restore.
    /// They stay out of circulation until `delete_all` or the next restore.
    pub fn occupied_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.occupied.iter().copied()
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Allocate an id whose primary slot in storage is empty.
    fn allocate_unoccupied(&mut self) -> u64 {
        loop {
            let id = self.allocator.allocate();
            let key = RecordKey::primary(id);
            if !self.storage.exists(&key) {
                return id;
            }
            log::warn!(
                "skipping occupied signature slot; id={id} path={}",
                self.storage.locate(&key)
            );
            self.occupied.insert(id);
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state != StoreState::Ready {
            return Err(SigDbError::InternalFailure(format!(
                "signature store is {:?}, not ready",
                self.state
            )));
        }
        Ok(())
    }

    fn location(&self) -> String {
        match &self.install_path {
            Some(path) => path.display().to_string(),
            None => "<custom storage>".to_string(),
        }
    }
}

impl std::fmt::Debug for SignatureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureStore")
            .field("install_path", &self.install_path)
            .field("records", &self.records)
            .field("allocator", &self.allocator)
            .field("occupied", &self.occupied)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
