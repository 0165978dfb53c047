//! Durable storage for signature records.
//!
//! A signature record persists as two sub-records keyed by its id: the
//! primary record (content and format) and the owner record (owner GUID).
//! Storage is byte-oriented; encoding lives in [`crate::record`].
//!
//! # Directory layout
//!
//! [`FsStorage`] keeps one file per sub-record directly in the install
//! directory of a signature database:
//!
//! ```text
//! {install_path}/
//! ├── 1              primary record of signature 1
//! ├── 1.owner        owner record of signature 1
//! ├── 2
//! ├── 7.corrupt      quarantined record that failed to load
//! └── 7.corrupt.1    a later copy of id 7 that also failed
//! ```
//!
//! Only extension-less files with a decimal name are restoration candidates,
//! so owner, temporary, and quarantined files never collide with record ids.
//!
//! # Modules
//!
//! - [`fs`]: [`FsStorage`], the filesystem backend.
//! - [`memory`]: [`MemoryStorage`], an in-memory backend with fault injection.

pub mod fs;
pub mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

/// Suffix of owner sub-record names.
pub const OWNER_SUFFIX: &str = "owner";

/// Suffix appended to sub-records moved aside after failing to load.
pub const QUARANTINE_SUFFIX: &str = "corrupt";

/// Which sub-record of a signature a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Content and format.
    Primary,
    /// Owner GUID.
    Owner,
}

/// Storage key of one sub-record, derived from the signature id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub id: u64,
    pub kind: RecordKind,
}

impl RecordKey {
    pub fn primary(id: u64) -> Self {
        Self {
            id,
            kind: RecordKind::Primary,
        }
    }

    pub fn owner(id: u64) -> Self {
        Self {
            id,
            kind: RecordKind::Owner,
        }
    }

    /// Entry name of this sub-record inside the install directory.
    pub fn file_name(&self) -> String {
        match self.kind {
            RecordKind::Primary => self.id.to_string(),
            RecordKind::Owner => format!("{}.{OWNER_SUFFIX}", self.id),
        }
    }

    /// Entry name after quarantine.
    pub fn quarantine_name(&self) -> String {
        format!("{}.{QUARANTINE_SUFFIX}", self.file_name())
    }

    /// Quarantine names in order of preference: `<name>.corrupt`, then
    /// `<name>.corrupt.1`, `<name>.corrupt.2`, and so on. Backends take the
    /// first one that is not already used.
    pub fn quarantine_names(&self) -> impl Iterator<Item = String> {
        let base = self.quarantine_name();
        std::iter::once(base.clone()).chain((1u64..).map(move |n| format!("{base}.{n}")))
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// One entry of the install directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub name: String,
    pub is_regular_file: bool,
}

impl StorageEntry {
    /// The signature id this entry holds a primary record for, if any.
    ///
    /// Accepts regular files whose whole name is a canonical positive
    /// decimal integer: no extension, no sign, no leading zeros.
    pub fn candidate_id(&self) -> Option<u64> {
        if !self.is_regular_file {
            return None;
        }
        let id: u64 = self.name.parse().ok()?;
        if id == 0 || id.to_string() != self.name {
            return None;
        }
        Some(id)
    }
}

/// Byte-oriented storage of signature sub-records.
///
/// Implementations are blocking. Removing an absent key succeeds.
pub trait RecordStorage: Send + Sync {
    /// Make sure the backing location exists and is private.
    fn prepare(&self) -> Result<()>;

    /// Return `true` if the sub-record has persisted data.
    fn exists(&self, key: &RecordKey) -> bool;

    /// Read a sub-record. `Ok(None)` if it does not exist.
    fn read_record(&self, key: &RecordKey) -> Result<Option<Vec<u8>>>;

    /// Write (or overwrite) a sub-record.
    fn write_record(&self, key: &RecordKey, bytes: &[u8]) -> Result<()>;

    /// Remove a sub-record. Returns whether it was present.
    fn remove_record(&self, key: &RecordKey) -> Result<bool>;

    /// List every entry of the backing location, in backend order.
    fn list_entries(&self) -> Result<Vec<StorageEntry>>;

    /// Move a sub-record aside so it is no longer a restoration candidate.
    /// Returns whether it was present.
    fn quarantine(&self, key: &RecordKey) -> Result<bool>;

    /// Human-readable location of a sub-record, for diagnostics.
    fn locate(&self, key: &RecordKey) -> String {
        key.file_name()
    }
}
