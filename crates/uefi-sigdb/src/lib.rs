//! uefi-sigdb: persistent UEFI Secure-Boot signature databases.
//!
//! Maintains the allow/deny entries of a Secure-Boot database on behalf of a
//! firmware-configuration service: each entry is a signature payload with a
//! format and an owner GUID, persisted one record per id and restored at
//! startup with its original id.

pub mod allocator;
pub mod database;
pub mod digest;
pub mod error;
pub mod format;
pub mod guid;
pub mod record;
pub mod storage;
pub mod store;

// Re-export primary types
pub use allocator::IdAllocator;
pub use database::SignatureDatabase;
pub use error::{Result, SigDbError};
pub use format::SignatureFormat;
pub use guid::Guid;
pub use record::{NewSignature, SignatureRecord, SignatureView};
pub use storage::{FsStorage, MemoryStorage, RecordKey, RecordKind, RecordStorage, StorageEntry};
pub use store::{RestoreSummary, SignatureStore, StoreState};
