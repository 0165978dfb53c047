//! Signature records: one entry of a signature database.
//!
//! A record holds the signature content, its format, and its owner GUID, and
//! writes every change through to storage before returning. Content and
//! format share the primary sub-record; the owner GUID lives in its own
//! sub-record.
//!
//! Primary sub-record format:
//! ```json
//! {
//!     "version": 1,
//!     "signature": { "content": "...", "format": "EFI_CERT_SHA256_GUID" }
//! }
//! ```
//!
//! Owner sub-record format:
//! ```json
//! { "version": 1, "owner": "77fa9abd-0359-4d32-bd60-28f4e78f784b" }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigDbError};
use crate::format::SignatureFormat;
use crate::guid::Guid;
use crate::storage::{RecordKey, RecordStorage};

// ── File format constants ─────────────────────────────────────────────────────

const SIGNATURE_FILE_VERSION: u32 = 1;
const OWNER_FILE_VERSION: u32 = 1;

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignatureFields {
    content: String,
    #[serde(default)]
    format: SignatureFormat,
}

/// Wrapper written for the primary sub-record.
#[derive(Debug, Serialize, Deserialize)]
struct SignatureFile {
    /// Format version number.
    version: u32,
    /// The stored fields.
    signature: SignatureFields,
}

/// Wrapper written for the owner sub-record.
#[derive(Debug, Serialize, Deserialize)]
struct OwnerFile {
    /// Format version number.
    version: u32,
    /// The owner GUID.
    owner: Guid,
}

// ── NewSignature ──────────────────────────────────────────────────────────────

/// Initial field values for a record being created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSignature {
    pub content: String,
    pub format: SignatureFormat,
    pub owner: Guid,
}

impl NewSignature {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn format(mut self, format: SignatureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn owner(mut self, owner: Guid) -> Self {
        self.owner = owner;
        self
    }
}

// ── SignatureView ─────────────────────────────────────────────────────────────

/// Plain snapshot of a record's business fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureView {
    pub id: u64,
    pub content: String,
    pub format: SignatureFormat,
    pub owner: Guid,
}

// ── SignatureRecord ───────────────────────────────────────────────────────────

/// One signature entry with write-through persistence.
pub struct SignatureRecord {
    id: u64,
    content: String,
    format: SignatureFormat,
    owner: Guid,
    storage: Arc<dyn RecordStorage>,
}

impl SignatureRecord {
    /// Construct the record stored under `id`.
    ///
    /// If storage already holds a primary sub-record for `id`, the stored
    /// content, format, and owner replace the values in `init`. Otherwise
    /// non-default initial values are persisted immediately; if that fails
    /// nothing is left behind in storage.
    ///
    /// # Errors
    ///
    /// `StorageRead` or `CorruptRecord` when loading, `StorageWrite` when
    /// persisting initial values.
    pub fn create(id: u64, init: NewSignature, storage: Arc<dyn RecordStorage>) -> Result<Self> {
        let mut record = Self {
            id,
            content: init.content,
            format: init.format,
            owner: init.owner,
            storage,
        };

        if record.storage.exists(&record.primary_key()) {
            record.load()?;
            return Ok(record);
        }

        if !record.content.is_empty() || record.format != SignatureFormat::Unspecified {
            record.save_primary()?;
        }

        let owner_key = record.owner_key();
        if !record.owner.is_nil() {
            if let Err(e) = record.save_owner() {
                record.discard_primary();
                return Err(e);
            }
        } else if record.storage.exists(&owner_key) {
            // Left over from an earlier record with the same id.
            log::warn!(
                "removing stale signature owner record; path={}",
                record.storage.locate(&owner_key)
            );
            if let Err(e) = record.storage.remove_record(&owner_key) {
                record.discard_primary();
                return Err(e);
            }
        }

        Ok(record)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn format(&self) -> SignatureFormat {
        self.format
    }

    pub fn owner(&self) -> Guid {
        self.owner
    }

    /// Snapshot of the business fields.
    pub fn view(&self) -> SignatureView {
        SignatureView {
            id: self.id,
            content: self.content.clone(),
            format: self.format,
            owner: self.owner,
        }
    }

    /// Replace the content and persist it. Returns the previous content.
    ///
    /// On `StorageWrite` the new content stays in memory; it is not rolled
    /// back.
    pub fn set_content(&mut self, value: impl Into<String>) -> Result<String> {
        let previous = std::mem::replace(&mut self.content, value.into());
        self.save_primary()?;
        Ok(previous)
    }

    /// Replace the format and persist it. Returns the previous format.
    pub fn set_format(&mut self, value: SignatureFormat) -> Result<SignatureFormat> {
        let previous = std::mem::replace(&mut self.format, value);
        self.save_primary()?;
        Ok(previous)
    }

    /// Replace the owner GUID and persist it. Returns the previous owner.
    pub fn set_owner(&mut self, value: Guid) -> Result<Guid> {
        let previous = std::mem::replace(&mut self.owner, value);
        self.save_owner()?;
        Ok(previous)
    }

    /// Return `true` if this record holds exactly `candidate`.
    pub fn matches_content(&self, candidate: &str) -> bool {
        self.content == candidate
    }

    /// Remove both sub-records from storage. Already-absent sub-records are
    /// logged, not treated as errors.
    ///
    /// The owner goes first: the primary decides whether the record is
    /// restored, so it must outlive any failed removal.
    pub fn delete_storage(&self) -> Result<()> {
        self.storage.remove_record(&self.owner_key())?;

        let primary = self.primary_key();
        if !self.storage.remove_record(&primary)? {
            log::info!(
                "signature record not found; path={}",
                self.storage.locate(&primary)
            );
        }
        Ok(())
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Undo a primary written by `create` whose owner could not follow.
    fn discard_primary(&self) {
        let primary = self.primary_key();
        if let Err(e) = self.storage.remove_record(&primary) {
            log::warn!(
                "failed to remove partially created signature record; path={} err={e}",
                self.storage.locate(&primary)
            );
        }
    }

    fn primary_key(&self) -> RecordKey {
        RecordKey::primary(self.id)
    }

    fn owner_key(&self) -> RecordKey {
        RecordKey::owner(self.id)
    }

    fn load(&mut self) -> Result<()> {
        let primary = self.primary_key();
        if let Some(bytes) = self.storage.read_record(&primary)? {
            let fields = decode_signature(&bytes)
                .map_err(|e| self.corrupt(&primary, "signature", e))?;
            self.content = fields.content;
            self.format = fields.format;
        }

        let owner = self.owner_key();
        if let Some(bytes) = self.storage.read_record(&owner)? {
            self.owner = decode_owner(&bytes).map_err(|e| self.corrupt(&owner, "owner", e))?;
        }

        Ok(())
    }

    fn corrupt(&self, key: &RecordKey, what: &str, e: SigDbError) -> SigDbError {
        log::error!(
            "failed to load signature {what}; id={} path={} err={e}",
            self.id,
            self.storage.locate(key)
        );
        e
    }

    fn save_primary(&self) -> Result<()> {
        let file = SignatureFile {
            version: SIGNATURE_FILE_VERSION,
            signature: SignatureFields {
                content: self.content.clone(),
                format: self.format,
            },
        };
        self.write(&self.primary_key(), &file, "signature")
    }

    fn save_owner(&self) -> Result<()> {
        let file = OwnerFile {
            version: OWNER_FILE_VERSION,
            owner: self.owner,
        };
        self.write(&self.owner_key(), &file, "owner")
    }

    fn write<T: Serialize>(&self, key: &RecordKey, file: &T, what: &str) -> Result<()> {
        let json = serde_json::to_vec_pretty(file)
            .map_err(|e| SigDbError::SerializationError(e.to_string()))?;

        self.storage.write_record(key, &json).map_err(|e| {
            log::error!(
                "failed to save signature {what}; id={} path={} err={e}",
                self.id,
                self.storage.locate(key)
            );
            e
        })
    }
}

impl fmt::Debug for SignatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureRecord")
            .field("id", &self.id)
            .field("content", &self.content)
            .field("format", &self.format)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

// ── Codec ─────────────────────────────────────────────────────────────────────

fn decode_signature(bytes: &[u8]) -> Result<SignatureFields> {
    let file: SignatureFile = serde_json::from_slice(bytes)
        .map_err(|e| SigDbError::CorruptRecord(format!("failed to parse signature: {e}")))?;
    check_version(file.version, SIGNATURE_FILE_VERSION)?;
    Ok(file.signature)
}

fn decode_owner(bytes: &[u8]) -> Result<Guid> {
    let file: OwnerFile = serde_json::from_slice(bytes)
        .map_err(|e| SigDbError::CorruptRecord(format!("failed to parse owner: {e}")))?;
    check_version(file.version, OWNER_FILE_VERSION)?;
    Ok(file.owner)
}

/// Older versions are read as-is; newer ones cannot be trusted to mean the
/// same thing.
fn check_version(found: u32, supported: u32) -> Result<()> {
    if found == 0 || found > supported {
        return Err(SigDbError::CorruptRecord(format!(
            "unsupported record version {found} (supported up to {supported})"
        )));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
