//! Filesystem-backed record storage.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, SigDbError};
use crate::storage::{RecordKey, RecordStorage, StorageEntry};

/// Suffix of the scratch file used while replacing a sub-record.
const TMP_SUFFIX: &str = "tmp";

/// Permission bits of the install directory (owner read/write/execute).
#[cfg(unix)]
const INSTALL_DIR_MODE: u32 = 0o700;

/// Stores each sub-record as a file in one install directory.
///
/// The storage is safe for single-process use; concurrent writers from
/// multiple processes are not coordinated.
#[derive(Debug, Clone)]
pub struct FsStorage {
    install_path: PathBuf,
}

impl FsStorage {
    /// Create storage rooted at `install_path`. No I/O happens until
    /// [`RecordStorage::prepare`] or the first record operation.
    pub fn new(install_path: impl Into<PathBuf>) -> Self {
        Self {
            install_path: install_path.into(),
        }
    }

    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    fn record_path(&self, key: &RecordKey) -> PathBuf {
        self.install_path.join(key.file_name())
    }

    fn not_a_directory(&self) -> SigDbError {
        SigDbError::InternalFailure(format!(
            "signature install path {} exists but is not a directory",
            self.install_path.display()
        ))
    }

    #[cfg(unix)]
    fn restrict_permissions(&self) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            &self.install_path,
            std::fs::Permissions::from_mode(INSTALL_DIR_MODE),
        )?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn restrict_permissions(&self) -> Result<()> {
        Ok(())
    }
}

impl RecordStorage for FsStorage {
    fn prepare(&self) -> Result<()> {
        if !self.install_path.exists() {
            std::fs::create_dir_all(&self.install_path)?;
        } else if !self.install_path.is_dir() {
            return Err(self.not_a_directory());
        }
        self.restrict_permissions()
    }

    fn exists(&self, key: &RecordKey) -> bool {
        self.record_path(key).exists()
    }

    fn read_record(&self, key: &RecordKey) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SigDbError::StorageRead(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Writes to a scratch file first and renames it over the record, so a
    /// crash never leaves a half-written record behind.
    fn write_record(&self, key: &RecordKey, bytes: &[u8]) -> Result<()> {
        let path = self.record_path(key);
        let tmp = self
            .install_path
            .join(format!("{}.{TMP_SUFFIX}", key.file_name()));

        let write_err = |e: std::io::Error| {
            SigDbError::StorageWrite(format!("failed to write {}: {e}", path.display()))
        };

        std::fs::write(&tmp, bytes).map_err(write_err)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        Ok(())
    }

    fn remove_record(&self, key: &RecordKey) -> Result<bool> {
        let path = self.record_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SigDbError::StorageWrite(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }

    /// A missing install directory lists as empty; an install path that
    /// exists as something other than a directory is an error.
    fn list_entries(&self) -> Result<Vec<StorageEntry>> {
        if !self.install_path.exists() {
            return Ok(Vec::new());
        }
        if !self.install_path.is_dir() {
            return Err(self.not_a_directory());
        }

        let read_err = |e: std::io::Error| {
            SigDbError::StorageRead(format!(
                "failed to list {}: {e}",
                self.install_path.display()
            ))
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.install_path).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            entries.push(StorageEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                // Follows symlinks, so a link to a record file still counts.
                is_regular_file: entry.path().is_file(),
            });
        }

        Ok(entries)
    }

    /// Earlier quarantined copies of the same sub-record are kept.
    fn quarantine(&self, key: &RecordKey) -> Result<bool> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(false);
        }
        let target = key
            .quarantine_names()
            .map(|name| self.install_path.join(name))
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| self.install_path.join(key.quarantine_name()));
        match std::fs::rename(&path, &target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SigDbError::StorageWrite(format!(
                "failed to quarantine {}: {e}",
                path.display()
            ))),
        }
    }

    fn locate(&self, key: &RecordKey) -> String {
        self.record_path(key).display().to_string()
    }
}
