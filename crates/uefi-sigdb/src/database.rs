//! Secure-Boot signature databases.
//!
//! Firmware keeps one signature list per authenticated variable. A service
//! runs one [`SignatureStore`](crate::SignatureStore) per database, each in
//! its own install directory under a common root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigDbError};

/// The authenticated variables that hold signature lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureDatabase {
    /// Platform key.
    Pk,
    /// Key exchange keys.
    Kek,
    /// Allowed signatures.
    Db,
    /// Forbidden signatures.
    Dbx,
    /// Timestamp signatures.
    Dbt,
    /// Recovery signatures.
    Dbr,
}

impl SignatureDatabase {
    pub const ALL: [SignatureDatabase; 6] = [
        Self::Pk,
        Self::Kek,
        Self::Db,
        Self::Dbx,
        Self::Dbt,
        Self::Dbr,
    ];

    /// Name of the install directory below the root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Pk => "pk",
            Self::Kek => "kek",
            Self::Db => "db",
            Self::Dbx => "dbx",
            Self::Dbt => "dbt",
            Self::Dbr => "dbr",
        }
    }

    /// UEFI variable name.
    pub fn variable_name(&self) -> &'static str {
        match self {
            Self::Pk => "PK",
            Self::Kek => "KEK",
            Self::Db => "db",
            Self::Dbx => "dbx",
            Self::Dbt => "dbt",
            Self::Dbr => "dbr",
        }
    }

    /// `true` for the deny list.
    pub fn is_forbidden_list(&self) -> bool {
        matches!(self, Self::Dbx)
    }

    pub fn install_path(&self, root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(self.dir_name())
    }
}

impl fmt::Display for SignatureDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variable_name())
    }
}

impl FromStr for SignatureDatabase {
    type Err = SigDbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|db| db.dir_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                SigDbError::InvalidArgument(format!("unknown signature database: {s}"))
            })
    }
}
