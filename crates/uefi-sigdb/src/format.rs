//! Signature formats: the `EFI_CERT_*` signature types of a signature list.
//!
//! Each format maps to the UEFI signature-type GUID that heads an
//! `EFI_SIGNATURE_LIST`. The stable tag (e.g. `EFI_CERT_SHA256_GUID`) is what
//! gets persisted and what callers name on the command line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigDbError};
use crate::guid::Guid;

/// Classification of a signature entry's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureFormat {
    #[default]
    Unspecified,
    #[serde(rename = "EFI_CERT_SHA1_GUID")]
    Sha1,
    #[serde(rename = "EFI_CERT_SHA224_GUID")]
    Sha224,
    #[serde(rename = "EFI_CERT_SHA256_GUID")]
    Sha256,
    #[serde(rename = "EFI_CERT_SHA384_GUID")]
    Sha384,
    #[serde(rename = "EFI_CERT_SHA512_GUID")]
    Sha512,
    #[serde(rename = "EFI_CERT_RSA2048_GUID")]
    Rsa2048,
    #[serde(rename = "EFI_CERT_RSA2048_SHA1_GUID")]
    Rsa2048Sha1,
    #[serde(rename = "EFI_CERT_RSA2048_SHA256_GUID")]
    Rsa2048Sha256,
    #[serde(rename = "EFI_CERT_X509_GUID")]
    X509,
    #[serde(rename = "EFI_CERT_X509_SHA256_GUID")]
    X509Sha256,
    #[serde(rename = "EFI_CERT_X509_SHA384_GUID")]
    X509Sha384,
    #[serde(rename = "EFI_CERT_X509_SHA512_GUID")]
    X509Sha512,
    #[serde(rename = "EFI_CERT_TYPE_PKCS7_GUID")]
    Pkcs7,
}

impl SignatureFormat {
    /// Every format, `Unspecified` first.
    pub const ALL: [SignatureFormat; 14] = [
        Self::Unspecified,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Rsa2048,
        Self::Rsa2048Sha1,
        Self::Rsa2048Sha256,
        Self::X509,
        Self::X509Sha256,
        Self::X509Sha384,
        Self::X509Sha512,
        Self::Pkcs7,
    ];

    /// Return the stable string tag used on disk and on the command line.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::Sha1 => "EFI_CERT_SHA1_GUID",
            Self::Sha224 => "EFI_CERT_SHA224_GUID",
            Self::Sha256 => "EFI_CERT_SHA256_GUID",
            Self::Sha384 => "EFI_CERT_SHA384_GUID",
            Self::Sha512 => "EFI_CERT_SHA512_GUID",
            Self::Rsa2048 => "EFI_CERT_RSA2048_GUID",
            Self::Rsa2048Sha1 => "EFI_CERT_RSA2048_SHA1_GUID",
            Self::Rsa2048Sha256 => "EFI_CERT_RSA2048_SHA256_GUID",
            Self::X509 => "EFI_CERT_X509_GUID",
            Self::X509Sha256 => "EFI_CERT_X509_SHA256_GUID",
            Self::X509Sha384 => "EFI_CERT_X509_SHA384_GUID",
            Self::X509Sha512 => "EFI_CERT_X509_SHA512_GUID",
            Self::Pkcs7 => "EFI_CERT_TYPE_PKCS7_GUID",
        }
    }

    /// Short lowercase alias (`sha256`, `x509`, ...).
    fn alias(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Rsa2048 => "rsa2048",
            Self::Rsa2048Sha1 => "rsa2048-sha1",
            Self::Rsa2048Sha256 => "rsa2048-sha256",
            Self::X509 => "x509",
            Self::X509Sha256 => "x509-sha256",
            Self::X509Sha384 => "x509-sha384",
            Self::X509Sha512 => "x509-sha512",
            Self::Pkcs7 => "pkcs7",
        }
    }

    /// The signature-type GUID of an `EFI_SIGNATURE_LIST` holding this format.
    ///
    /// `None` for `Unspecified`.
    pub fn type_guid(&self) -> Option<Guid> {
        let guid = match self {
            Self::Unspecified => return None,
            Self::Sha1 => Guid::from_fields(
                0x826ca512,
                0xcf10,
                0x4ac9,
                [0xb1, 0x87, 0xbe, 0x01, 0x49, 0x66, 0x31, 0xbd],
            ),
            Self::Sha224 => Guid::from_fields(
                0x0b6e5233,
                0xa65c,
                0x44c9,
                [0x94, 0x07, 0xd9, 0xab, 0x83, 0xbf, 0xc8, 0xbd],
            ),
            Self::Sha256 => Guid::from_fields(
                0xc1c41626,
                0x504c,
                0x4092,
                [0xac, 0xa9, 0x41, 0xf9, 0x36, 0x93, 0x43, 0x28],
            ),
            Self::Sha384 => Guid::from_fields(
                0xff3e5307,
                0x9fd0,
                0x48c9,
                [0x85, 0xf1, 0x8a, 0xd5, 0x6c, 0x70, 0x1e, 0x01],
            ),
            Self::Sha512 => Guid::from_fields(
                0x093e0fae,
                0xa6c4,
                0x4f50,
                [0x9f, 0x1b, 0xd4, 0x1e, 0x2b, 0x89, 0xc1, 0x9a],
            ),
            Self::Rsa2048 => Guid::from_fields(
                0x3c5766e8,
                0x269c,
                0x4e34,
                [0xaa, 0x14, 0xed, 0x77, 0x6e, 0x85, 0xb3, 0xb6],
            ),
            Self::Rsa2048Sha1 => Guid::from_fields(
                0x67f8444f,
                0x8743,
                0x48f1,
                [0xa3, 0x28, 0x1e, 0xaa, 0xb8, 0x73, 0x60, 0x80],
            ),
            Self::Rsa2048Sha256 => Guid::from_fields(
                0xe2b36190,
                0x879b,
                0x4a3d,
                [0xad, 0x8d, 0xf2, 0xe7, 0xbb, 0xa3, 0x27, 0x84],
            ),
            Self::X509 => Guid::from_fields(
                0xa5c059a1,
                0x94e4,
                0x4aa7,
                [0x87, 0xb5, 0xab, 0x15, 0x5c, 0x2b, 0xf0, 0x72],
            ),
            Self::X509Sha256 => Guid::from_fields(
                0x3bd2a492,
                0x96c0,
                0x4079,
                [0xb4, 0x20, 0xfc, 0xf9, 0x8e, 0xf1, 0x03, 0xed],
            ),
            Self::X509Sha384 => Guid::from_fields(
                0x7076876e,
                0x80c2,
                0x4ee6,
                [0xaa, 0xd2, 0x28, 0xb3, 0x49, 0xa6, 0x86, 0x5b],
            ),
            Self::X509Sha512 => Guid::from_fields(
                0x446dbf63,
                0x2502,
                0x4cda,
                [0xbc, 0xfa, 0x24, 0x65, 0xd2, 0xb0, 0xfe, 0x9d],
            ),
            Self::Pkcs7 => Guid::from_fields(
                0x4aafd29d,
                0x68df,
                0x49ee,
                [0x8a, 0xa9, 0x34, 0x7d, 0x37, 0x56, 0x65, 0xa7],
            ),
        };
        Some(guid)
    }

    /// Digest length in bytes for plain hash formats; `None` for
    /// certificate, key, and unspecified formats.
    pub fn digest_len(&self) -> Option<usize> {
        match self {
            Self::Sha1 => Some(20),
            Self::Sha224 => Some(28),
            Self::Sha256 => Some(32),
            Self::Sha384 => Some(48),
            Self::Sha512 => Some(64),
            _ => None,
        }
    }

    /// Look up a format by its signature-type GUID.
    pub fn from_type_guid(guid: &Guid) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.type_guid().as_ref() == Some(guid))
    }
}

impl fmt::Display for SignatureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_tag())
    }
}

impl FromStr for SignatureFormat {
    type Err = SigDbError;

    /// Accepts the full tag or the short alias, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_tag().eq_ignore_ascii_case(s) || f.alias().eq_ignore_ascii_case(s))
            .ok_or_else(|| SigDbError::UnknownFormat(s.to_string()))
    }
}
