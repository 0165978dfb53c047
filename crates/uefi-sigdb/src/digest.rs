//! Hash-signature helpers.
//!
//! Hash entries (`EFI_CERT_SHA*`) carry a raw digest; the store keeps it as
//! lowercase hex content.

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::{Result, SigDbError};
use crate::format::SignatureFormat;

/// Formats [`digest_content`] can compute.
pub const DIGEST_FORMATS: [SignatureFormat; 4] = [
    SignatureFormat::Sha224,
    SignatureFormat::Sha256,
    SignatureFormat::Sha384,
    SignatureFormat::Sha512,
];

/// Return `true` if [`digest_content`] can compute `format`.
pub fn can_digest(format: SignatureFormat) -> bool {
    DIGEST_FORMATS.contains(&format)
}

/// Hash `data` with the algorithm of `format` and return lowercase hex.
///
/// # Errors
///
/// `UnknownFormat` if `format` is not a SHA-2 hash format.
pub fn digest_content(format: SignatureFormat, data: &[u8]) -> Result<String> {
    let digest = match format {
        SignatureFormat::Sha224 => Sha224::digest(data).to_vec(),
        SignatureFormat::Sha256 => Sha256::digest(data).to_vec(),
        SignatureFormat::Sha384 => Sha384::digest(data).to_vec(),
        SignatureFormat::Sha512 => Sha512::digest(data).to_vec(),
        other => {
            return Err(SigDbError::UnknownFormat(format!(
                "cannot compute a digest for {other}"
            )))
        }
    };
    Ok(hex::encode(digest))
}

/// Check that hex content has the digest length `format` requires.
///
/// Formats without a fixed digest length accept any content.
pub fn validate_content(format: SignatureFormat, content: &str) -> Result<()> {
    let Some(len) = format.digest_len() else {
        return Ok(());
    };

    let bytes = hex::decode(content).map_err(|e| {
        SigDbError::InvalidArgument(format!("{format} content must be hex: {e}"))
    })?;
    if bytes.len() != len {
        return Err(SigDbError::InvalidArgument(format!(
            "{format} content must be {len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}
