//! Owner GUIDs for signature entries.
//!
//! Every entry of a UEFI signature list carries a `SignatureOwner` GUID
//! identifying the agent that enrolled it. The textual form is the usual
//! `8-4-4-4-12` hex grouping; the nil GUID means "no owner recorded".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SigDbError};

/// Byte offsets of the dashes in the canonical text form.
const DASH_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// Length of the canonical text form.
const GUID_TEXT_LEN: usize = 36;

/// A 128-bit GUID stored in text order (the order its hex digits are printed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid([u8; 16]);

impl Guid {
    /// The all-zero GUID.
    pub const NIL: Guid = Guid([0; 16]);

    /// Build a GUID from its bytes in text order.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Build a GUID from the EFI `{data1, data2, data3, data4}` components.
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        let d1 = data1.to_be_bytes();
        let d2 = data2.to_be_bytes();
        let d3 = data3.to_be_bytes();
        Self([
            d1[0], d1[1], d1[2], d1[3], d2[0], d2[1], d3[0], d3[1], data4[0], data4[1], data4[2],
            data4[3], data4[4], data4[5], data4[6], data4[7],
        ])
    }

    /// Bytes in text order.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Bytes in the mixed-endian layout used inside `EFI_SIGNATURE_DATA`.
    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut out = self.0;
        out[0..4].reverse();
        out[4..6].reverse();
        out[6..8].reverse();
        out
    }

    /// Check if this is the nil GUID.
    pub fn is_nil(&self) -> bool {
        self.0 == [0; 16]
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = hex::encode(self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &h[0..8],
            &h[8..12],
            &h[12..16],
            &h[16..20],
            &h[20..32]
        )
    }
}

impl FromStr for Guid {
    type Err = SigDbError;

    /// Parse the canonical `8-4-4-4-12` form. Hex digits may be upper or
    /// lower case; surrounding braces are accepted.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s
            .trim()
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or_else(|| s.trim());

        if trimmed.len() != GUID_TEXT_LEN {
            return Err(SigDbError::InvalidGuid(format!(
                "expected {GUID_TEXT_LEN} characters, got {}: {s:?}",
                trimmed.len()
            )));
        }

        let mut digits = String::with_capacity(32);
        for (i, ch) in trimmed.char_indices() {
            if DASH_POSITIONS.contains(&i) {
                if ch != '-' {
                    return Err(SigDbError::InvalidGuid(format!(
                        "expected '-' at offset {i}: {s:?}"
                    )));
                }
            } else {
                digits.push(ch);
            }
        }

        let mut bytes = [0u8; 16];
        hex::decode_to_slice(&digits, &mut bytes)
            .map_err(|e| SigDbError::InvalidGuid(format!("{e}: {s:?}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
