//! The 32-byte `com.apple.FinderInfo` value
//!
//! Layout (big-endian):
//!
//! | Bytes | Field |
//! |-------|-------|
//! | 0-3 | file type code |
//! | 4-7 | creator code |
//! | 8-9 | Finder flags |
//! | 10-31 | location, reserved, extended info (preserved verbatim) |

use crate::error::{ShipwrightError, ShipwrightResult};
use std::fmt;

/// Exact size of the attribute
pub const FINDER_INFO_LEN: usize = 32;

/// A four-character code such as `icnC` or `APPL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCharCode([u8; 4]);

impl FourCharCode {
    /// Parse exactly four ASCII bytes
    pub fn parse(code: &str) -> ShipwrightResult<Self> {
        let bytes: [u8; 4] = code
            .as_bytes()
            .try_into()
            .map_err(|_| ShipwrightError::InvalidFourCharCode(code.to_string()))?;
        if !bytes.iter().all(u8::is_ascii) {
            return Err(ShipwrightError::InvalidFourCharCode(code.to_string()));
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for FourCharCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A FinderInfo value; always exactly 32 bytes
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct FinderInfo([u8; FINDER_INFO_LEN]);

impl FinderInfo {
    /// The all-zero value an absent attribute reads as
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Build from raw bytes, rejecting any other length
    pub fn from_slice(bytes: &[u8]) -> ShipwrightResult<Self> {
        let arr: [u8; FINDER_INFO_LEN] = bytes
            .try_into()
            .map_err(|_| ShipwrightError::InvalidFinderInfoLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Decode the hex dump printed by `xattr -px` (whitespace ignored)
    pub fn from_hex(text: &str) -> ShipwrightResult<Self> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = hex::decode(&compact).map_err(|e| {
            ShipwrightError::Internal(format!("malformed FinderInfo hex '{compact}': {e}"))
        })?;
        Self::from_slice(&bytes)
    }

    /// Uppercase hex, 64 characters, as accepted by `xattr -wx`
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; FINDER_INFO_LEN] {
        &self.0
    }

    pub fn type_code(&self) -> [u8; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }

    pub fn creator_code(&self) -> [u8; 4] {
        [self.0[4], self.0[5], self.0[6], self.0[7]]
    }

    pub fn flags(&self) -> u16 {
        u16::from_be_bytes([self.0[8], self.0[9]])
    }

    pub fn with_type_code(mut self, code: FourCharCode) -> Self {
        self.0[0..4].copy_from_slice(&code.bytes());
        self
    }

    pub fn with_creator_code(mut self, code: FourCharCode) -> Self {
        self.0[4..8].copy_from_slice(&code.bytes());
        self
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.0[8..10].copy_from_slice(&flags.to_be_bytes());
        self
    }
}

impl fmt::Debug for FinderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderInfo")
            .field("type", &String::from_utf8_lossy(&self.type_code()))
            .field("creator", &String::from_utf8_lossy(&self.creator_code()))
            .field("flags", &format_args!("{:#06x}", self.flags()))
            .finish()
    }
}
