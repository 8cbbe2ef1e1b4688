//! Content fingerprinting of build inputs
//!
//! Hashes the dependency manifest and helper script into a single SHA-256
//! digest. Same inputs = same fingerprint = reuse the built artifact.

use crate::error::{ShipwrightError, ShipwrightResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// SHA-256 digest identifying the combined contents of a set of input files
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex rendering (64 chars)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }

    /// Digest a sequence of byte blobs.
    ///
    /// Every blob is prefixed with its big-endian length so that shifting
    /// bytes from one input to its neighbour still changes the digest.
    pub fn of_parts<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

impl FromStr for Fingerprint {
    type Err = ShipwrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| ShipwrightError::User(format!("invalid fingerprint '{s}': {e}")))?;
        Ok(Self(bytes))
    }
}

/// Fingerprint the contents of `paths`, in order.
///
/// Fails with an IO error naming the first unreadable input.
pub fn fingerprint_files<P: AsRef<Path>>(paths: &[P]) -> ShipwrightResult<Fingerprint> {
    let mut contents = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            ShipwrightError::io(format!("reading fingerprint input {}", path.display()), e)
        })?;
        debug!("Fingerprint input: {} ({} bytes)", path.display(), bytes.len());
        contents.push(bytes);
    }

    let fingerprint = Fingerprint::of_parts(contents.iter().map(Vec::as_slice));
    debug!("Fingerprint: {}", fingerprint.short());
    Ok(fingerprint)
}
