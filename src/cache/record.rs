//! Persisted cache record
//!
//! One JSON record sits next to every built artifact and describes the
//! inputs it was built from.

use crate::cache::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing a successful build, stored as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Hex fingerprint of the build inputs
    pub fingerprint: String,
    /// First successful build
    pub created_at: DateTime<Utc>,
    /// Most recent successful build
    pub updated_at: DateTime<Utc>,
    /// Target operating system (`macos`, `linux`, `windows`)
    pub platform: String,
    /// Target architecture (`x86_64`, `aarch64`)
    pub arch: String,
    /// Interpreter or tooling version the artifact was built with
    pub runtime_version: String,
    /// Strategy identifier (`venv`, `embeddable`, `vendored`, `pyinstaller`)
    pub strategy: String,
}

/// Build metadata supplied by the component that produced the artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMeta {
    pub platform: String,
    pub arch: String,
    pub runtime_version: String,
    pub strategy: String,
}

impl CacheRecord {
    /// Create a record for a build finishing now
    pub fn new(fingerprint: &Fingerprint, meta: BuildMeta) -> Self {
        let now = Utc::now();
        Self {
            fingerprint: fingerprint.to_hex(),
            created_at: now,
            updated_at: now,
            platform: meta.platform,
            arch: meta.arch,
            runtime_version: meta.runtime_version,
            strategy: meta.strategy,
        }
    }

    /// Successor record for a rebuild, keeping the original creation time
    pub fn rebuilt_from(previous: &CacheRecord, fingerprint: &Fingerprint, meta: BuildMeta) -> Self {
        Self {
            created_at: previous.created_at,
            ..Self::new(fingerprint, meta)
        }
    }

    /// Whether the stored fingerprint equals `fingerprint`
    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprint.eq_ignore_ascii_case(&fingerprint.to_hex())
    }
}
