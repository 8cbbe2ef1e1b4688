//! Cache gate for build targets
//!
//! Decides whether an artifact can be reused by comparing the fingerprint of
//! the current inputs with the record written after the last successful
//! build. Records are only ever written after success, and
//! [`CacheManager::prepare_rebuild`] removes the old record together with
//! the stale output, so a failed build leaves no record behind.

use crate::cache::fingerprint::Fingerprint;
use crate::cache::record::{BuildMeta, CacheRecord};
use crate::error::{ShipwrightError, ShipwrightResult};
use crate::fsutil;
use crate::version::VersionFamily;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File name of the record inside a runtime directory
pub const RUNTIME_RECORD_NAME: &str = ".shipwright-cache.json";

/// Suffix of sidecar records (`.<name>-<triple>.cache.json`)
pub const SIDECAR_RECORD_SUFFIX: &str = ".cache.json";

/// One cacheable build output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTarget {
    /// Human-readable key (`macos-aarch64`, `faculty-embed-x86_64-apple-darwin`)
    pub key: String,
    /// Where the record lives
    pub record_path: PathBuf,
    /// Path whose presence proves the artifact exists
    pub artifact: PathBuf,
    /// Directory owned exclusively by this target, removed before a rebuild
    pub owned_dir: Option<PathBuf>,
}

impl CacheTarget {
    /// A runtime directory target; `interpreter` is relative to `dir`
    pub fn runtime(dir: &Path, key: impl Into<String>, interpreter: &Path) -> Self {
        Self {
            key: key.into(),
            record_path: dir.join(RUNTIME_RECORD_NAME),
            artifact: dir.join(interpreter),
            owned_dir: Some(dir.to_path_buf()),
        }
    }

    /// A single-file target such as a frozen sidecar executable
    pub fn file(artifact: &Path) -> Self {
        let parent = artifact.parent().unwrap_or_else(|| Path::new("."));
        let name = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            record_path: parent.join(format!(".{name}{SIDECAR_RECORD_SUFFIX}")),
            artifact: artifact.to_path_buf(),
            owned_dir: None,
            key: name,
        }
    }
}

/// Why a rebuild is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    RecordMissing,
    RecordCorrupt,
    FingerprintMismatch,
    VersionMismatch,
    ArtifactMissing,
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RebuildReason::RecordMissing => "no cache record",
            RebuildReason::RecordCorrupt => "cache record unreadable",
            RebuildReason::FingerprintMismatch => "inputs changed",
            RebuildReason::VersionMismatch => "runtime version changed",
            RebuildReason::ArtifactMissing => "artifact missing",
        };
        f.write_str(text)
    }
}

/// Outcome of the cache gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    Reuse,
    Rebuild(RebuildReason),
}

impl CacheDecision {
    pub fn is_rebuild(&self) -> bool {
        matches!(self, CacheDecision::Rebuild(_))
    }
}

/// Reads, validates and writes cache records
#[derive(Debug, Clone)]
pub struct CacheManager {
    required: VersionFamily,
}

impl CacheManager {
    /// Create a manager that only reuses records built with `required`
    pub fn new(required: VersionFamily) -> Self {
        Self { required }
    }

    /// Decide between reuse and rebuild
    pub fn evaluate(&self, target: &CacheTarget, fingerprint: &Fingerprint) -> CacheDecision {
        let decision = self.decide(target, fingerprint);
        match decision {
            CacheDecision::Reuse => debug!("{}: cache hit ({})", target.key, fingerprint.short()),
            CacheDecision::Rebuild(reason) => info!("{}: rebuild needed, {}", target.key, reason),
        }
        decision
    }

    fn decide(&self, target: &CacheTarget, fingerprint: &Fingerprint) -> CacheDecision {
        let record = match read_record(&target.record_path) {
            Ok(Some(record)) => record,
            Ok(None) => return CacheDecision::Rebuild(RebuildReason::RecordMissing),
            Err(e) => {
                warn!("Ignoring cache record {}: {}", target.record_path.display(), e);
                return CacheDecision::Rebuild(RebuildReason::RecordCorrupt);
            }
        };

        if !record.matches(fingerprint) {
            return CacheDecision::Rebuild(RebuildReason::FingerprintMismatch);
        }
        if !self.required.matches(&record.runtime_version) {
            return CacheDecision::Rebuild(RebuildReason::VersionMismatch);
        }
        if !target.artifact.exists() {
            return CacheDecision::Rebuild(RebuildReason::ArtifactMissing);
        }
        CacheDecision::Reuse
    }

    /// `false` only when the fingerprint matches and the artifact exists
    pub fn should_rebuild(&self, target: &CacheTarget, fingerprint: &Fingerprint) -> bool {
        self.evaluate(target, fingerprint).is_rebuild()
    }

    /// Remove stale output and its record so a rebuild starts from a clean slate.
    ///
    /// Returns the previous record, if any, for [`CacheManager::commit`] to
    /// carry `createdAt` forward.
    pub fn prepare_rebuild(&self, target: &CacheTarget) -> ShipwrightResult<Option<CacheRecord>> {
        let previous = read_record(&target.record_path).ok().flatten();
        match &target.owned_dir {
            Some(dir) => {
                debug!("Removing stale output {}", dir.display());
                fsutil::remove_path(dir)?;
            }
            None => fsutil::remove_path(&target.artifact)?,
        }
        fsutil::remove_path(&target.record_path)?;
        Ok(previous)
    }

    /// Persist the record for a successful build
    pub fn commit(
        &self,
        target: &CacheTarget,
        previous: Option<&CacheRecord>,
        fingerprint: &Fingerprint,
        meta: BuildMeta,
    ) -> ShipwrightResult<CacheRecord> {
        let record = match previous {
            Some(previous) => CacheRecord::rebuilt_from(previous, fingerprint, meta),
            None => CacheRecord::new(fingerprint, meta),
        };
        write_record(&target.record_path, &record)?;
        info!("{}: cache record written ({})", target.key, fingerprint.short());
        Ok(record)
    }

    /// Read the record for status reporting
    pub fn load(&self, target: &CacheTarget) -> Option<CacheRecord> {
        read_record(&target.record_path).ok().flatten()
    }
}

/// A record found on disk
#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub path: PathBuf,
    pub record: CacheRecord,
}

/// Find cache records under `dir` (depth ≤ 2), skipping unreadable ones
pub fn list_records(dir: &Path) -> Vec<RecordEntry> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut entries: Vec<RecordEntry> = WalkDir::new(dir)
        .max_depth(2)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_record_name(&e.file_name().to_string_lossy()))
        .filter_map(|e| match read_record(e.path()) {
            Ok(Some(record)) => Some(RecordEntry {
                path: e.path().to_path_buf(),
                record,
            }),
            Ok(None) => None,
            Err(err) => {
                debug!("Skipping {}: {}", e.path().display(), err);
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn is_record_name(name: &str) -> bool {
    name == RUNTIME_RECORD_NAME || (name.starts_with('.') && name.ends_with(SIDECAR_RECORD_SUFFIX))
}

fn read_record(path: &Path) -> ShipwrightResult<Option<CacheRecord>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ShipwrightError::io(format!("reading {}", path.display()), e)),
    };
    Ok(Some(serde_json::from_str(&content)?))
}

fn write_record(path: &Path, record: &CacheRecord) -> ShipwrightResult<()> {
    let json = serde_json::to_vec_pretty(record)?;
    fsutil::atomic_write(path, &json)
}
