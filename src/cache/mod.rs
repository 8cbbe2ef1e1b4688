//! Persistent artifact cache keyed by content fingerprints
//!
//! Every built artifact carries a JSON record of the inputs it was built
//! from. A build is skipped only when the record's fingerprint matches the
//! current inputs and the artifact is still on disk.
//!
//! | Decision | Cause |
//! |----------|-------|
//! | Reuse | fingerprint + version match, artifact present |
//! | Rebuild | record missing/corrupt, inputs changed, version changed, artifact gone |

pub mod fingerprint;
pub mod manager;
pub mod record;

pub use fingerprint::{fingerprint_files, Fingerprint};
pub use manager::{
    list_records, CacheDecision, CacheManager, CacheTarget, RebuildReason, RecordEntry,
};
pub use record::{BuildMeta, CacheRecord};
