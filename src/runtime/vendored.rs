//! Pre-vendored runtime trees
//!
//! Targets that cannot be built on this host are copied from a tree that was
//! produced on the target platform.

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::fsutil;
use crate::platform::Target;
use std::path::{Path, PathBuf};
use tracing::info;

/// Source directory for `target` under `vendored_root`
pub fn source_dir(vendored_root: &Path, target: Target) -> PathBuf {
    vendored_root.join(target.key())
}

/// Copy the vendored tree for `target` into `dir`.
///
/// `interpreter` is the path, relative to the tree, that must exist for the
/// tree to count as complete.
pub fn provision(
    vendored_root: &Path,
    target: Target,
    interpreter: &Path,
    dir: &Path,
) -> ShipwrightResult<()> {
    let source = source_dir(vendored_root, target);
    if !source.is_dir() || !source.join(interpreter).is_file() {
        return Err(ShipwrightError::MissingVendoredAssets { path: source });
    }
    info!("Copying vendored runtime {} -> {}", source.display(), dir.display());
    fsutil::copy_dir_recursive(&source, dir)
}
