//! Disk image staging directory
//!
//! The directory lives in a `TempDir`, so it is removed when the
//! [`StagingDir`] is dropped, on success and on every error path.

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::fsutil;
use crate::process::{CommandRunner, CommandSpec};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Name of the shortcut users drag the app onto
pub const APPLICATIONS_LINK: &str = "Applications";

/// Name Finder looks for on a mounted volume
pub const VOLUME_ICON_NAME: &str = ".VolumeIcon.icns";

/// How the Applications shortcut was created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    FinderAlias,
    Symlink,
}

/// Uniquely named, self-removing staging directory
pub struct StagingDir {
    dir: TempDir,
}

impl StagingDir {
    pub fn create() -> ShipwrightResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("shipwright-dmg-")
            .tempdir()
            .map_err(|e| ShipwrightError::io("creating staging directory", e))?;
        debug!("Staging in {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy the bundle in, keeping its symlinks (frameworks rely on them)
    pub fn add_bundle(&self, bundle: &Path) -> ShipwrightResult<PathBuf> {
        let name = bundle
            .file_name()
            .ok_or_else(|| ShipwrightError::BundleNotFound(bundle.to_path_buf()))?;
        let dest = self.path().join(name);
        fsutil::copy_dir_recursive(bundle, &dest)?;
        Ok(dest)
    }

    /// Add the `Applications` shortcut: a Finder alias if `osascript` can
    /// make one, else a symlink to `/Applications`
    pub async fn add_applications_shortcut(&self, runner: &dyn CommandRunner) -> ShipwrightResult<ShortcutKind> {
        let link = self.path().join(APPLICATIONS_LINK);
        let script = format!(
            "tell application \"Finder\" to make alias file to POSIX file \"/Applications\" at POSIX file {}",
            applescript_string(&self.path().to_string_lossy())
        );
        let cmd = CommandSpec::new("osascript").arg("-e").arg(script);
        match runner.run(&cmd).await {
            Ok(output) if output.is_success() && link.symlink_metadata().is_ok() => {
                return Ok(ShortcutKind::FinderAlias);
            }
            Ok(output) => debug!("osascript alias failed: {}", output.tail()),
            Err(e) => debug!("osascript unavailable: {}", e),
        }
        symlink_applications(&link)?;
        Ok(ShortcutKind::Symlink)
    }

    /// Copy the volume icon in under the name Finder expects
    pub fn add_volume_icon(&self, icon: &Path) -> ShipwrightResult<Option<PathBuf>> {
        if !icon.is_file() {
            warn!("Volume icon {} not found, skipping", icon.display());
            return Ok(None);
        }
        let dest = self.path().join(VOLUME_ICON_NAME);
        fs::copy(icon, &dest)
            .map_err(|e| ShipwrightError::io(format!("copying {}", icon.display()), e))?;
        Ok(Some(dest))
    }
}

/// Quote `text` as an AppleScript string literal
fn applescript_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(unix)]
fn symlink_applications(link: &Path) -> ShipwrightResult<()> {
    fsutil::remove_path(link)?;
    std::os::unix::fs::symlink("/Applications", link)
        .map_err(|e| ShipwrightError::io(format!("linking {}", link.display()), e))
}

#[cfg(not(unix))]
fn symlink_applications(link: &Path) -> ShipwrightResult<()> {
    Err(ShipwrightError::Internal(format!(
        "cannot create {}: symlinks need a unix host",
        link.display()
    )))
}
