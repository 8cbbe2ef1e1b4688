//! Code signing with `codesign`

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::process::{CommandRunner, CommandSpec};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable consulted when no identity is configured
pub const IDENTITY_ENV: &str = "APPLE_SIGNING_IDENTITY";

/// Configured identity, else the environment's; blank values count as unset
pub fn resolve_identity(configured: Option<&str>, env: Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .or(env)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Signs an application bundle inside-out
pub struct Signer<'a> {
    runner: &'a dyn CommandRunner,
    identity: String,
    entitlements: Option<PathBuf>,
}

impl<'a> Signer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, identity: String, entitlements: Option<PathBuf>) -> Self {
        Self {
            runner,
            identity,
            entitlements,
        }
    }

    /// Sign every executable in `Contents/MacOS`, then the bundle itself
    pub async fn sign_bundle(&self, bundle: &Path) -> ShipwrightResult<usize> {
        let mut targets = nested_executables(bundle)?;
        targets.push(bundle.to_path_buf());
        for target in &targets {
            self.sign(target).await?;
        }
        info!("Signed {} ({} items)", bundle.display(), targets.len());
        Ok(targets.len())
    }

    async fn sign(&self, path: &Path) -> ShipwrightResult<()> {
        let mut cmd = CommandSpec::new("codesign")
            .args(["--force", "--options", "runtime", "--timestamp", "--sign"])
            .arg(&self.identity);
        if let Some(entitlements) = &self.entitlements {
            cmd = cmd.arg("--entitlements").arg(entitlements);
        }
        let cmd = cmd.arg(path);
        debug!("Signing {}", path.display());

        let output = self.runner.run(&cmd).await?;
        if output.is_success() {
            return Ok(());
        }
        Err(ShipwrightError::Signing {
            path: path.to_path_buf(),
            stderr: output.tail(),
        })
    }
}

/// Regular files directly under `Contents/MacOS`, sorted
fn nested_executables(bundle: &Path) -> ShipwrightResult<Vec<PathBuf>> {
    let dir = bundle.join("Contents").join("MacOS");
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| ShipwrightError::io(format!("reading {}", dir.display()), e))? {
        let entry = entry.map_err(|e| ShipwrightError::io(format!("reading {}", dir.display()), e))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
