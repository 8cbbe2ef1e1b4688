//! `hdiutil` disk image creation

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::fsutil;
use crate::process::{CommandRunner, CommandSpec};
use std::path::{Path, PathBuf};
use tracing::info;

/// `<dmg_dir>/<product>_<version>_<arch>.dmg`
pub fn image_path(dmg_dir: &Path, product: &str, version: &str, arch_label: &str) -> PathBuf {
    dmg_dir.join(format!("{product}_{version}_{arch_label}.dmg"))
}

/// Build a compressed image of `staging` at `output`, replacing any old one
pub async fn create_image(
    runner: &dyn CommandRunner,
    volume_name: &str,
    staging: &Path,
    output: &Path,
) -> ShipwrightResult<()> {
    fsutil::remove_path(output)?;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ShipwrightError::io(format!("creating {}", parent.display()), e))?;
    }

    let cmd = CommandSpec::new("hdiutil")
        .args(["create", "-volname", volume_name, "-srcfolder"])
        .arg(staging)
        .args(["-ov", "-format", "UDZO"])
        .arg(output);
    info!("Creating disk image {}", output.display());

    let result = runner.run(&cmd).await?;
    if result.is_success() {
        return Ok(());
    }
    Err(ShipwrightError::DiskImageCreation {
        command: cmd.to_string(),
        code: result.code_or_signal(),
        output: result.tail(),
    })
}
