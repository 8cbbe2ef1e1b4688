//! Fingerprint command - print the digest of the current build inputs

use crate::cache::fingerprint_files;
use crate::config::{BuildMode, Config};
use crate::error::ShipwrightResult;
use std::path::PathBuf;
use tracing::info;

/// Execute the fingerprint command
pub async fn execute(config: &Config) -> ShipwrightResult<()> {
    let inputs = inputs(config);
    for input in &inputs {
        info!("Input: {}", input.display());
    }
    let fingerprint = fingerprint_files(&inputs)?;
    println!("{}", fingerprint);
    Ok(())
}

/// Inputs gating the artifact of the configured build mode
fn inputs(config: &Config) -> Vec<PathBuf> {
    match config.general.mode {
        BuildMode::Runtime => config.fingerprint_inputs(),
        BuildMode::Sidecar => vec![
            config.runtime.requirements.clone(),
            config.sidecar_script().to_path_buf(),
        ],
    }
}
