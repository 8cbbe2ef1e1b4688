//! Finder metadata emulation
//!
//! A drop-in for the `SetFile` utility that disk-image tooling shells out
//! to. Instead of the Carbon File Manager it edits the fixed-layout
//! `com.apple.FinderInfo` extended attribute directly.

pub mod config;
pub mod flags;
pub mod info;
pub mod setfile;
pub mod xattr;

pub use config::{EmulatorConfig, EmulatorMode};
pub use flags::FlagChange;
pub use info::{FinderInfo, FourCharCode};
pub use xattr::{classify_status, CommandXattr, XattrBackend};

use crate::error::{ShipwrightError, ShipwrightResult};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// FinderInfo read-modify-write operations over an attribute backend
#[derive(Clone)]
pub struct FinderAttributes {
    backend: Arc<dyn XattrBackend>,
}

impl FinderAttributes {
    pub fn new(backend: Arc<dyn XattrBackend>) -> Self {
        Self { backend }
    }

    /// Current value; an absent attribute (soft failure) reads as all-zero
    pub async fn read_finder_info(&self, path: &Path) -> ShipwrightResult<FinderInfo> {
        match self.backend.read(path).await {
            Ok(bytes) => FinderInfo::from_slice(&bytes),
            Err(e) if e.is_soft() => {
                debug!("No FinderInfo on {}, starting from zero", path.display());
                Ok(FinderInfo::zeroed())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the attribute with exactly 32 bytes
    pub async fn write_finder_info(&self, path: &Path, info: &FinderInfo) -> ShipwrightResult<()> {
        debug!("Writing FinderInfo {:?} to {}", info, path.display());
        self.backend.write(path, info.as_bytes()).await
    }

    /// Splice a creator code into the current value
    pub async fn set_creator_code(&self, path: &Path, code: &str) -> ShipwrightResult<()> {
        let code = FourCharCode::parse(code)?;
        let info = self.read_finder_info(path).await?.with_creator_code(code);
        self.write_finder_info(path, &info).await
    }

    /// Splice a type code into the current value
    pub async fn set_type_code(&self, path: &Path, code: &str) -> ShipwrightResult<()> {
        let code = FourCharCode::parse(code)?;
        let info = self.read_finder_info(path).await?.with_type_code(code);
        self.write_finder_info(path, &info).await
    }

    /// Apply `(current | set) & !clear`; returns the new flags
    pub async fn apply_attribute_flags(&self, path: &Path, change: FlagChange) -> ShipwrightResult<u16> {
        let current = self.read_finder_info(path).await?;
        let flags = change.apply(current.flags());
        if flags == current.flags() {
            debug!("Flags on {} already {:#06x}", path.display(), flags);
            return Ok(flags);
        }
        self.write_finder_info(path, &current.with_flags(flags)).await?;
        Ok(flags)
    }
}

/// Downgrade a soft failure to a warning
pub(crate) fn soften(result: ShipwrightResult<()>, what: &str, path: &Path) -> ShipwrightResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e @ ShipwrightError::AttributeAccessSoftFailure { .. }) => {
            warn!("{} skipped for {}: {}", what, path.display(), e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
