//! Configuration schema for Shipwright
//!
//! Configuration is stored in `shipwright.toml` at the project root.
//! Every field has a default, so an empty file is a valid configuration.

use crate::runtime::Strategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Python runtime provisioning
    pub runtime: RuntimeConfig,

    /// Frozen sidecar executable
    pub sidecar: SidecarConfig,

    /// macOS disk image packaging
    pub package: PackageConfig,
}

/// What the desktop app ships alongside its bundle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// A relocatable interpreter directory per target
    #[default]
    Runtime,
    /// A single frozen executable per target triple
    Sidecar,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Artifact kind produced by `shipwright build`
    pub mode: BuildMode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            mode: BuildMode::Runtime,
        }
    }
}

/// Runtime provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Required interpreter family (`major.minor`)
    pub python_version: String,

    /// Pinned dependency manifest
    pub requirements: PathBuf,

    /// Helper script shipped with the runtime
    pub helper_script: PathBuf,

    /// Parent of the per-target runtime directories
    pub output_dir: PathBuf,

    /// Force a strategy instead of selecting one per target
    pub strategy: Option<Strategy>,

    /// Interpreter to try before the built-in candidates
    pub interpreter: Option<String>,

    /// Root of pre-vendored runtime trees (`<os>-<arch>/` below it)
    pub vendored_dir: PathBuf,

    /// Extra package names to strip dev assets from
    pub prune_extra: Vec<String>,

    /// Windows embeddable distribution
    pub embeddable: EmbeddableConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            python_version: "3.11".to_string(),
            requirements: PathBuf::from("python/requirements.txt"),
            helper_script: PathBuf::from("python/embedding_helper.py"),
            output_dir: PathBuf::from("src-tauri/resources/python"),
            strategy: None,
            interpreter: None,
            vendored_dir: PathBuf::from("vendor/python"),
            prune_extra: vec![],
            embeddable: EmbeddableConfig::default(),
        }
    }
}

/// Embeddable distribution download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddableConfig {
    /// Full interpreter release, e.g. `3.11.9`
    pub release: String,

    /// Archive URL; derived from `release` and the target arch when unset
    pub url: Option<String>,

    /// Expected SHA-256 of the archive (hex)
    pub sha256: Option<String>,

    /// Where downloaded archives are kept
    pub cache_dir: PathBuf,

    /// Accept an archive without a configured checksum
    pub allow_unverified: bool,
}

impl Default for EmbeddableConfig {
    fn default() -> Self {
        Self {
            release: "3.11.9".to_string(),
            url: None,
            sha256: None,
            cache_dir: PathBuf::from(".shipwright/downloads"),
            allow_unverified: false,
        }
    }
}

impl EmbeddableConfig {
    /// Download URL for the given architecture label (`amd64`, `arm64`)
    pub fn url_for(&self, arch_label: &str) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "https://www.python.org/ftp/python/{0}/python-{0}-embed-{1}.zip",
                self.release, arch_label
            ),
        }
    }
}

/// Sidecar freezing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Entry script; defaults to `runtime.helper_script`
    pub script: Option<PathBuf>,

    /// Executable base name
    pub name: String,

    /// Where `<name>-<triple>` binaries are placed
    pub binaries_dir: PathBuf,

    /// Scratch directory for the freeze venv and build output
    pub work_dir: PathBuf,

    /// pip requirement for the freezer
    pub freezer: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            script: None,
            name: "embedding-helper".to_string(),
            binaries_dir: PathBuf::from("src-tauri/binaries"),
            work_dir: PathBuf::from(".shipwright/sidecar"),
            freezer: "pyinstaller".to_string(),
        }
    }
}

/// Disk image packaging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Application name (`<product>.app`)
    pub product_name: String,

    /// Version embedded in the image file name
    pub version: String,

    /// Bundler output root (contains `macos/<product>.app`)
    pub bundle_dir: PathBuf,

    /// Where the `.dmg` is written
    pub dmg_dir: PathBuf,

    /// codesign identity; falls back to `APPLE_SIGNING_IDENTITY`
    pub signing_identity: Option<String>,

    /// Entitlements plist passed to codesign
    pub entitlements: Option<PathBuf>,

    /// Mounted volume name; defaults to `product_name`
    pub volume_name: Option<String>,

    /// `.icns` file used as the volume icon
    pub volume_icon: Option<PathBuf>,

    /// Directory containing the `SetFile` emulator
    pub setfile_dir: Option<PathBuf>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            product_name: "Faculty Match".to_string(),
            version: "0.1.0".to_string(),
            bundle_dir: PathBuf::from("src-tauri/target/release/bundle"),
            dmg_dir: PathBuf::from("src-tauri/target/release/bundle/dmg"),
            signing_identity: None,
            entitlements: None,
            volume_name: None,
            volume_icon: None,
            setfile_dir: None,
        }
    }
}

impl Config {
    /// Make every relative path absolute against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        join(&mut self.runtime.requirements);
        join(&mut self.runtime.helper_script);
        join(&mut self.runtime.output_dir);
        join(&mut self.runtime.vendored_dir);
        join(&mut self.runtime.embeddable.cache_dir);
        if let Some(p) = self.sidecar.script.as_mut() {
            join(p);
        }
        join(&mut self.sidecar.binaries_dir);
        join(&mut self.sidecar.work_dir);
        join(&mut self.package.bundle_dir);
        join(&mut self.package.dmg_dir);
        for p in [
            self.package.entitlements.as_mut(),
            self.package.volume_icon.as_mut(),
            self.package.setfile_dir.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            join(p);
        }
    }

    /// Files whose contents decide whether a cached artifact is stale
    pub fn fingerprint_inputs(&self) -> Vec<PathBuf> {
        vec![
            self.runtime.requirements.clone(),
            self.runtime.helper_script.clone(),
        ]
    }

    /// Entry script for the sidecar
    pub fn sidecar_script(&self) -> &Path {
        self.sidecar
            .script
            .as_deref()
            .unwrap_or(&self.runtime.helper_script)
    }
}
