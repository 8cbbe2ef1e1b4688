//! Error types for Shipwright
//!
//! All modules use `ShipwrightResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Shipwright operations
pub type ShipwrightResult<T> = Result<T, ShipwrightError>;

/// All errors that can occur in Shipwright
#[derive(Error, Debug)]
pub enum ShipwrightError {
    // Runtime provisioning errors
    #[error("No Python {required} interpreter found. Tried:\n{}", format_attempts(.attempts))]
    InterpreterNotFound {
        required: String,
        attempts: Vec<String>,
    },

    #[error("Dependency installation failed: {command}\n{}", crate::process::tail_output(.stdout, .stderr))]
    DependencyInstall {
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("Pre-vendored runtime tree missing or incomplete: {path}")]
    MissingVendoredAssets { path: PathBuf },

    #[error("Failed to extract archive {archive}: {reason}")]
    ArchiveExtraction { archive: PathBuf, reason: String },

    #[error("Failed to download {url}: {reason}")]
    ArchiveDownload { url: String, reason: String },

    #[error("No SHA-256 checksum configured for {url}")]
    ChecksumMissing { url: String },

    #[error("Checksum mismatch for {path}\n  expected: {expected}\n  actual:   {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    // Sidecar errors
    #[error("Freeze step finished but no executable was produced at {0}")]
    SidecarOutputMissing(PathBuf),

    #[error("Could not determine host target triple: {0}")]
    TargetTripleUnavailable(String),

    // Finder metadata errors
    #[error("FinderInfo attribute unavailable for {path} (status {status})")]
    AttributeAccessSoftFailure { path: PathBuf, status: i32 },

    #[error("FinderInfo attribute access failed for {path}: {command}, exit code: {code}, stderr: {stderr}")]
    AttributeAccessHardFailure {
        path: PathBuf,
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Invalid four-character code '{0}': expected exactly 4 ASCII bytes")]
    InvalidFourCharCode(String),

    #[error("FinderInfo must be exactly 32 bytes, got {0}")]
    InvalidFinderInfoLength(usize),

    // Packaging errors
    #[error("Application bundle not found: {0}")]
    BundleNotFound(PathBuf),

    #[error("No signing identity configured; the bundle will not be signed")]
    SigningIdentityMissing,

    #[error("Code signing failed for {path}: {stderr}")]
    Signing { path: PathBuf, stderr: String },

    #[error("Disk image creation failed: {command}, exit code: {code}\n{output}")]
    DiskImageCreation {
        command: String,
        code: i32,
        output: String,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}\n{output}")]
    CommandExecution { command: String, output: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

fn format_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        return "  (no candidates configured)".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("  - {a}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ShipwrightError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Whether the error is a warning-level condition the pipeline continues past
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::AttributeAccessSoftFailure { .. }
                | Self::BundleNotFound(_)
                | Self::SigningIdentityMissing
        )
    }

    /// Process exit code to report for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DiskImageCreation { code, .. } => match u8::try_from(*code) {
                Ok(0) | Err(_) => 1,
                Ok(c) => c,
            },
            _ => 1,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InterpreterNotFound { .. } => {
                Some("Install the required Python version or set runtime.interpreter in shipwright.toml")
            }
            Self::MissingVendoredAssets { .. } => Some(
                "Build the runtime on the target platform and copy it under runtime.vendored_dir",
            ),
            Self::ChecksumMissing { .. } => Some(
                "Set runtime.embeddable.sha256, or runtime.embeddable.allow_unverified = true",
            ),
            Self::ChecksumMismatch { .. } => {
                Some("Delete the cached archive and check runtime.embeddable.url")
            }
            Self::TargetTripleUnavailable(_) => Some("Install a Rust toolchain (rustc) on PATH"),
            Self::SigningIdentityMissing => {
                Some("Set package.signing_identity or APPLE_SIGNING_IDENTITY")
            }
            Self::ConfigNotFound(_) => Some("Run: shipwright config init"),
            _ => None,
        }
    }
}
