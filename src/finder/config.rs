//! Emulator settings, read once from the environment at startup

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

pub const ENV_LOG: &str = "SHIPWRIGHT_SETFILE_LOG";
pub const ENV_TRACE: &str = "SHIPWRIGHT_SETFILE_TRACE";
pub const ENV_MODE: &str = "SHIPWRIGHT_SETFILE_MODE";
pub const ENV_XATTR: &str = "SHIPWRIGHT_SETFILE_XATTR";

/// Whether attribute changes are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmulatorMode {
    /// Log what would change, write nothing
    Observe,
    #[default]
    Apply,
}

/// Configuration for one `SetFile` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Append log lines here instead of stderr
    pub log_file: Option<PathBuf>,
    /// Log at trace level
    pub trace: bool,
    pub mode: EmulatorMode,
    /// Program used for attribute access
    pub xattr_program: OsString,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            trace: false,
            mode: EmulatorMode::Apply,
            xattr_program: OsString::from("xattr"),
        }
    }
}

impl EmulatorConfig {
    /// Read the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let text = |key: &str| {
            non_empty(key)
                .map(|v| v.to_string_lossy().trim().to_ascii_lowercase())
                .unwrap_or_default()
        };

        let defaults = Self::default();
        Self {
            log_file: non_empty(ENV_LOG).map(PathBuf::from),
            trace: matches!(text(ENV_TRACE).as_str(), "1" | "true" | "yes"),
            mode: match text(ENV_MODE).as_str() {
                "observe" => EmulatorMode::Observe,
                _ => EmulatorMode::Apply,
            },
            xattr_program: non_empty(ENV_XATTR).unwrap_or(defaults.xattr_program),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode == EmulatorMode::Observe
    }

    pub fn xattr_program(&self) -> &OsStr {
        &self.xattr_program
    }
}
