//! Build target model
//!
//! A target is an `<os>-<arch>` pair. Its key doubles as the name of the
//! runtime directory the desktop app looks up at launch
//! (`<resources>/python/<os>-<arch>`), so the strings match
//! `std::env::consts::{OS, ARCH}`.

use crate::error::{ShipwrightError, ShipwrightResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system of a build target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// macOS - venv runtime, dmg packaging
    MacOS,
    /// Linux - venv runtime
    Linux,
    /// Windows - embeddable distribution
    Windows,
}

impl Os {
    /// Detect the host operating system
    pub fn detect() -> ShipwrightResult<Self> {
        std::env::consts::OS.parse()
    }

    /// Identifier as reported by `std::env::consts::OS`
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::MacOS => "macos",
            Os::Linux => "linux",
            Os::Windows => "windows",
        }
    }

    /// Get a human-readable platform name
    pub fn name(&self) -> &'static str {
        match self {
            Os::MacOS => "macOS",
            Os::Linux => "Linux",
            Os::Windows => "Windows",
        }
    }

    /// Executable file suffix on this OS
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            _ => "",
        }
    }

    /// Directory holding executables inside a virtual environment
    pub fn venv_bin_dir(&self) -> &'static str {
        match self {
            Os::Windows => "Scripts",
            _ => "bin",
        }
    }
}

impl FromStr for Os {
    type Err = ShipwrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "osx" => Ok(Os::MacOS),
            "linux" => Ok(Os::Linux),
            "windows" | "win" | "win32" => Ok(Os::Windows),
            other => Err(ShipwrightError::UnsupportedTarget(format!(
                "operating system '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture of a build target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    Aarch64,
}

impl Arch {
    /// Detect the host architecture
    pub fn detect() -> ShipwrightResult<Self> {
        std::env::consts::ARCH.parse()
    }

    /// Identifier as reported by `std::env::consts::ARCH`
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
        }
    }

    /// Label used in installer file names (`x64`, `aarch64`)
    pub fn installer_label(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x64",
            Arch::Aarch64 => "aarch64",
        }
    }

    /// pip `--platform` tag for a Windows wheel of this architecture
    pub fn windows_wheel_platform(&self) -> &'static str {
        match self {
            Arch::X86_64 => "win_amd64",
            Arch::Aarch64 => "win_arm64",
        }
    }

    /// Architecture suffix of the official embeddable archive name
    pub fn embeddable_label(&self) -> &'static str {
        match self {
            Arch::X86_64 => "amd64",
            Arch::Aarch64 => "arm64",
        }
    }
}

impl FromStr for Arch {
    type Err = ShipwrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86_64" | "x64" | "amd64" => Ok(Arch::X86_64),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            other => Err(ShipwrightError::UnsupportedTarget(format!(
                "architecture '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (platform, architecture) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub os: Os,
    pub arch: Arch,
}

impl Target {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The machine we are running on
    pub fn host() -> ShipwrightResult<Self> {
        Ok(Self {
            os: Os::detect()?,
            arch: Arch::detect()?,
        })
    }

    /// Cache key and runtime directory name, e.g. `macos-aarch64`
    pub fn key(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

impl FromStr for Target {
    type Err = ShipwrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s.split_once('-').ok_or_else(|| {
            ShipwrightError::UnsupportedTarget(format!("'{s}' (expected <os>-<arch>)"))
        })?;
        Ok(Self {
            os: os.parse()?,
            arch: arch.parse()?,
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
