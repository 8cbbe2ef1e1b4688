//! pip invocations

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::process::{CommandRunner, CommandSpec};
use std::path::{Path, PathBuf};
use tracing::info;

/// Wheel constraints for installing into a foreign interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossTarget {
    /// pip platform tag, e.g. `win_amd64`
    pub platform: String,
    /// `major.minor` of the target interpreter
    pub python_version: String,
}

/// One `python -m pip install` call
#[derive(Debug, Clone)]
pub struct PipInstall {
    python: CommandSpec,
    requirements: Vec<PathBuf>,
    packages: Vec<String>,
    target_dir: Option<PathBuf>,
    cross: Option<CrossTarget>,
}

impl PipInstall {
    /// Install with the given interpreter command
    pub fn new(python: CommandSpec) -> Self {
        Self {
            python,
            requirements: Vec::new(),
            packages: Vec::new(),
            target_dir: None,
            cross: None,
        }
    }

    /// Add `-r <manifest>`
    pub fn requirements(mut self, manifest: &Path) -> Self {
        self.requirements.push(manifest.to_path_buf());
        self
    }

    /// Add a requirement specifier such as `pyinstaller`
    pub fn package(mut self, spec: impl Into<String>) -> Self {
        self.packages.push(spec.into());
        self
    }

    /// Install into `dir` instead of the interpreter's site-packages
    pub fn target_dir(mut self, dir: &Path) -> Self {
        self.target_dir = Some(dir.to_path_buf());
        self
    }

    /// Restrict to binary wheels for another platform
    pub fn cross(mut self, cross: CrossTarget) -> Self {
        self.cross = Some(cross);
        self
    }

    /// The command this install runs
    pub fn to_command(&self) -> CommandSpec {
        let mut cmd = self.python.clone().args([
            "-m",
            "pip",
            "install",
            "--no-input",
            "--disable-pip-version-check",
        ]);
        if let Some(dir) = &self.target_dir {
            cmd = cmd.arg("--upgrade").arg("--target").arg(dir);
        }
        if let Some(cross) = &self.cross {
            cmd = cmd
                .arg("--platform")
                .arg(&cross.platform)
                .arg("--python-version")
                .arg(&cross.python_version)
                .arg("--only-binary=:all:");
        }
        for manifest in &self.requirements {
            cmd = cmd.arg("-r").arg(manifest);
        }
        cmd.args(&self.packages)
    }

    /// Run the install; a non-zero exit becomes `DependencyInstall`
    pub async fn run(&self, runner: &dyn CommandRunner) -> ShipwrightResult<()> {
        let cmd = self.to_command();
        info!("Installing dependencies: {}", cmd);
        let output = runner.run(&cmd).await?;
        if output.is_success() {
            return Ok(());
        }
        Err(ShipwrightError::DependencyInstall {
            command: cmd.to_string(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
