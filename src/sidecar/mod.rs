//! Sidecar compilation
//!
//! Freezes the helper script and its pinned dependencies into one native
//! executable named `<name>-<host-triple>[.exe]`, the layout the desktop
//! bundler expects for external binaries.

pub mod triple;

use crate::cache::{
    fingerprint_files, BuildMeta, CacheDecision, CacheManager, CacheRecord, CacheTarget,
};
use crate::config::Config;
use crate::error::{ShipwrightError, ShipwrightResult};
use crate::fsutil;
use crate::platform::Target;
use crate::process::{CommandRunner, CommandSpec};
use crate::runtime::interpreter;
use crate::runtime::pip::PipInstall;
use crate::runtime::venv;
use crate::version::VersionFamily;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of a sidecar build
#[derive(Debug, Clone)]
pub struct SidecarOutcome {
    pub binary: PathBuf,
    pub triple: String,
    /// `None` on a cache hit
    pub rebuilt: Option<String>,
    pub record: Option<CacheRecord>,
}

impl SidecarOutcome {
    pub fn reused(&self) -> bool {
        self.rebuilt.is_none()
    }
}

/// Freezes the helper script with PyInstaller
pub struct SidecarCompiler<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    host: Target,
}

impl<'a> SidecarCompiler<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner, host: Target) -> Self {
        Self {
            config,
            runner,
            host,
        }
    }

    /// Final location of the executable for `triple`
    pub fn binary_path(&self, triple: &str) -> PathBuf {
        self.config.sidecar.binaries_dir.join(format!(
            "{}-{}{}",
            self.config.sidecar.name,
            triple,
            triple::exe_suffix(triple)
        ))
    }

    /// Build (or reuse) the sidecar for the host triple
    pub async fn compile(&self, force: bool) -> ShipwrightResult<SidecarOutcome> {
        let family: VersionFamily = self.config.runtime.python_version.parse()?;
        let script = self.config.sidecar_script().to_path_buf();
        let fingerprint = fingerprint_files(&[&self.config.runtime.requirements, &script])?;
        let triple = triple::host_triple(self.runner).await?;
        let binary = self.binary_path(&triple);
        let cache_target = CacheTarget::file(&binary);
        let manager = CacheManager::new(family.clone());

        let reason = if force {
            "forced".to_string()
        } else {
            match manager.evaluate(&cache_target, &fingerprint) {
                CacheDecision::Reuse => {
                    info!("Sidecar {} is up to date", binary.display());
                    return Ok(SidecarOutcome {
                        record: manager.load(&cache_target),
                        binary,
                        triple,
                        rebuilt: None,
                    });
                }
                CacheDecision::Rebuild(reason) => reason.to_string(),
            }
        };

        info!("Freezing sidecar for {} ({})", triple, reason);
        let previous = manager.prepare_rebuild(&cache_target)?;

        let candidates = interpreter::candidates(
            &family,
            self.config.runtime.interpreter.as_deref(),
            self.host.os,
        );
        let interp = interpreter::discover(self.runner, &family, &candidates).await?;

        let work = &self.config.sidecar.work_dir;
        let venv_dir = work.join("venv");
        fsutil::remove_path(&venv_dir)?;
        let python = venv::create(self.runner, &interp, &venv_dir, self.host.os).await?;
        PipInstall::new(CommandSpec::new(&python))
            .package(&self.config.sidecar.freezer)
            .requirements(&self.config.runtime.requirements)
            .run(self.runner)
            .await?;

        let produced = self.freeze(&python, &script, &triple).await?;
        fsutil::move_file(&produced, &binary)?;
        info!("Sidecar written to {}", binary.display());

        let record = manager.commit(
            &cache_target,
            previous.as_ref(),
            &fingerprint,
            BuildMeta {
                platform: self.host.os.as_str().to_string(),
                arch: self.host.arch.as_str().to_string(),
                runtime_version: interp.version.to_string(),
                strategy: "pyinstaller".to_string(),
            },
        )?;

        Ok(SidecarOutcome {
            binary,
            triple,
            rebuilt: Some(reason),
            record: Some(record),
        })
    }

    /// Run PyInstaller; returns the produced executable
    async fn freeze(&self, python: &Path, script: &Path, triple: &str) -> ShipwrightResult<PathBuf> {
        let work = &self.config.sidecar.work_dir;
        let name = &self.config.sidecar.name;
        let dist = work.join("dist");
        let cmd = CommandSpec::new(python)
            .args(["-m", "PyInstaller", "--onefile", "--noconfirm", "--clean"])
            .arg("--name")
            .arg(name)
            .arg("--distpath")
            .arg(&dist)
            .arg("--workpath")
            .arg(work.join("build"))
            .arg("--specpath")
            .arg(work)
            .arg(script);

        let output = self.runner.run(&cmd).await?;
        if !output.is_success() {
            return Err(ShipwrightError::command_exec(cmd.to_string(), output.tail()));
        }

        let produced = dist.join(format!("{}{}", name, triple::exe_suffix(triple)));
        if !produced.is_file() {
            return Err(ShipwrightError::SidecarOutputMissing(produced));
        }
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};
    use crate::process::fake::FakeRunner;
    use crate::process::CommandOutput;
    use std::fs;
    use tempfile::TempDir;

    const TRIPLE: &str = "x86_64-unknown-linux-gnu";

    fn project() -> (TempDir, Config) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("python")).unwrap();
        fs::write(root.join("python/requirements.txt"), "torch==2.3.1\n").unwrap();
        fs::write(root.join("python/embedding_helper.py"), "print('hi')\n").unwrap();
        let mut config = Config::default();
        config.resolve_paths(root);
        (temp, config)
    }

    fn host() -> Target {
        Target::new(Os::Linux, Arch::X86_64)
    }

    /// Scripted toolchain; `produce` controls whether PyInstaller writes output
    fn toolchain(produce: bool) -> FakeRunner {
        FakeRunner::new().on(move |spec| {
            if spec.program_name() == "rustc" {
                return Some(Ok(CommandOutput::success(format!("host: {TRIPLE}\n"))));
            }
            if spec.has_arg("-c") {
                return Some(Ok(CommandOutput::success("3.11.9\n/usr/bin/python3.11\n")));
            }
            if spec.has_arg("PyInstaller") && produce {
                let args = spec.args_lossy();
                let dist = args
                    .iter()
                    .position(|a| a == "--distpath")
                    .map(|i| PathBuf::from(&args[i + 1]))
                    .unwrap();
                fs::create_dir_all(&dist).unwrap();
                fs::write(dist.join("embedding-helper"), "ELF").unwrap();
            }
            None
        })
    }

    #[tokio::test]
    async fn freezes_and_names_by_triple() {
        let (_temp, config) = project();
        let runner = toolchain(true);
        let compiler = SidecarCompiler::new(&config, &runner, host());

        let outcome = compiler.compile(false).await.unwrap();

        assert_eq!(
            outcome.binary,
            config.sidecar.binaries_dir.join("embedding-helper-x86_64-unknown-linux-gnu")
        );
        assert!(outcome.binary.is_file());
        assert_eq!(outcome.record.unwrap().strategy, "pyinstaller");

        let freeze = runner
            .calls()
            .into_iter()
            .find(|c| c.has_arg("PyInstaller"))
            .unwrap();
        assert!(freeze.has_arg("--onefile"));
        assert!(freeze.has_arg("--noconfirm"));
        let pip = runner.calls().into_iter().find(|c| c.has_arg("pip")).unwrap();
        assert!(pip.has_arg("pyinstaller"));
    }

    #[tokio::test]
    async fn unchanged_inputs_skip_freeze() {
        let (_temp, config) = project();
        let runner = toolchain(true);
        let compiler = SidecarCompiler::new(&config, &runner, host());

        compiler.compile(false).await.unwrap();
        let second = compiler.compile(false).await.unwrap();

        assert!(second.reused());
        assert_eq!(runner.count(|c| c.has_arg("PyInstaller")), 1);
    }

    #[tokio::test]
    async fn missing_output_is_reported() {
        let (_temp, config) = project();
        let runner = toolchain(false);
        let compiler = SidecarCompiler::new(&config, &runner, host());

        let err = compiler.compile(false).await.unwrap_err();
        assert!(matches!(err, ShipwrightError::SidecarOutputMissing(_)));
        assert!(!CacheTarget::file(&compiler.binary_path(TRIPLE)).record_path.exists());
    }
}
