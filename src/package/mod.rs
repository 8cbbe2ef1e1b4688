//! macOS disk image packaging
//!
//! Turns the bundler's `<product>.app` into a drag-to-install `.dmg`:
//! sign, stage (bundle + Applications shortcut + optional volume icon),
//! then `hdiutil create`. The staging directory never outlives a run.

pub mod dmg;
pub mod signing;
pub mod staging;

pub use staging::{ShortcutKind, StagingDir};

use crate::config::schema::PackageConfig;
use crate::error::{ShipwrightError, ShipwrightResult};
use crate::platform::Arch;
use crate::process::{CommandRunner, CommandSpec};
use signing::Signer;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a packaging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// No bundle to package; nothing was done
    Skipped { bundle: PathBuf },
    Created {
        dmg: PathBuf,
        signed: bool,
        shortcut: ShortcutKind,
        volume_icon: bool,
    },
}

/// Builds the disk image for one architecture
pub struct PackageAssembler<'a> {
    config: &'a PackageConfig,
    runner: &'a dyn CommandRunner,
    arch: Arch,
    identity: Option<String>,
    setfile_dir: Option<PathBuf>,
    path_var: OsString,
}

impl<'a> PackageAssembler<'a> {
    /// Identity comes from config or `APPLE_SIGNING_IDENTITY`; the `SetFile`
    /// emulator is looked up next to the running executable unless configured
    pub fn new(config: &'a PackageConfig, runner: &'a dyn CommandRunner, arch: Arch) -> Self {
        let identity = signing::resolve_identity(
            config.signing_identity.as_deref(),
            std::env::var(signing::IDENTITY_ENV).ok(),
        );
        let setfile_dir = config.setfile_dir.clone().or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
        });
        Self {
            config,
            runner,
            arch,
            identity,
            setfile_dir,
            path_var: std::env::var_os("PATH").unwrap_or_default(),
        }
    }

    /// Override the signing identity (`None` disables signing)
    pub fn with_identity(mut self, identity: Option<String>) -> Self {
        self.identity = identity;
        self
    }

    /// Override the search path used to find a native `SetFile`
    pub fn with_path_var(mut self, path_var: impl Into<OsString>) -> Self {
        self.path_var = path_var.into();
        self
    }

    /// `<bundle_dir>/macos/<product>.app`
    pub fn bundle_path(&self) -> PathBuf {
        self.config
            .bundle_dir
            .join("macos")
            .join(format!("{}.app", self.config.product_name))
    }

    /// Output image path for this architecture
    pub fn image_path(&self) -> PathBuf {
        dmg::image_path(
            &self.config.dmg_dir,
            &self.config.product_name,
            &self.config.version,
            self.arch.installer_label(),
        )
    }

    /// Run the whole packaging sequence
    pub async fn assemble(&self) -> ShipwrightResult<PackageOutcome> {
        let bundle = self.bundle_path();
        if !bundle.is_dir() {
            warn!("{}", ShipwrightError::BundleNotFound(bundle.clone()));
            return Ok(PackageOutcome::Skipped { bundle });
        }

        let signed = match &self.identity {
            Some(identity) => {
                Signer::new(self.runner, identity.clone(), self.config.entitlements.clone())
                    .sign_bundle(&bundle)
                    .await?;
                true
            }
            None => {
                warn!("{}", ShipwrightError::SigningIdentityMissing);
                false
            }
        };

        let staging = StagingDir::create()?;
        staging.add_bundle(&bundle)?;
        let shortcut = staging.add_applications_shortcut(self.runner).await?;
        let volume_icon = match &self.config.volume_icon {
            Some(icon) => self.stage_volume_icon(&staging, icon).await,
            None => false,
        };

        let volume_name = self
            .config
            .volume_name
            .as_deref()
            .unwrap_or(&self.config.product_name);
        let dmg = self.image_path();
        dmg::create_image(self.runner, volume_name, staging.path(), &dmg).await?;
        info!("Disk image ready: {}", dmg.display());

        Ok(PackageOutcome::Created {
            dmg,
            signed,
            shortcut,
            volume_icon,
        })
    }

    /// Copy the icon in and flag it with `SetFile`; failures only warn
    async fn stage_volume_icon(&self, staging: &StagingDir, icon: &Path) -> bool {
        let placed = match staging.add_volume_icon(icon) {
            Ok(Some(placed)) => placed,
            Ok(None) => return false,
            Err(e) => {
                warn!("Volume icon skipped: {}", e);
                return false;
            }
        };

        let steps = [
            self.setfile().args(["-c", "icnC"]).arg(&placed),
            self.setfile().args(["-a", "C"]).arg(staging.path()),
        ];
        for cmd in &steps {
            match self.runner.run(cmd).await {
                Ok(output) if output.is_success() => {}
                Ok(output) => {
                    warn!("{} failed (exit {}): {}", cmd, output.code_or_signal(), output.tail());
                    return false;
                }
                Err(e) => {
                    warn!("{}", e);
                    return false;
                }
            }
        }
        true
    }

    /// `SetFile`, with the emulator's directory first on `PATH` when the
    /// native tool is not installed
    fn setfile(&self) -> CommandSpec {
        let cmd = CommandSpec::new("SetFile");
        if find_on_path("SetFile", &self.path_var).is_some() {
            return cmd;
        }
        let Some(dir) = &self.setfile_dir else {
            return cmd;
        };
        let paths = std::iter::once(dir.clone()).chain(std::env::split_paths(&self.path_var));
        match std::env::join_paths(paths) {
            Ok(joined) => cmd.env("PATH", joined),
            Err(e) => {
                warn!("Cannot prepend {} to PATH: {}", dir.display(), e);
                cmd
            }
        }
    }
}

/// First `PATH` entry containing a file called `name`
pub fn find_on_path(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;
    use crate::process::CommandOutput;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        config: PackageConfig,
    }

    fn fixture(with_bundle: bool) -> Fixture {
        let temp = TempDir::new().unwrap();
        let config = PackageConfig {
            product_name: "Faculty Match".to_string(),
            version: "0.4.1".to_string(),
            bundle_dir: temp.path().join("bundle"),
            dmg_dir: temp.path().join("bundle/dmg"),
            setfile_dir: Some(temp.path().join("shim")),
            ..PackageConfig::default()
        };
        if with_bundle {
            let app = config.bundle_dir.join("macos/Faculty Match.app/Contents/MacOS");
            fs::create_dir_all(&app).unwrap();
            fs::write(app.join("faculty-match"), "bin").unwrap();
        }
        Fixture { temp, config }
    }

    fn srcfolder(runner: &FakeRunner) -> PathBuf {
        let call = runner
            .calls()
            .into_iter()
            .find(|c| c.program_name() == "hdiutil")
            .unwrap();
        let args = call.args_lossy();
        let i = args.iter().position(|a| a == "-srcfolder").unwrap();
        PathBuf::from(&args[i + 1])
    }

    #[tokio::test]
    async fn missing_bundle_is_skipped_without_hdiutil() {
        let fx = fixture(false);
        let runner = FakeRunner::new();
        let outcome = PackageAssembler::new(&fx.config, &runner, Arch::Aarch64)
            .with_identity(Some("Dev".into()))
            .assemble()
            .await
            .unwrap();

        assert!(matches!(outcome, PackageOutcome::Skipped { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn unsigned_build_still_creates_image() {
        let fx = fixture(true);
        let runner = FakeRunner::new();
        let assembler = PackageAssembler::new(&fx.config, &runner, Arch::Aarch64).with_identity(None);

        let outcome = assembler.assemble().await.unwrap();

        match outcome {
            PackageOutcome::Created { dmg, signed, .. } => {
                assert!(!signed);
                assert_eq!(dmg, fx.config.dmg_dir.join("Faculty Match_0.4.1_aarch64.dmg"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(runner.count(|c| c.program_name() == "codesign"), 0);
        assert_eq!(runner.count(|c| c.program_name() == "hdiutil"), 1);
        assert!(!srcfolder(&runner).exists(), "staging directory must be removed");
    }

    #[tokio::test]
    async fn signed_build_signs_before_imaging() {
        let fx = fixture(true);
        let runner = FakeRunner::new();
        let assembler = PackageAssembler::new(&fx.config, &runner, Arch::X86_64)
            .with_identity(Some("Developer ID Application: Lab (TEAM)".into()));

        let outcome = assembler.assemble().await.unwrap();

        assert!(matches!(outcome, PackageOutcome::Created { signed: true, .. }));
        let order: Vec<String> = runner.calls().iter().map(|c| c.program_name()).collect();
        assert_eq!(order.first().map(String::as_str), Some("codesign"));
        assert_eq!(order.last().map(String::as_str), Some("hdiutil"));
        assert_eq!(runner.count(|c| c.program_name() == "codesign"), 2);
    }

    #[tokio::test]
    async fn hdiutil_failure_propagates_and_cleans_up() {
        let fx = fixture(true);
        let runner = FakeRunner::new().on(|c| {
            (c.program_name() == "hdiutil").then(|| Ok(CommandOutput::failure(1, "hdiutil: create failed")))
        });
        let assembler = PackageAssembler::new(&fx.config, &runner, Arch::Aarch64).with_identity(None);

        let err = assembler.assemble().await.unwrap_err();

        assert!(matches!(err, ShipwrightError::DiskImageCreation { code: 1, .. }));
        assert!(!srcfolder(&runner).exists());
    }

    #[tokio::test]
    async fn volume_icon_uses_setfile_shim() {
        let mut fx = fixture(true);
        let icon = fx.temp.path().join("volume.icns");
        fs::write(&icon, "icns").unwrap();
        fx.config.volume_icon = Some(icon);
        let runner = FakeRunner::new();
        let assembler = PackageAssembler::new(&fx.config, &runner, Arch::Aarch64)
            .with_identity(None)
            .with_path_var(fx.temp.path().join("empty-bin").into_os_string());

        let outcome = assembler.assemble().await.unwrap();

        assert!(matches!(outcome, PackageOutcome::Created { volume_icon: true, .. }));
        let setfile: Vec<_> = runner
            .calls()
            .into_iter()
            .filter(|c| c.program_name() == "SetFile")
            .collect();
        assert_eq!(setfile.len(), 2);
        assert!(setfile[0].has_arg("icnC"));
        assert!(setfile[1].has_arg("C"));
        let (key, value) = &setfile[0].env[0];
        assert_eq!(key, "PATH");
        assert_eq!(
            std::env::split_paths(value).next(),
            Some(fx.temp.path().join("shim"))
        );
    }

    #[tokio::test]
    async fn volume_icon_failure_is_only_a_warning() {
        let mut fx = fixture(true);
        let icon = fx.temp.path().join("volume.icns");
        fs::write(&icon, "icns").unwrap();
        fx.config.volume_icon = Some(icon);
        let runner = FakeRunner::new().on(|c| {
            (c.program_name() == "SetFile").then(|| Ok(CommandOutput::failure(2, "boom")))
        });
        let assembler = PackageAssembler::new(&fx.config, &runner, Arch::Aarch64).with_identity(None);

        let outcome = assembler.assemble().await.unwrap();
        assert!(matches!(outcome, PackageOutcome::Created { volume_icon: false, .. }));
    }

    #[test]
    fn find_on_path_checks_each_entry() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("SetFile"), "").unwrap();
        let path_var = std::env::join_paths([temp.path().join("nope"), bin.clone()]).unwrap();

        assert_eq!(find_on_path("SetFile", &path_var), Some(bin.join("SetFile")));
        assert_eq!(find_on_path("hdiutil", &path_var), None);
    }
}
