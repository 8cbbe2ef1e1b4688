//! Runtime provisioning
//!
//! Produces one self-contained, relocatable interpreter directory per target
//! (`<output_dir>/<os>-<arch>/`), gated by the artifact cache.
//!
//! | Strategy | When | Source |
//! |----------|------|--------|
//! | `venv` | native macOS/Linux | host interpreter, `venv --copies` |
//! | `embeddable` | native Windows | python.org embeddable zip |
//! | `vendored` | foreign OS | tree built on the target platform |

pub mod embeddable;
pub mod interpreter;
pub mod pip;
pub mod prune;
pub mod strategy;
pub mod vendored;
pub mod venv;

pub use prune::PruneReport;
pub use strategy::Strategy;

use crate::cache::{
    fingerprint_files, BuildMeta, CacheDecision, CacheManager, CacheRecord, CacheTarget,
    Fingerprint,
};
use crate::config::Config;
use crate::error::{ShipwrightError, ShipwrightResult};
use crate::platform::Target;
use crate::process::CommandRunner;
use crate::version::{parse_loose, VersionFamily};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of provisioning one target
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub target: Target,
    pub strategy: Strategy,
    /// The runtime directory
    pub dir: PathBuf,
    pub fingerprint: Fingerprint,
    /// Why the directory was (re)built, `None` on a cache hit
    pub rebuilt: Option<String>,
    /// Present only when a build ran
    pub prune: Option<PruneReport>,
    pub record: Option<CacheRecord>,
}

impl ProvisionOutcome {
    pub fn reused(&self) -> bool {
        self.rebuilt.is_none()
    }
}

/// Builds runtime directories for build targets
pub struct RuntimeProvisioner<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    host: Target,
}

impl<'a> RuntimeProvisioner<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner, host: Target) -> Self {
        Self {
            config,
            runner,
            host,
        }
    }

    /// Runtime directory for `target`
    pub fn runtime_dir(&self, target: Target) -> PathBuf {
        self.config.runtime.output_dir.join(target.key())
    }

    /// Strategy that will be used for `target`
    pub fn strategy_for(&self, target: Target) -> Strategy {
        Strategy::select(target, self.host, self.config.runtime.strategy)
    }

    /// Cache gate target for `target`'s runtime directory
    pub fn cache_target(&self, target: Target) -> CacheTarget {
        let strategy = self.strategy_for(target);
        CacheTarget::runtime(
            &self.runtime_dir(target),
            target.key(),
            &strategy.interpreter_path(target.os),
        )
    }

    /// Provision `target`, reusing the cached directory when inputs are unchanged.
    ///
    /// On failure the partially built directory is left behind without a
    /// fresh record, so the next run rebuilds it.
    pub async fn provision(&self, target: Target, force: bool) -> ShipwrightResult<ProvisionOutcome> {
        let family: VersionFamily = self.config.runtime.python_version.parse()?;
        let strategy = self.strategy_for(target);
        let dir = self.runtime_dir(target);
        let cache_target = self.cache_target(target);
        let manager = CacheManager::new(family.clone());
        let fingerprint = fingerprint_files(&self.config.fingerprint_inputs())?;

        let reason = if force {
            "forced".to_string()
        } else {
            match manager.evaluate(&cache_target, &fingerprint) {
                CacheDecision::Reuse => {
                    info!("{}: up to date ({})", target, fingerprint.short());
                    return Ok(ProvisionOutcome {
                        target,
                        strategy,
                        dir,
                        fingerprint,
                        rebuilt: None,
                        prune: None,
                        record: manager.load(&cache_target),
                    });
                }
                CacheDecision::Rebuild(reason) => reason.to_string(),
            }
        };

        info!("{}: provisioning with {} strategy ({})", target, strategy, reason);
        let previous = manager.prepare_rebuild(&cache_target)?;

        let runtime_version = self.build(target, strategy, &family, &dir).await?;
        self.install_helper(&dir)?;
        let report = prune::prune(&dir, target.os, &self.config.runtime.prune_extra)?;

        let record = manager.commit(
            &cache_target,
            previous.as_ref(),
            &fingerprint,
            BuildMeta {
                platform: target.os.as_str().to_string(),
                arch: target.arch.as_str().to_string(),
                runtime_version,
                strategy: strategy.as_str().to_string(),
            },
        )?;

        Ok(ProvisionOutcome {
            target,
            strategy,
            dir,
            fingerprint,
            rebuilt: Some(reason),
            prune: Some(report),
            record: Some(record),
        })
    }

    /// Run the strategy; returns the interpreter version placed in `dir`
    async fn build(
        &self,
        target: Target,
        strategy: Strategy,
        family: &VersionFamily,
        dir: &Path,
    ) -> ShipwrightResult<String> {
        let runtime = &self.config.runtime;
        match strategy {
            Strategy::VirtualEnvironment => {
                let interpreter = self.discover(family).await?;
                venv::provision(self.runner, &interpreter, dir, target.os, &runtime.requirements)
                    .await?;
                Ok(interpreter.version.to_string())
            }
            Strategy::EmbeddableDistribution => {
                // Host pip does the install; it only needs to be a 3.x with pip
                let interpreter = self.discover(family).await?;
                embeddable::provision(
                    self.runner,
                    &runtime.embeddable,
                    family,
                    target,
                    interpreter.command(),
                    dir,
                    &runtime.requirements,
                )
                .await?;
                Ok(runtime.embeddable.release.clone())
            }
            Strategy::PreVendoredTree => {
                vendored::provision(
                    &runtime.vendored_dir,
                    target,
                    &strategy.interpreter_path(target.os),
                    dir,
                )?;
                Ok(vendored_version(dir).unwrap_or_else(|| family.to_string()))
            }
        }
    }

    async fn discover(&self, family: &VersionFamily) -> ShipwrightResult<interpreter::Interpreter> {
        let candidates = interpreter::candidates(
            family,
            self.config.runtime.interpreter.as_deref(),
            self.host.os,
        );
        interpreter::discover(self.runner, family, &candidates).await
    }

    /// Copy the helper script next to the interpreter
    fn install_helper(&self, dir: &Path) -> ShipwrightResult<()> {
        let script = &self.config.runtime.helper_script;
        let Some(name) = script.file_name() else {
            return Ok(());
        };
        let dest = dir.join(name);
        fs::copy(script, &dest).map_err(|e| {
            ShipwrightError::io(
                format!("copying {} to {}", script.display(), dest.display()),
                e,
            )
        })?;
        debug!("Installed helper script {}", dest.display());
        Ok(())
    }
}

/// Version recorded in a vendored tree's `pyvenv.cfg`, if any
fn vendored_version(dir: &Path) -> Option<String> {
    let content = fs::read_to_string(dir.join("pyvenv.cfg")).ok()?;
    content.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        match key.trim() {
            "version" | "version_info" => parse_loose(value).map(|v| v.to_string()),
            _ => None,
        }
    })
}
