//! Host interpreter discovery

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::platform::Os;
use crate::process::{CommandRunner, CommandSpec};
use crate::version::{parse_loose, VersionFamily};
use semver::Version;
use std::path::PathBuf;
use tracing::debug;

const PROBE: &str = "import sys; print('.'.join(map(str, sys.version_info[:3]))); print(sys.executable)";

/// An interpreter that satisfied the version requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// Absolute path reported by `sys.executable`
    pub executable: PathBuf,
    /// Full version, e.g. `3.11.9`
    pub version: Version,
}

impl Interpreter {
    /// Command that runs this interpreter
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.executable)
    }
}

/// Ordered probe list: configured interpreter, `py -3.X` on Windows,
/// then `python3.X`, `python3`, `python`
pub fn candidates(family: &VersionFamily, configured: Option<&str>, host: Os) -> Vec<CommandSpec> {
    let mut list = Vec::new();
    if let Some(configured) = configured {
        let mut parts = configured.split_whitespace();
        if let Some(program) = parts.next() {
            list.push(CommandSpec::new(program).args(parts));
        }
    }
    if host == Os::Windows {
        list.push(CommandSpec::new("py").arg(format!("-{family}")));
    }
    list.push(CommandSpec::new(format!("python{family}")));
    list.push(CommandSpec::new("python3"));
    list.push(CommandSpec::new("python"));
    list
}

/// Probe candidates in order and return the first in `family`.
///
/// Fails with [`ShipwrightError::InterpreterNotFound`] listing every attempt.
pub async fn discover(
    runner: &dyn CommandRunner,
    family: &VersionFamily,
    candidates: &[CommandSpec],
) -> ShipwrightResult<Interpreter> {
    let mut attempts = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let probe = candidate.clone().args(["-c", PROBE]);
        let label = candidate.to_string();

        let output = match runner.run(&probe).await {
            Ok(output) => output,
            Err(_) => {
                attempts.push(format!("{label}: not found"));
                continue;
            }
        };
        if !output.is_success() {
            attempts.push(format!("{label}: exit code {}", output.code_or_signal()));
            continue;
        }

        let mut lines = output.stdout.lines().map(str::trim);
        let version = lines.next().and_then(parse_loose);
        let executable = lines.next().filter(|l| !l.is_empty());
        match (version, executable) {
            (Some(version), Some(executable)) if family.matches(&version.to_string()) => {
                debug!("Using {} ({}) at {}", label, version, executable);
                return Ok(Interpreter {
                    executable: PathBuf::from(executable),
                    version,
                });
            }
            (Some(version), _) => attempts.push(format!("{label}: version {version}")),
            (None, _) => attempts.push(format!("{label}: unrecognized output")),
        }
    }

    Err(ShipwrightError::InterpreterNotFound {
        required: family.to_string(),
        attempts,
    })
}
