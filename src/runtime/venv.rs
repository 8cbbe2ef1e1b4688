//! Virtual environment strategy

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::platform::Os;
use crate::process::{CommandRunner, CommandSpec};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::pip::PipInstall;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Create a copied (not symlinked) venv at `dir` and install `manifest` into it.
///
/// Returns the environment's own interpreter.
pub async fn provision(
    runner: &dyn CommandRunner,
    interpreter: &Interpreter,
    dir: &Path,
    os: Os,
    manifest: &Path,
) -> ShipwrightResult<PathBuf> {
    let python = create(runner, interpreter, dir, os).await?;
    PipInstall::new(CommandSpec::new(&python))
        .requirements(manifest)
        .run(runner)
        .await?;
    relocate(dir, os)?;
    Ok(python)
}

/// `python -m venv --copies <dir>`
pub async fn create(
    runner: &dyn CommandRunner,
    interpreter: &Interpreter,
    dir: &Path,
    os: Os,
) -> ShipwrightResult<PathBuf> {
    let cmd = interpreter
        .command()
        .args(["-m", "venv", "--copies"])
        .arg(dir);
    info!("Creating virtual environment at {}", dir.display());
    let output = runner.run(&cmd).await?;
    if !output.is_success() {
        return Err(ShipwrightError::command_exec(cmd.to_string(), output.tail()));
    }
    Ok(dir.join(env_python(os)))
}

/// Interpreter path relative to the environment root
pub fn env_python(os: Os) -> PathBuf {
    match os {
        Os::Windows => PathBuf::from("Scripts").join("python.exe"),
        _ => PathBuf::from("bin").join("python3"),
    }
}

/// Rewrite `<dir>/pyvenv.cfg` so it no longer names the build machine's paths
pub fn relocate(dir: &Path, os: Os) -> ShipwrightResult<()> {
    let cfg = dir.join("pyvenv.cfg");
    let content = match fs::read_to_string(&cfg) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No pyvenv.cfg at {}, skipping relocation", cfg.display());
            return Ok(());
        }
        Err(e) => return Err(ShipwrightError::io(format!("reading {}", cfg.display()), e)),
    };
    let rewritten = relocate_pyvenv_cfg(&content, os);
    if rewritten != content {
        fs::write(&cfg, rewritten)
            .map_err(|e| ShipwrightError::io(format!("writing {}", cfg.display()), e))?;
        debug!("Rewrote {}", cfg.display());
    }
    Ok(())
}

/// Pure rewrite of a `pyvenv.cfg` body.
///
/// `home` becomes the environment's own bin dir (relative), `executable`
/// points at the copied interpreter and `command` is dropped. Other keys pass
/// through untouched.
pub fn relocate_pyvenv_cfg(content: &str, os: Os) -> String {
    let bin = os.venv_bin_dir();
    let exe = match os {
        Os::Windows => format!("{bin}\\python.exe"),
        _ => format!("{bin}/python3"),
    };

    let mut lines = Vec::new();
    let mut saw_executable = false;
    for line in content.lines() {
        let key = line.split('=').next().map(str::trim).unwrap_or_default();
        match key {
            "home" => lines.push(format!("home = {bin}")),
            "executable" => {
                saw_executable = true;
                lines.push(format!("executable = {exe}"));
            }
            "command" => {}
            _ => lines.push(line.to_string()),
        }
    }
    if !saw_executable && content.lines().any(|l| l.trim_start().starts_with("home")) {
        lines.push(format!("executable = {exe}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;
    use crate::process::CommandOutput;
    use semver::Version;
    use tempfile::TempDir;

    const CFG: &str = "home = /opt/homebrew/opt/python@3.11/bin
include-system-site-packages = false
version = 3.11.9
executable = /opt/homebrew/Cellar/python@3.11/3.11.9/bin/python3.11
command = /opt/homebrew/bin/python3.11 -m venv --copies /repo/resources/python/macos-aarch64
";

    #[test]
    fn rewrite_unix_cfg() {
        let out = relocate_pyvenv_cfg(CFG, Os::MacOS);
        assert_eq!(
            out,
            "home = bin\ninclude-system-site-packages = false\nversion = 3.11.9\nexecutable = bin/python3\n"
        );
    }

    #[test]
    fn rewrite_windows_cfg_adds_executable() {
        let cfg = "home = C:\\Python311\r\nversion = 3.11.9\r\n";
        let out = relocate_pyvenv_cfg(cfg, Os::Windows);
        assert!(out.contains("home = Scripts\n"));
        assert!(out.contains("executable = Scripts\\python.exe\n"));
        assert!(!out.contains("C:\\Python311"));
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = relocate_pyvenv_cfg(CFG, Os::Linux);
        assert_eq!(relocate_pyvenv_cfg(&once, Os::Linux), once);
    }

    #[tokio::test]
    async fn provision_creates_installs_and_relocates() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("macos-aarch64");
        let cfg_dir = dir.clone();
        let runner = FakeRunner::new().on(move |spec| {
            if spec.has_arg("venv") {
                std::fs::create_dir_all(&cfg_dir).unwrap();
                std::fs::write(cfg_dir.join("pyvenv.cfg"), CFG).unwrap();
            }
            Some(Ok(CommandOutput::success("")))
        });
        let interp = Interpreter {
            executable: PathBuf::from("/opt/homebrew/bin/python3.11"),
            version: Version::new(3, 11, 9),
        };

        let python = provision(&runner, &interp, &dir, Os::MacOS, Path::new("req.txt"))
            .await
            .unwrap();

        assert_eq!(python, dir.join("bin/python3"));
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].has_arg("--copies"));
        assert_eq!(calls[1].program, python.as_os_str());
        let cfg = std::fs::read_to_string(dir.join("pyvenv.cfg")).unwrap();
        assert!(cfg.contains("home = bin"));
        assert!(!cfg.contains("command"));
    }

    #[tokio::test]
    async fn venv_failure_is_reported() {
        let runner = FakeRunner::new().on(|_| Some(Ok(CommandOutput::failure(1, "Error: ensurepip"))));
        let interp = Interpreter {
            executable: PathBuf::from("python3"),
            version: Version::new(3, 11, 0),
        };
        let err = create(&runner, &interp, Path::new("/tmp/x"), Os::Linux)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ensurepip"));
    }
}
