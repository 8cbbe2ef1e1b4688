//! Host target triple lookup

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::process::{CommandRunner, CommandSpec};

/// Ask `rustc -vV` for the host triple
pub async fn host_triple(runner: &dyn CommandRunner) -> ShipwrightResult<String> {
    let cmd = CommandSpec::new("rustc").arg("-vV");
    let output = runner
        .run(&cmd)
        .await
        .map_err(|e| ShipwrightError::TargetTripleUnavailable(e.to_string()))?;
    if !output.is_success() {
        return Err(ShipwrightError::TargetTripleUnavailable(format!(
            "rustc -vV exited with {}: {}",
            output.code_or_signal(),
            output.stderr.trim()
        )));
    }
    parse_host_line(&output.stdout).ok_or_else(|| {
        ShipwrightError::TargetTripleUnavailable("no 'host:' line in rustc -vV output".to_string())
    })
}

/// Extract the value of the `host:` line
pub fn parse_host_line(verbose_version: &str) -> Option<String> {
    verbose_version
        .lines()
        .find_map(|line| line.strip_prefix("host:"))
        .map(str::trim)
        .filter(|triple| !triple.is_empty())
        .map(str::to_string)
}

/// Executable suffix for binaries built for `triple`
pub fn exe_suffix(triple: &str) -> &'static str {
    if triple.contains("windows") {
        ".exe"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;
    use crate::process::CommandOutput;

    const RUSTC_VV: &str = "rustc 1.82.0 (f6e511eec 2024-10-15)
binary: rustc
commit-hash: f6e511eec7342f59a25f7c0534f1dbea00d01b14
commit-date: 2024-10-15
host: aarch64-apple-darwin
release: 1.82.0
LLVM version: 19.1.1
";

    #[test]
    fn parses_host_line() {
        assert_eq!(parse_host_line(RUSTC_VV).as_deref(), Some("aarch64-apple-darwin"));
        assert_eq!(parse_host_line("rustc 1.82.0\nbinary: rustc\n"), None);
        assert_eq!(parse_host_line("host:   \n"), None);
    }

    #[test]
    fn windows_triples_get_exe() {
        assert_eq!(exe_suffix("x86_64-pc-windows-msvc"), ".exe");
        assert_eq!(exe_suffix("x86_64-unknown-linux-gnu"), "");
    }

    #[tokio::test]
    async fn host_triple_from_rustc() {
        let runner = FakeRunner::new().on(|_| Some(Ok(CommandOutput::success(RUSTC_VV))));
        assert_eq!(host_triple(&runner).await.unwrap(), "aarch64-apple-darwin");
    }

    #[tokio::test]
    async fn missing_rustc_is_reported() {
        let runner = FakeRunner::new().on(|_| {
            Some(Err(ShipwrightError::command_failed(
                "rustc -vV",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )))
        });
        let err = host_triple(&runner).await.unwrap_err();
        assert!(matches!(err, ShipwrightError::TargetTripleUnavailable(_)));
    }
}
