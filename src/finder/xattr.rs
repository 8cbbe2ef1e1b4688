//! Extended-attribute access for `com.apple.FinderInfo`

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// Attribute name
pub const FINDER_INFO_ATTR: &str = "com.apple.FinderInfo";

/// Reads and writes the raw FinderInfo attribute
#[async_trait]
pub trait XattrBackend: Send + Sync {
    /// Raw attribute bytes; soft failures surface as
    /// [`ShipwrightError::AttributeAccessSoftFailure`]
    async fn read(&self, path: &Path) -> ShipwrightResult<Vec<u8>>;

    /// Replace the attribute with `value`
    async fn write(&self, path: &Path, value: &[u8]) -> ShipwrightResult<()>;
}

/// Map a tool's exit status onto the error taxonomy.
///
/// Status 1 is what `xattr` returns for "no such attribute" and for
/// filesystems without xattr support; callers treat it as a warning.
pub fn classify_status(path: &Path, command: &CommandSpec, output: &CommandOutput) -> ShipwrightResult<()> {
    match output.code {
        Some(0) => Ok(()),
        Some(1) => Err(ShipwrightError::AttributeAccessSoftFailure {
            path: path.to_path_buf(),
            status: 1,
        }),
        _ => Err(ShipwrightError::AttributeAccessHardFailure {
            path: path.to_path_buf(),
            command: command.to_string(),
            code: output.code_or_signal(),
            stderr: output.stderr.trim().to_string(),
        }),
    }
}

/// Backend driving the `xattr` command-line tool
pub struct CommandXattr {
    program: OsString,
    runner: Arc<dyn CommandRunner>,
}

impl CommandXattr {
    pub fn new(program: impl Into<OsString>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    async fn invoke(&self, path: &Path, spec: CommandSpec) -> ShipwrightResult<CommandOutput> {
        trace!("xattr: {}", spec);
        let output = self.runner.run(&spec).await.map_err(|e| {
            ShipwrightError::AttributeAccessHardFailure {
                path: path.to_path_buf(),
                command: spec.to_string(),
                code: -1,
                stderr: e.to_string(),
            }
        })?;
        classify_status(path, &spec, &output)?;
        Ok(output)
    }
}

#[async_trait]
impl XattrBackend for CommandXattr {
    async fn read(&self, path: &Path) -> ShipwrightResult<Vec<u8>> {
        let spec = CommandSpec::new(&self.program)
            .args(["-px", FINDER_INFO_ATTR])
            .arg(path);
        let output = self.invoke(path, spec).await?;
        let compact: String = output.stdout.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(&compact).map_err(|e| ShipwrightError::AttributeAccessHardFailure {
            path: path.to_path_buf(),
            command: format!("{} -px {}", self.program.to_string_lossy(), FINDER_INFO_ATTR),
            code: 0,
            stderr: format!("unparseable output: {e}"),
        })
    }

    async fn write(&self, path: &Path, value: &[u8]) -> ShipwrightResult<()> {
        let spec = CommandSpec::new(&self.program)
            .args(["-wx", FINDER_INFO_ATTR])
            .arg(hex::encode_upper(value))
            .arg(path);
        self.invoke(path, spec).await.map(|_| ())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;

    #[test]
    fn status_classification() {
        let path = Path::new("/Volumes/App/.VolumeIcon.icns");
        let spec = CommandSpec::new("xattr");

        assert!(classify_status(path, &spec, &CommandOutput::success("")).is_ok());

        let soft = classify_status(path, &spec, &CommandOutput::failure(1, "No such xattr")).unwrap_err();
        assert!(soft.is_soft());

        let hard = classify_status(path, &spec, &CommandOutput::failure(2, "denied")).unwrap_err();
        assert!(matches!(
            hard,
            ShipwrightError::AttributeAccessHardFailure { code: 2, .. }
        ));
        assert!(!hard.is_soft());
    }

    #[tokio::test]
    async fn command_backend_reads_hex_dump() {
        let runner = FakeRunner::new().on(|spec| {
            spec.has_arg("-px").then(|| {
                Ok(CommandOutput::success(
                    "00 00 00 00 69 63 6E 43 04 00 00 00 00 00 00 00\n\
                     00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00\n",
                ))
            })
        });
        let backend = CommandXattr::new("xattr", Arc::new(runner));

        let bytes = backend.read(Path::new("/tmp/icon")).await.unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[4..8], b"icnC");
    }

    #[tokio::test]
    async fn command_backend_writes_uppercase_hex() {
        let runner = Arc::new(FakeRunner::new());
        let backend = CommandXattr::new("/usr/bin/xattr", runner.clone());

        backend.write(Path::new("/tmp/f"), &[0xab; 32]).await.unwrap();

        let calls = runner.calls();
        assert_eq!(
            calls[0].args_lossy(),
            vec!["-wx", FINDER_INFO_ATTR, "AB".repeat(32).as_str(), "/tmp/f"]
        );
    }

    #[tokio::test]
    async fn spawn_failure_is_hard() {
        let runner = FakeRunner::new().on(|_| {
            Some(Err(ShipwrightError::command_failed(
                "xattr",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )))
        });
        let backend = CommandXattr::new("xattr", Arc::new(runner));
        let err = backend.read(Path::new("/tmp/f")).await.unwrap_err();
        assert!(matches!(err, ShipwrightError::AttributeAccessHardFailure { .. }));
    }
}
