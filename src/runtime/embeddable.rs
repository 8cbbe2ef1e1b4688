//! Windows embeddable distribution strategy
//!
//! The official `python-X.Y.Z-embed-<arch>.zip` is downloaded once into a
//! local cache, verified, extracted into the runtime directory and then
//! populated with `pip --target`.

use crate::config::schema::EmbeddableConfig;
use crate::error::{ShipwrightError, ShipwrightResult};
use crate::fsutil;
use crate::platform::{Arch, Os, Target};
use crate::process::{CommandRunner, CommandSpec};
use crate::runtime::pip::{CrossTarget, PipInstall};
use crate::version::VersionFamily;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Relative location of the dependency payload
pub const SITE_PACKAGES: &str = "Lib/site-packages";

/// Download (if needed), verify, extract and populate the runtime directory
pub async fn provision(
    runner: &dyn CommandRunner,
    config: &EmbeddableConfig,
    family: &VersionFamily,
    target: Target,
    host_python: CommandSpec,
    dir: &Path,
    manifest: &Path,
) -> ShipwrightResult<()> {
    let archive = ensure_archive(config, target.arch).await?;
    extract(&archive, dir)?;
    enable_site_packages(dir, family)?;

    let site_packages = dir.join(SITE_PACKAGES);
    let mut install = PipInstall::new(host_python)
        .target_dir(&site_packages)
        .requirements(manifest);
    if target.os != Os::detect()? || target.arch != Arch::detect()? {
        install = install.cross(CrossTarget {
            platform: target.arch.windows_wheel_platform().to_string(),
            python_version: family.to_string(),
        });
    }
    install.run(runner).await
}

/// Cached archive path for `config`, downloading it when absent
pub async fn ensure_archive(config: &EmbeddableConfig, arch: Arch) -> ShipwrightResult<PathBuf> {
    let url = config.url_for(arch.embeddable_label());
    let file_name = url
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("python-embed.zip")
        .to_string();
    let archive = config.cache_dir.join(&file_name);

    let expected = match (&config.sha256, config.allow_unverified) {
        (Some(sha), _) => Some(sha.trim().to_ascii_lowercase()),
        (None, true) => {
            warn!("No checksum configured for {}; archive will not be verified", url);
            None
        }
        (None, false) => return Err(ShipwrightError::ChecksumMissing { url }),
    };

    if archive.is_file() {
        debug!("Using cached archive {}", archive.display());
    } else {
        fs::create_dir_all(&config.cache_dir).map_err(|e| {
            ShipwrightError::io(format!("creating {}", config.cache_dir.display()), e)
        })?;
        let dest = archive.clone();
        let url = url.clone();
        tokio::task::spawn_blocking(move || download(&url, &dest))
            .await
            .map_err(|e| ShipwrightError::Internal(format!("download task failed: {e}")))??;
    }

    if let Some(expected) = expected {
        let actual = sha256_file(&archive)?;
        if actual != expected {
            warn!("Checksum mismatch, discarding {}", archive.display());
            fsutil::remove_path(&archive)?;
            return Err(ShipwrightError::ChecksumMismatch {
                path: archive,
                expected,
                actual,
            });
        }
        debug!("Checksum verified for {}", archive.display());
    }
    Ok(archive)
}

fn download(url: &str, dest: &Path) -> ShipwrightResult<()> {
    info!("Downloading {}", url);
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let fail = |reason: String| ShipwrightError::ArchiveDownload {
        url: url.to_string(),
        reason,
    };

    let response = ureq::get(url).call().map_err(|e| fail(e.to_string()))?;
    let mut reader = response.into_body().into_reader();
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| ShipwrightError::io(format!("creating temp file in {}", dir.display()), e))?;
    io::copy(&mut reader, tmp.as_file_mut()).map_err(|e| fail(e.to_string()))?;
    tmp.persist(dest)
        .map_err(|e| ShipwrightError::io(format!("saving {}", dest.display()), e.error))?;
    Ok(())
}

/// Hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> ShipwrightResult<String> {
    let mut file =
        File::open(path).map_err(|e| ShipwrightError::io(format!("opening {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| ShipwrightError::io(format!("reading {}", path.display()), e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Unpack `archive` into `dest`
pub fn extract(archive: &Path, dest: &Path) -> ShipwrightResult<()> {
    let fail = |reason: String| ShipwrightError::ArchiveExtraction {
        archive: archive.to_path_buf(),
        reason,
    };
    let file = File::open(archive).map_err(|e| fail(e.to_string()))?;
    let mut zip = ZipArchive::new(file).map_err(|e| fail(e.to_string()))?;
    fs::create_dir_all(dest).map_err(|e| fail(e.to_string()))?;
    zip.extract(dest).map_err(|e| fail(e.to_string()))?;
    debug!("Extracted {} entries into {}", zip.len(), dest.display());
    Ok(())
}

/// Make the embedded interpreter see `Lib/site-packages`.
///
/// The `pythonXY._pth` file ships with `import site` commented out and
/// no site-packages entry.
pub fn enable_site_packages(dir: &Path, family: &VersionFamily) -> ShipwrightResult<()> {
    let pth = dir.join(format!("python{}._pth", family.compact()));
    let content = fs::read_to_string(&pth)
        .map_err(|e| ShipwrightError::io(format!("reading {}", pth.display()), e))?;
    let rewritten = rewrite_pth(&content);
    fs::write(&pth, rewritten).map_err(|e| ShipwrightError::io(format!("writing {}", pth.display()), e))?;
    fs::create_dir_all(dir.join(SITE_PACKAGES))
        .map_err(|e| ShipwrightError::io("creating site-packages", e))?;
    Ok(())
}

/// Uncomment `import site` and append `Lib\site-packages` once
pub fn rewrite_pth(content: &str) -> String {
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if line.trim_start_matches('#').trim() == "import site" {
                "import site".to_string()
            } else {
                line.to_string()
            }
        })
        .collect();

    let has_site_packages = lines
        .iter()
        .any(|l| l.trim().eq_ignore_ascii_case("Lib\\site-packages") || l.trim() == "Lib/site-packages");
    if !has_site_packages {
        let at = lines
            .iter()
            .position(|l| l == "import site")
            .unwrap_or(lines.len());
        lines.insert(at, "Lib\\site-packages".to_string());
    }
    if !lines.iter().any(|l| l == "import site") {
        lines.push("import site".to_string());
    }

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn config(cache_dir: &Path, archive: &str) -> EmbeddableConfig {
        EmbeddableConfig {
            url: Some(format!("https://mirror.invalid/{archive}")),
            cache_dir: cache_dir.to_path_buf(),
            ..EmbeddableConfig::default()
        }
    }

    #[test]
    fn pth_rewrite() {
        let shipped = "python311.zip\r\n.\r\n\r\n# Uncomment to run site.main() automatically\r\n#import site\r\n";
        let out = rewrite_pth(shipped);
        assert_eq!(
            out,
            "python311.zip\r\n.\r\n\r\n# Uncomment to run site.main() automatically\r\nLib\\site-packages\r\nimport site\r\n"
        );
        assert_eq!(rewrite_pth(&out), out);
    }

    #[test]
    fn extract_and_enable_site() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("python-3.11.9-embed-amd64.zip");
        write_zip(
            &archive,
            &[
                ("python.exe", b"MZ"),
                ("python311.zip", b"PK"),
                ("python311._pth", b"python311.zip\r\n.\r\n#import site\r\n"),
            ],
        );
        let dir = temp.path().join("windows-x86_64");

        extract(&archive, &dir).unwrap();
        enable_site_packages(&dir, &"3.11".parse().unwrap()).unwrap();

        assert!(dir.join("python.exe").is_file());
        assert!(dir.join(SITE_PACKAGES).is_dir());
        let pth = fs::read_to_string(dir.join("python311._pth")).unwrap();
        assert!(pth.contains("Lib\\site-packages\r\nimport site"));
    }

    #[test]
    fn corrupt_archive_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let err = extract(&archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, ShipwrightError::ArchiveExtraction { .. }));
    }

    #[tokio::test]
    async fn cached_archive_checksum_is_verified() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("python-embed-amd64.zip");
        fs::write(&archive, b"archive bytes").unwrap();
        let good = sha256_file(&archive).unwrap();

        let mut cfg = config(temp.path(), "python-embed-amd64.zip");
        cfg.sha256 = Some(good.to_uppercase());
        assert_eq!(ensure_archive(&cfg, Arch::X86_64).await.unwrap(), archive);

        cfg.sha256 = Some("00".repeat(32));
        let err = ensure_archive(&cfg, Arch::X86_64).await.unwrap_err();
        assert!(matches!(err, ShipwrightError::ChecksumMismatch { .. }));
    }

    #[tokio::test]
    async fn mismatched_archive_is_evicted_from_cache() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("python-embed-amd64.zip");
        fs::write(&archive, b"truncated download").unwrap();

        let mut cfg = config(temp.path(), "python-embed-amd64.zip");
        cfg.sha256 = Some("ab".repeat(32));
        let err = ensure_archive(&cfg, Arch::X86_64).await.unwrap_err();

        assert!(matches!(err, ShipwrightError::ChecksumMismatch { .. }));
        assert!(!archive.exists());
    }

    #[tokio::test]
    async fn missing_checksum_is_rejected_unless_allowed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("python-embed-arm64.zip"), b"zip").unwrap();

        let mut cfg = config(temp.path(), "python-embed-arm64.zip");
        let err = ensure_archive(&cfg, Arch::Aarch64).await.unwrap_err();
        assert!(matches!(err, ShipwrightError::ChecksumMissing { .. }));

        cfg.allow_unverified = true;
        assert!(ensure_archive(&cfg, Arch::Aarch64).await.is_ok());
    }
}
