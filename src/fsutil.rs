//! Filesystem helpers shared by the cache, provisioner and assembler

use crate::error::{ShipwrightError, ShipwrightResult};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write a file atomically: write a temp file next to it, then rename over.
///
/// Readers never observe a partially written file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> ShipwrightResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| ShipwrightError::io(format!("creating {}", parent.display()), e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| ShipwrightError::io(format!("creating temp file in {}", parent.display()), e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| ShipwrightError::io(format!("writing {}", tmp.path().display()), e))?;
    tmp.persist(path)
        .map_err(|e| ShipwrightError::io(format!("renaming into {}", path.display()), e.error))?;
    Ok(())
}

/// Recursively copy a directory, preserving symlinks on unix.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> ShipwrightResult<()> {
    fs::create_dir_all(dst)
        .map_err(|e| ShipwrightError::io(format!("creating {}", dst.display()), e))?;

    let entries =
        fs::read_dir(src).map_err(|e| ShipwrightError::io(format!("reading {}", src.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ShipwrightError::io(format!("reading {}", src.display()), e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| ShipwrightError::io(format!("stat {}", src_path.display()), e))?;

        if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(|e| {
                ShipwrightError::io(format!("copying {}", src_path.display()), e)
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> ShipwrightResult<()> {
    let target =
        fs::read_link(src).map_err(|e| ShipwrightError::io(format!("readlink {}", src.display()), e))?;
    if dst.symlink_metadata().is_ok() {
        remove_path(dst)?;
    }
    std::os::unix::fs::symlink(&target, dst)
        .map_err(|e| ShipwrightError::io(format!("symlinking {}", dst.display()), e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> ShipwrightResult<()> {
    // Follow the link; Windows symlinks need privileges.
    if src.is_dir() {
        copy_dir_recursive(src, dst)
    } else {
        fs::copy(src, dst)
            .map(|_| ())
            .map_err(|e| ShipwrightError::io(format!("copying {}", src.display()), e))
    }
}

/// Remove a file, symlink or directory tree. Missing paths are not an error.
pub fn remove_path(path: &Path) -> ShipwrightResult<()> {
    let meta = match path.symlink_metadata() {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ShipwrightError::io(format!("stat {}", path.display()), e)),
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| ShipwrightError::io(format!("removing {}", path.display()), e))
}

/// Move a file, falling back to copy+delete across filesystems.
pub fn move_file(src: &Path, dst: &Path) -> ShipwrightResult<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ShipwrightError::io(format!("creating {}", parent.display()), e))?;
    }
    remove_path(dst)?;
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst).map_err(|e| {
        ShipwrightError::io(format!("copying {} to {}", src.display(), dst.display()), e)
    })?;
    fs::remove_file(src).map_err(|e| ShipwrightError::io(format!("removing {}", src.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_replaces_contents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/record.json");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        // No temp files left behind
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn copy_dir_recursive_copies_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(src.join("Contents/MacOS")).unwrap();
        fs::write(src.join("Contents/Info.plist"), "<plist/>").unwrap();
        fs::write(src.join("Contents/MacOS/app"), "bin").unwrap();

        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("Contents/Info.plist")).unwrap(), "<plist/>");
        assert!(dst.join("Contents/MacOS/app").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn copy_dir_recursive_preserves_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("Current"), "v").unwrap();
        std::os::unix::fs::symlink("Current", src.join("link")).unwrap();

        copy_dir_recursive(&src, &dst).unwrap();

        let link = dst.join("link");
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), Path::new("Current"));
    }

    #[test]
    fn remove_path_handles_missing_files_and_dirs() {
        let temp = TempDir::new().unwrap();
        remove_path(&temp.path().join("missing")).unwrap();

        let dir = temp.path().join("dir");
        fs::create_dir_all(dir.join("a/b")).unwrap();
        remove_path(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn move_file_overwrites_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("dist/tool");
        let dst = temp.path().join("binaries/tool-x86_64");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "new").unwrap();
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&dst, "old").unwrap();

        move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
    }
}
