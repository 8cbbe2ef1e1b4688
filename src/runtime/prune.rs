//! Runtime payload pruning
//!
//! Strips bytecode caches everywhere and development assets from the heavy
//! ML packages. Running it twice removes nothing the second time.

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::platform::Os;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Packages whose wheels carry headers, static libs and test suites
pub const HEAVY_PACKAGES: &[&str] = &["torch", "numpy", "tokenizers", "safetensors"];

/// Windows `MAX_PATH` headroom for the installed location prefix
pub const WINDOWS_PATH_WARN_LEN: usize = 200;

/// Header and test-suite directories (not `testing`, which torch imports)
const DEV_DIRS: &[&str] = &["include", "tests", "test"];
const DEV_EXTENSIONS: &[&str] = &["a", "lib", "pdb"];

/// What a prune pass removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub dirs_removed: usize,
    pub files_removed: usize,
    pub bytes_freed: u64,
    /// Longest remaining path relative to the runtime root
    pub longest_path: Option<PathBuf>,
}

impl PruneReport {
    /// Character length of the longest remaining relative path
    pub fn longest_len(&self) -> usize {
        self.longest_path
            .as_ref()
            .map(|p| p.to_string_lossy().chars().count())
            .unwrap_or(0)
    }
}

/// Prune `root` in place
pub fn prune(root: &Path, os: Os, extra_packages: &[String]) -> ShipwrightResult<PruneReport> {
    let mut report = PruneReport::default();
    let heavy: Vec<&str> = HEAVY_PACKAGES
        .iter()
        .copied()
        .chain(extra_packages.iter().map(String::as_str))
        .collect();

    // Collect first so removal does not race the walker
    let mut doomed_dirs = Vec::new();
    let mut doomed_files = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            ShipwrightError::io(
                format!("walking {}", root.display()),
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            )
        })?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        let in_heavy = inside_heavy_package(root, path, &heavy);

        if entry.file_type().is_dir() {
            let is_dev_dir = in_heavy
                && (DEV_DIRS.contains(&name.as_ref()) || name.ends_with(".dSYM"));
            if name == "__pycache__" || is_dev_dir {
                doomed_dirs.push(path.to_path_buf());
                walker.skip_current_dir();
            }
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let bytecode = matches!(ext, "pyc" | "pyo");
        let dev_file = in_heavy && DEV_EXTENSIONS.contains(&ext);
        if bytecode || dev_file {
            doomed_files.push(path.to_path_buf());
        }
    }

    for dir in doomed_dirs {
        report.bytes_freed += tree_size(&dir);
        fs::remove_dir_all(&dir)
            .map_err(|e| ShipwrightError::io(format!("removing {}", dir.display()), e))?;
        report.dirs_removed += 1;
    }
    for file in doomed_files {
        report.bytes_freed += file.metadata().map(|m| m.len()).unwrap_or(0);
        fs::remove_file(&file)
            .map_err(|e| ShipwrightError::io(format!("removing {}", file.display()), e))?;
        report.files_removed += 1;
    }

    report.longest_path = longest_relative_path(root);
    debug!(
        "Pruned {} dirs, {} files, {} bytes",
        report.dirs_removed, report.files_removed, report.bytes_freed
    );

    if os == Os::Windows && report.longest_len() > WINDOWS_PATH_WARN_LEN {
        if let Some(path) = &report.longest_path {
            warn!(
                "Longest runtime path is {} characters ({}); Windows installs may exceed MAX_PATH",
                report.longest_len(),
                path.display()
            );
        }
    }

    Ok(report)
}

fn inside_heavy_package(root: &Path, path: &Path, heavy: &[&str]) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    let components: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    // Only below site-packages/<pkg>/, never the package dir itself
    components
        .iter()
        .position(|c| c == "site-packages")
        .and_then(|i| components.get(i + 1).map(|pkg| (i, pkg)))
        .is_some_and(|(i, pkg)| heavy.contains(&pkg.as_str()) && components.len() > i + 2)
}

fn tree_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

fn longest_relative_path(root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .max_by_key(|p| p.to_string_lossy().chars().count())
}
