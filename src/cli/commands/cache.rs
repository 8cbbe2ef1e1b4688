//! Cache command - inspect and clear build caches

use crate::cache::{list_records, CacheRecord, RecordEntry};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::{ShipwrightError, ShipwrightResult};
use crate::fsutil;
use crate::platform::Target;
use crate::ui::{self, UiContext};
use console::style;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ShipwrightResult<()> {
    match args.action {
        CacheAction::List { format } => list_caches(config, format),
        CacheAction::Clear {
            target,
            sidecar,
            yes,
        } => clear_caches(config, target, sidecar, yes).await,
    }
}

/// Which pipeline step produced a cached artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheKind {
    Runtime,
    Sidecar,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Runtime => write!(f, "runtime"),
            CacheKind::Sidecar => write!(f, "sidecar"),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheRow {
    kind: CacheKind,
    /// Runtime directory name or sidecar binary stem
    name: String,
    path: PathBuf,
    record: CacheRecord,
}

fn collect_rows(config: &Config) -> Vec<CacheRow> {
    let runtimes = list_records(&config.runtime.output_dir)
        .into_iter()
        .map(|entry| row(CacheKind::Runtime, entry));
    let sidecars = list_records(&config.sidecar.binaries_dir)
        .into_iter()
        .filter(|entry| entry.path.parent() == Some(config.sidecar.binaries_dir.as_path()))
        .map(|entry| row(CacheKind::Sidecar, entry));
    runtimes.chain(sidecars).collect()
}

fn row(kind: CacheKind, entry: RecordEntry) -> CacheRow {
    let name = match kind {
        CacheKind::Runtime => entry
            .path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned()),
        CacheKind::Sidecar => entry.path.file_name().map(|n| {
            let n = n.to_string_lossy();
            n.trim_start_matches('.')
                .trim_end_matches(crate::cache::manager::SIDECAR_RECORD_SUFFIX)
                .to_string()
        }),
    }
    .unwrap_or_default();
    CacheRow {
        kind,
        name,
        path: entry.path,
        record: entry.record,
    }
}

/// List cache records
fn list_caches(config: &Config, format: OutputFormat) -> ShipwrightResult<()> {
    let rows = collect_rows(config);

    if rows.is_empty() {
        if matches!(format, OutputFormat::Json) {
            println!("[]");
        } else {
            println!("No cache records found.");
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_cache_table(&rows),
        OutputFormat::Json => print_cache_json(&rows)?,
        OutputFormat::Plain => print_cache_plain(&rows),
    }

    Ok(())
}

fn print_cache_table(rows: &[CacheRow]) {
    println!(
        "{:<8} {:<40} {:<12} {:<10} {:<14} {:<17}",
        "KIND", "NAME", "STRATEGY", "PYTHON", "FINGERPRINT", "UPDATED"
    );
    println!("{}", "-".repeat(104));

    for row in rows {
        let updated = row.record.updated_at.format("%Y-%m-%d %H:%M").to_string();
        let fingerprint: String = row.record.fingerprint.chars().take(12).collect();
        println!(
            "{:<8} {:<40} {:<12} {:<10} {:<14} {:<17}",
            row.kind,
            row.name,
            row.record.strategy,
            row.record.runtime_version,
            style(fingerprint).dim(),
            updated
        );
    }

    println!();
    println!("Total: {} cache record(s)", rows.len());
}

fn print_cache_json(rows: &[CacheRow]) -> ShipwrightResult<()> {
    #[derive(serde::Serialize)]
    #[serde(rename_all = "camelCase")]
    struct CacheJson<'a> {
        kind: String,
        name: &'a str,
        path: String,
        #[serde(flatten)]
        record: &'a CacheRecord,
    }

    let json_rows: Vec<CacheJson> = rows
        .iter()
        .map(|r| CacheJson {
            kind: r.kind.to_string(),
            name: &r.name,
            path: r.path.display().to_string(),
            record: &r.record,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_rows)?);
    Ok(())
}

fn print_cache_plain(rows: &[CacheRow]) {
    for row in rows {
        println!("{}", row.name);
    }
}

/// Paths `cache clear` would remove
fn clear_paths(config: &Config, target: Option<Target>, sidecar: bool) -> ShipwrightResult<Vec<PathBuf>> {
    if sidecar {
        return sidecar_paths(&config.sidecar.binaries_dir, &config.sidecar.name);
    }
    if let Some(target) = target {
        let dir = config.runtime.output_dir.join(target.key());
        return Ok(if dir.exists() { vec![dir] } else { Vec::new() });
    }

    let mut dirs: Vec<PathBuf> = list_records(&config.runtime.output_dir)
        .into_iter()
        .filter_map(|entry| entry.path.parent().map(Path::to_path_buf))
        .filter(|dir| dir.as_path() != config.runtime.output_dir)
        .collect();
    dirs.dedup();
    Ok(dirs)
}

/// Sidecar binaries (`<name>-*`) and their records (`.<name>-*.cache.json`)
fn sidecar_paths(binaries_dir: &Path, name: &str) -> ShipwrightResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(binaries_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ShipwrightError::io(
                format!("reading {}", binaries_dir.display()),
                e,
            ))
        }
    };

    let binary_prefix = format!("{name}-");
    let record_prefix = format!(".{name}-");
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|e| {
            let file_name = e.file_name().to_string_lossy().into_owned();
            file_name.starts_with(&binary_prefix)
                || (file_name.starts_with(&record_prefix)
                    && file_name.ends_with(crate::cache::manager::SIDECAR_RECORD_SUFFIX))
        })
        .map(|e| e.path())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Remove built runtimes or sidecars
async fn clear_caches(
    config: &Config,
    target: Option<Target>,
    sidecar: bool,
    yes: bool,
) -> ShipwrightResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let paths = clear_paths(config, target, sidecar)?;

    if paths.is_empty() {
        println!("Nothing to clear.");
        return Ok(());
    }

    println!("This will remove {} path(s):", paths.len());
    for path in &paths {
        println!("  {} {}", style("•").red(), path.display());
    }
    println!();

    if !ui::confirm(&ctx, "Are you sure?", false).await? {
        ui::step_warn_hint(&ctx, "Aborted", "Pass --yes to skip the prompt");
        return Ok(());
    }

    for path in &paths {
        debug!("Removing {}", path.display());
        fsutil::remove_path(path)?;
    }

    ui::step_ok(&ctx, &format!("Cleared {} path(s)", paths.len()));
    Ok(())
}
