//! `SetFile` command line
//!
//! Accepts the subset of Apple's `SetFile` that disk-image tools use:
//!
//! ```text
//! SetFile [-a <flags>] [-c <creator>] [-t <type>] [-d <date>] [-m <date>] [-P] <path>...
//! ```
//!
//! Options are parsed by hand rather than with clap: unknown options must be
//! logged and skipped, never rejected, because callers pass flags from the
//! full Apple tool.

use crate::error::{ShipwrightError, ShipwrightResult};
use crate::finder::config::EmulatorConfig;
use crate::finder::flags::FlagChange;
use crate::finder::info::FourCharCode;
use crate::finder::{soften, FinderAttributes};
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Parsed invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetFileArgs {
    pub attributes: Option<String>,
    pub creator: Option<String>,
    pub type_code: Option<String>,
    pub paths: Vec<PathBuf>,
    /// Options accepted but not acted on
    pub ignored: Vec<String>,
}

impl SetFileArgs {
    /// Parse arguments (without the program name)
    pub fn parse<I>(args: I) -> ShipwrightResult<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        let mut options_done = false;

        while let Some(arg) = args.next() {
            let text = arg.to_string_lossy().into_owned();
            if options_done || !text.starts_with('-') || text == "-" {
                parsed.paths.push(PathBuf::from(arg));
                continue;
            }
            if text == "--" {
                options_done = true;
                continue;
            }

            // `-aC` and `-a C` are both accepted
            let split = text.char_indices().nth(2).map_or(text.len(), |(i, _)| i);
            let (flag, inline) = text.split_at(split);
            let mut value = |name: &str| -> ShipwrightResult<String> {
                if !inline.is_empty() {
                    return Ok(inline.to_string());
                }
                args.next()
                    .map(|v| v.to_string_lossy().into_owned())
                    .ok_or_else(|| ShipwrightError::User(format!("option {name} requires a value")))
            };

            match flag {
                "-a" => parsed.attributes = Some(value("-a")?),
                "-c" => parsed.creator = Some(value("-c")?),
                "-t" => parsed.type_code = Some(value("-t")?),
                "-d" | "-m" => {
                    let v = value(flag)?;
                    parsed.ignored.push(format!("{flag} {v}"));
                }
                _ => parsed.ignored.push(text.clone()),
            }
        }

        Ok(parsed)
    }
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Attribute writes that succeeded (or would have, in observe mode)
    pub applied: usize,
    /// Operations skipped because of soft failures
    pub skipped: usize,
}

/// Execute a parsed invocation.
///
/// Every code and path is validated before the first write, so a bad
/// argument never leaves earlier paths half-modified.
pub async fn run(
    args: &SetFileArgs,
    config: &EmulatorConfig,
    attrs: &FinderAttributes,
) -> ShipwrightResult<RunSummary> {
    for ignored in &args.ignored {
        warn!("Ignoring unsupported option {}", ignored);
    }
    if args.paths.is_empty() {
        return Err(ShipwrightError::User(
            "usage: SetFile [-a flags] [-c creator] [-t type] path...".to_string(),
        ));
    }

    let creator = args.creator.as_deref().map(FourCharCode::parse).transpose()?;
    let type_code = args.type_code.as_deref().map(FourCharCode::parse).transpose()?;
    let flags = args.attributes.as_deref().map(FlagChange::parse);
    for path in &args.paths {
        if path.symlink_metadata().is_err() {
            return Err(ShipwrightError::PathNotFound(path.clone()));
        }
    }

    let mut summary = RunSummary::default();
    for path in &args.paths {
        if let Some(code) = type_code {
            let code = code.to_string();
            step(config, &mut summary, "set type", path, attrs.set_type_code(path, &code)).await?;
        }
        if let Some(code) = creator {
            let code = code.to_string();
            step(config, &mut summary, "set creator", path, attrs.set_creator_code(path, &code))
                .await?;
        }
        if let Some(change) = flags.filter(|c| !c.is_empty()) {
            let op = async move { attrs.apply_attribute_flags(path, change).await.map(|_| ()) };
            step(config, &mut summary, "set attributes", path, op).await?;
        }
    }
    Ok(summary)
}

/// Run one attribute operation; the future is dropped unpolled in observe mode
async fn step(
    config: &EmulatorConfig,
    summary: &mut RunSummary,
    what: &str,
    path: &Path,
    op: impl Future<Output = ShipwrightResult<()>>,
) -> ShipwrightResult<()> {
    if config.is_dry_run() {
        info!("[observe] would {} on {}", what, path.display());
        summary.applied += 1;
        return Ok(());
    }
    if soften(op.await, what, path)? {
        info!("{} on {}", what, path.display());
        summary.applied += 1;
    } else {
        summary.skipped += 1;
    }
    Ok(())
}
