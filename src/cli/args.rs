//! CLI argument definitions using clap derive

use crate::platform::{Arch, Target};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Shipwright - runtime provisioning and macOS packaging
///
/// Builds the relocatable Python runtime (or frozen sidecar) a desktop
/// app ships with, then signs and wraps the app in a disk image.
#[derive(Parser, Debug)]
#[command(name = "shipwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHIPWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the Python runtime directory for a target
    Runtime(RuntimeArgs),

    /// Freeze the helper script into a sidecar executable
    Sidecar(SidecarArgs),

    /// Sign the app bundle and create the disk image (macOS)
    Package(PackageArgs),

    /// Run the whole pipeline: runtime or sidecar, then package
    Build(BuildArgs),

    /// Inspect or clear build caches
    Cache(CacheArgs),

    /// Print the fingerprint of the current build inputs
    Fingerprint,

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the runtime command
#[derive(Parser, Debug)]
pub struct RuntimeArgs {
    /// Build target as <os>-<arch> (defaults to the host)
    #[arg(short, long)]
    pub target: Option<Target>,

    /// Rebuild even when the cache is current
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the sidecar command
#[derive(Parser, Debug)]
pub struct SidecarArgs {
    /// Rebuild even when the cache is current
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the package command
#[derive(Parser, Debug)]
pub struct PackageArgs {
    /// Architecture label for the image name (defaults to the host)
    #[arg(short, long)]
    pub arch: Option<Arch>,

    /// Do not sign even if an identity is configured
    #[arg(long)]
    pub skip_sign: bool,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Runtime target as <os>-<arch> (defaults to the host)
    #[arg(short, long)]
    pub target: Option<Target>,

    /// Rebuild even when the cache is current
    #[arg(short, long)]
    pub force: bool,

    /// Stop after the runtime or sidecar step
    #[arg(long)]
    pub no_package: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Write a default shipwright.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache records for runtimes and sidecars
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete built runtimes or sidecars so the next build starts fresh
    Clear {
        /// Only this runtime target (<os>-<arch>)
        #[arg(short, long, conflicts_with = "sidecar")]
        target: Option<Target>,

        /// Clear sidecar binaries instead of runtimes
        #[arg(long)]
        sidecar: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
