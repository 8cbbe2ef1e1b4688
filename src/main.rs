//! Shipwright - runtime provisioning and macOS packaging
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shipwright::cli::args::{ConfigAction, ConfigArgs};
use shipwright::cli::{commands, Cli, Commands};
use shipwright::config::ConfigManager;
use shipwright::error::{ShipwrightError, ShipwrightResult};
use std::process::ExitCode;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> ShipwrightResult<()> {
    let cli = Cli::parse();

    // Completions and `config init` run before any config is read
    match &cli.command {
        Commands::Completions(args) => return commands::completions(args.shell),
        Commands::Config(ConfigArgs {
            action: Some(ConfigAction::Init { force }),
        }) => {
            shipwright::logging::init_cli(cli.verbose, false);
            return commands::config::init(&current_dir()?, *force).await;
        }
        _ => {}
    }

    let cwd = current_dir()?;
    let loaded = ConfigManager::resolve(cli.config.as_deref(), &cwd).await?;
    let config = &loaded.config;

    let verbose = if config.general.verbose {
        cli.verbose.max(1)
    } else {
        cli.verbose
    };
    shipwright::logging::init_cli(verbose, config.general.log_format == "json");
    match &loaded.path {
        Some(path) => debug!("Loaded config: {}", path.display()),
        None => debug!("Using default config rooted at {}", loaded.base_dir.display()),
    }

    match cli.command {
        Commands::Completions(_) => unreachable!("completions handled above"),
        Commands::Runtime(args) => commands::runtime(args, config).await,
        Commands::Sidecar(args) => commands::sidecar(args, config).await,
        Commands::Package(args) => commands::package(args, config).await,
        Commands::Build(args) => commands::build(args, config).await,
        Commands::Cache(args) => commands::cache(args, config).await,
        Commands::Fingerprint => commands::fingerprint(config).await,
        Commands::Config(args) => commands::config(args, &loaded).await,
    }
}

fn current_dir() -> ShipwrightResult<std::path::PathBuf> {
    std::env::current_dir().map_err(|e| ShipwrightError::io("getting current directory", e))
}
