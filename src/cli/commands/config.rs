//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LoadedConfig, CONFIG_FILE_NAME};
use crate::error::{ShipwrightError, ShipwrightResult};
use crate::ui::{self, UiContext};
use std::path::Path;

/// Execute the config command
pub async fn execute(args: ConfigArgs, loaded: &LoadedConfig) -> ShipwrightResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(&loaded.config)?,
        Some(ConfigAction::Path) => show_path(loaded),
        Some(ConfigAction::Init { force }) => {
            let cwd = std::env::current_dir()
                .map_err(|e| ShipwrightError::io("getting current directory", e))?;
            init(&cwd, force).await?
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> ShipwrightResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(loaded: &LoadedConfig) {
    match &loaded.path {
        Some(path) => println!("{}", path.display()),
        None => {
            let ctx = UiContext::detect();
            println!("{}", loaded.base_dir.join(CONFIG_FILE_NAME).display());
            ui::remark(&ctx, "(not created yet; run: shipwright config init)");
        }
    }
}

/// Write a default `shipwright.toml` into `dir`
pub async fn init(dir: &Path, force: bool) -> ShipwrightResult<()> {
    let ctx = UiContext::detect();
    let path = dir.join(CONFIG_FILE_NAME);

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    ConfigManager::with_path(path.clone())
        .save(&Config::default())
        .await?;

    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}
