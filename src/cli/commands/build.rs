//! Build command - the full pipeline

use crate::cli::args::BuildArgs;
use crate::config::{BuildMode, Config};
use crate::error::ShipwrightResult;
use crate::platform::{Os, Target};
use crate::process::SystemRunner;
use crate::ui::{self, UiContext};

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> ShipwrightResult<()> {
    let ctx = UiContext::detect();
    let host = Target::host()?;
    let runner = SystemRunner::new();

    ui::intro(&ctx, &format!("Building {}", config.package.product_name));

    let arch = match config.general.mode {
        BuildMode::Runtime => {
            let target = args.target.unwrap_or(host);
            super::runtime::provision(&ctx, config, &runner, host, target, args.force).await?;
            target.arch
        }
        BuildMode::Sidecar => {
            if args.target.is_some() {
                ui::step_warn(&ctx, "--target is ignored in sidecar mode");
            }
            super::sidecar::compile(&ctx, config, &runner, host, args.force).await?;
            host.arch
        }
    };

    if args.no_package {
        ui::outro_success(&ctx, "Build finished (packaging skipped)");
        return Ok(());
    }
    if host.os != Os::MacOS {
        ui::step_info(&ctx, &format!("Disk images are built on macOS; skipping on {}", host.os.name()));
        ui::outro_success(&ctx, "Build finished");
        return Ok(());
    }

    super::package::assemble(&ctx, config, &runner, arch, false).await?;
    ui::outro_success(&ctx, "Build finished");
    Ok(())
}
