//! Package command - sign the bundle and create the disk image

use crate::cli::args::PackageArgs;
use crate::config::Config;
use crate::error::ShipwrightResult;
use crate::package::{PackageAssembler, PackageOutcome, ShortcutKind};
use crate::platform::{Arch, Target};
use crate::process::SystemRunner;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the package command
pub async fn execute(args: PackageArgs, config: &Config) -> ShipwrightResult<()> {
    let ctx = UiContext::detect();
    let arch = match args.arch {
        Some(arch) => arch,
        None => Target::host()?.arch,
    };
    let runner = SystemRunner::new();
    assemble(&ctx, config, &runner, arch, args.skip_sign).await?;
    Ok(())
}

/// Assemble with step output; shared with `build`
pub(crate) async fn assemble(
    ctx: &UiContext,
    config: &Config,
    runner: &SystemRunner,
    arch: Arch,
    skip_sign: bool,
) -> ShipwrightResult<PackageOutcome> {
    let mut assembler = PackageAssembler::new(&config.package, runner, arch);
    if skip_sign {
        assembler = assembler.with_identity(None);
    }

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!("Packaging {}...", config.package.product_name));

    let outcome = match assembler.assemble().await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.stop_error("Disk image creation failed");
            return Err(e);
        }
    };

    match &outcome {
        PackageOutcome::Skipped { bundle } => {
            spinner.stop_warn("Packaging skipped");
            ui::step_warn_hint(
                ctx,
                &format!("No app bundle at {}", bundle.display()),
                "Build the app first",
            );
        }
        PackageOutcome::Created {
            dmg,
            signed,
            shortcut,
            volume_icon,
        } => {
            spinner.stop("Disk image created");
            ui::key_value(ctx, "Image", &dmg.display().to_string());
            ui::key_value_status(ctx, "Signed", if *signed { "yes" } else { "no" }, *signed);
            let shortcut = match shortcut {
                ShortcutKind::FinderAlias => "Finder alias",
                ShortcutKind::Symlink => "symlink",
            };
            ui::key_value(ctx, "Applications", shortcut);
            if config.package.volume_icon.is_some() {
                ui::key_value_status(
                    ctx,
                    "Volume icon",
                    if *volume_icon { "set" } else { "not set" },
                    *volume_icon,
                );
            }
        }
    }
    Ok(outcome)
}
