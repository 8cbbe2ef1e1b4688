//! Runtime command - provision the Python runtime directory

use crate::cli::args::RuntimeArgs;
use crate::config::Config;
use crate::error::ShipwrightResult;
use crate::platform::Target;
use crate::process::SystemRunner;
use crate::runtime::{ProvisionOutcome, RuntimeProvisioner};
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the runtime command
pub async fn execute(args: RuntimeArgs, config: &Config) -> ShipwrightResult<()> {
    let ctx = UiContext::detect();
    let host = Target::host()?;
    let target = args.target.unwrap_or(host);
    let runner = SystemRunner::new();

    provision(&ctx, config, &runner, host, target, args.force).await?;
    Ok(())
}

/// Provision one target with spinner output; shared with `build`
pub(crate) async fn provision(
    ctx: &UiContext,
    config: &Config,
    runner: &SystemRunner,
    host: Target,
    target: Target,
    force: bool,
) -> ShipwrightResult<ProvisionOutcome> {
    let provisioner = RuntimeProvisioner::new(config, runner, host);
    let strategy = provisioner.strategy_for(target);

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!("Provisioning {} runtime ({})...", target, strategy));

    let outcome = match provisioner.provision(target, force).await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.stop_error(&format!("{} runtime failed", target));
            return Err(e);
        }
    };

    match &outcome.rebuilt {
        None => spinner.stop(&format!(
            "{} runtime up to date ({})",
            target,
            outcome.fingerprint.short()
        )),
        Some(reason) => spinner.stop(&format!("{} runtime built ({})", target, reason)),
    }

    report(ctx, &outcome);
    Ok(outcome)
}

fn report(ctx: &UiContext, outcome: &ProvisionOutcome) {
    ui::key_value(ctx, "Directory", &outcome.dir.display().to_string());
    if let Some(record) = &outcome.record {
        ui::key_value(ctx, "Python", &record.runtime_version);
    }
    if let Some(prune) = &outcome.prune {
        ui::key_value(
            ctx,
            "Pruned",
            &format!(
                "{} dirs, {} files, {}",
                prune.dirs_removed,
                prune.files_removed,
                format_bytes(prune.bytes_freed)
            ),
        );
    }
}

/// Human-readable byte count (`12.3 MB`)
pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }
}
