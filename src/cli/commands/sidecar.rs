//! Sidecar command - freeze the helper script into a native executable

use crate::cli::args::SidecarArgs;
use crate::config::Config;
use crate::error::ShipwrightResult;
use crate::platform::Target;
use crate::process::SystemRunner;
use crate::sidecar::{SidecarCompiler, SidecarOutcome};
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the sidecar command
pub async fn execute(args: SidecarArgs, config: &Config) -> ShipwrightResult<()> {
    let ctx = UiContext::detect();
    let runner = SystemRunner::new();
    compile(&ctx, config, &runner, Target::host()?, args.force).await?;
    Ok(())
}

/// Compile with spinner output; shared with `build`
pub(crate) async fn compile(
    ctx: &UiContext,
    config: &Config,
    runner: &SystemRunner,
    host: Target,
    force: bool,
) -> ShipwrightResult<SidecarOutcome> {
    let compiler = SidecarCompiler::new(config, runner, host);

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!("Freezing {}...", config.sidecar.name));

    let outcome = match compiler.compile(force).await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.stop_error("Sidecar build failed");
            return Err(e);
        }
    };

    match &outcome.rebuilt {
        None => spinner.stop(&format!("Sidecar up to date ({})", outcome.triple)),
        Some(reason) => spinner.stop(&format!("Sidecar built for {} ({})", outcome.triple, reason)),
    }
    ui::key_value(ctx, "Binary", &outcome.binary.display().to_string());
    Ok(outcome)
}
