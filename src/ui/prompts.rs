//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{ShipwrightError, ShipwrightResult};

/// Prompt for confirmation, returns default if non-interactive or auto-yes
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> ShipwrightResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| ShipwrightError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| ShipwrightError::User(format!("Prompt failed: {}", e)))
}
