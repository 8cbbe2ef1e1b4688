//! UI module for consistent CLI output
//!
//! Uses `cliclack` for spinners, step lines and prompts with automatic
//! fallback to plain output in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use shipwright::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! ui::intro(&ctx, "Building Faculty Match");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Provisioning macos-aarch64 runtime (venv)...");
//! // ... do work ...
//! spinner.stop("macos-aarch64 runtime built (inputs changed)");
//!
//! ui::key_value(&ctx, "Directory", "src-tauri/resources/python/macos-aarch64");
//! ui::step_warn_hint(&ctx, "No app bundle", "Build the app first");
//!
//! ui::outro_success(&ctx, "Build finished");
//! ```

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, remark, step_info, step_ok,
    step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::TaskSpinner;
pub use prompts::confirm;
