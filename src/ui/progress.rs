//! Spinner for long-running steps, with a plain-text CI fallback

use super::context::UiContext;
use console::style;

/// A spinner around one pipeline step.
///
/// Interactive terminals get a cliclack spinner; elsewhere the start and
/// stop messages are printed as plain lines.
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        self.finish(message, "[OK]", |s, m| s.stop(m), |m| style(m).green());
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        self.finish(message, "[FAIL]", |s, m| s.error(m), |m| style(m).red());
    }

    /// Stop with warning message
    pub fn stop_warn(&mut self, message: &str) {
        self.finish(message, "[WARN]", |s, m| s.stop(m), |m| style(m).yellow());
    }

    fn finish(
        &mut self,
        message: &str,
        tag: &'static str,
        stop: impl FnOnce(cliclack::ProgressBar, &str),
        paint: impl FnOnce(&'static str) -> console::StyledObject<&'static str>,
    ) {
        match self.spinner.take() {
            Some(spinner) => stop(spinner, message),
            None => println!("{} {}", paint(tag), message),
        }
    }
}

impl Drop for TaskSpinner {
    fn drop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.clear();
        }
    }
}
