//! Interactive vs CI detection

use std::io::IsTerminal;

/// Environment variables whose presence marks a CI runner
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// Decides whether output may use spinners and prompts
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    /// `--yes`: prompts resolve to "yes" without asking
    auto_yes: bool,
}

impl UiContext {
    /// Interactive only with a TTY on both ends outside CI
    pub fn detect() -> Self {
        let tty = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();
        Self {
            interactive: tty && !running_in_ci(|var| std::env::var_os(var).is_some()),
            auto_yes: false,
        }
    }

    /// Plain output, prompts take their defaults
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Spinners and colored cliclack lines
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}

fn running_in_ci(is_set: impl Fn(&str) -> bool) -> bool {
    CI_VARS.iter().any(|var| is_set(var))
}
