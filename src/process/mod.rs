//! Subprocess execution
//!
//! Every external tool the pipeline drives (pip, PyInstaller, rustc,
//! codesign, hdiutil, xattr) goes through the [`CommandRunner`] trait so a
//! whole build can be exercised without the tools being installed.

mod runner;

#[cfg(test)]
pub(crate) mod fake;

pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};

/// Max number of output lines to include in error messages.
const OUTPUT_TAIL_LINES: usize = 50;

/// Extract the useful tail of a command's output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `OUTPUT_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub fn tail_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > OUTPUT_TAIL_LINES {
        lines[total - OUTPUT_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}
