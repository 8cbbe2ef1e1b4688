//! CLI command implementations

pub mod build;
pub mod cache;
pub mod completions;
pub mod config;
pub mod fingerprint;
pub mod package;
pub mod runtime;
pub mod sidecar;

pub use build::execute as build;
pub use cache::execute as cache;
pub use completions::execute as completions;
pub use config::execute as config;
pub use fingerprint::execute as fingerprint;
pub use package::execute as package;
pub use runtime::execute as runtime;
pub use sidecar::execute as sidecar;
