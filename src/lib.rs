//! Shipwright - runtime provisioning and macOS packaging
//!
//! Prepares the self-contained Python runtime (or frozen sidecar) a
//! desktop app ships with, emulates `SetFile` over the FinderInfo
//! extended attribute, and assembles a signed disk image.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod finder;
pub mod fsutil;
pub mod logging;
pub mod package;
pub mod platform;
pub mod process;
pub mod runtime;
pub mod sidecar;
pub mod ui;
pub mod version;

pub use error::{ShipwrightError, ShipwrightResult};
