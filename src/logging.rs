//! tracing-subscriber setup for both binaries

use crate::finder::EmulatorConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// CLI logging: 0 = warn (step output only), 1 = info, 2+ = debug.
///
/// `RUST_LOG` overrides the verbosity flag when set.
pub fn init_cli(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "shipwright=warn",
        1 => "shipwright=info",
        _ => "shipwright=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    // A second init (tests, embedding) is not an error
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.without_time().try_init()
    };
}

/// Emulator logging: append to the configured file, else stderr
pub fn init_setfile(config: &EmulatorConfig) {
    let level = if config.trace { "trace" } else { "info" };
    let filter = EnvFilter::new(format!("shipwright={level},SetFile={level}"));

    let writer = config
        .log_file
        .as_ref()
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok())
        .map(|file| BoxMakeWriter::new(Mutex::new(file)))
        .unwrap_or_else(|| BoxMakeWriter::new(std::io::stderr));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.log_file.is_none())
        .with_writer(writer)
        .try_init();
}
