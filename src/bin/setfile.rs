//! SetFile - Finder metadata emulator
//!
//! Stands in for Apple's `SetFile` on machines without the developer tools.

use shipwright::finder::setfile::{self, SetFileArgs};
use shipwright::finder::{CommandXattr, EmulatorConfig, FinderAttributes};
use shipwright::process::SystemRunner;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = EmulatorConfig::from_env();
    shipwright::logging::init_setfile(&config);
    debug!("SetFile invoked with {:?}", std::env::args_os().collect::<Vec<_>>());

    let result = match SetFileArgs::parse(std::env::args_os().skip(1)) {
        Ok(args) => {
            let runner = Arc::new(SystemRunner::new());
            let backend = Arc::new(CommandXattr::new(config.xattr_program.clone(), runner));
            setfile::run(&args, &config, &FinderAttributes::new(backend)).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            debug!("SetFile done: {:?}", summary);
            ExitCode::SUCCESS
        }
        Err(e) if e.is_soft() => {
            warn!("{}", e);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("SetFile: {}", e);
            ExitCode::FAILURE
        }
    }
}
