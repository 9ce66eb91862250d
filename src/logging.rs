//! Logging backends
//!
//! The core logs through the `log` facade; the entry point picks and owns
//! the backend. Default is a timestamped console logger on stderr. With
//! --uls the events go to macOS Unified Logging instead, under the
//! application subsystem.

use anyhow::Result;
use log::{Level, LevelFilter, Metadata, Record};

/// Stderr logger: `timestamp - LEVEL - message`
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Install the process-wide logging backend. Called once by the entry point.
pub fn init(use_uls: bool) -> Result<()> {
    if use_uls {
        return init_uls();
    }

    log::set_boxed_logger(Box::new(ConsoleLogger))
        .map_err(|e| anyhow::anyhow!("failed to set logger: {e}"))?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}

#[cfg(target_os = "macos")]
fn init_uls() -> Result<()> {
    let logger = oslog::OsLogger::new(crate::constants::APP_SUBSYSTEM);
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| anyhow::anyhow!("failed to set logger: {e}"))?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn init_uls() -> Result<()> {
    Err(anyhow::anyhow!("Unified Logging is only available on macOS"))
}
