//! Logger selection for the `updctl` binary.
//!
//! `watch` owns the terminal, so it logs to `./updctl.log`. One-shot
//! commands log warnings and errors to the terminal.

use std::path::Path;

use engine_logging::LogDestination;
use log::LevelFilter;

use crate::cli::{Command, GlobalArgs, LogTarget};

pub(crate) const LOG_FILE: &str = "./updctl.log";

pub(crate) fn initialize(global: &GlobalArgs, command: &Command) {
    let (destination, level) = select(global, command);
    engine_logging::initialize(destination, level, Path::new(LOG_FILE));
}

fn select(global: &GlobalArgs, command: &Command) -> (LogDestination, LevelFilter) {
    let (default_destination, default_level) = if command.is_interactive() {
        (LogDestination::File, LevelFilter::Info)
    } else {
        (LogDestination::Terminal, LevelFilter::Warn)
    };
    let destination = match global.log {
        Some(LogTarget::File) => LogDestination::File,
        Some(LogTarget::Terminal) => LogDestination::Terminal,
        Some(LogTarget::Both) => LogDestination::Both,
        Some(LogTarget::Off) => LogDestination::Off,
        None => default_destination,
    };
    (destination, global.log_level.unwrap_or(default_level))
}
