// nnm/src/logger.rs
//! Logger setup for the nnm binary.
//!
//! `RUST_LOG` is honored unless an explicit level is passed in; without either,
//! only warnings and errors are shown. Log lines go to stderr, so they never mix
//! with the redacted page on stdout.

use env_logger::{Builder, Env};
use log::LevelFilter;

pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).format_target(true);
    // A second initialization (tests, embedding) is not an error.
    let _ = builder.try_init();
}

/// Maps the `--quiet` and `--debug` flags onto a level override.
pub fn level_for(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}
