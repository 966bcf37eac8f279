// nnm/src/lib.rs
//! # nnm CLI Application
//!
//! Command-line host for the `nnm-core` engine. It stands in for the browser
//! side of the system: it loads a page, supplies the settings snapshot, feeds
//! late content and style changes to the page agent, and collects the count
//! notifications the agent sends out.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;

pub use commands::redact::{redact_page, run_redact, RedactOptions, RedactOutcome, SettingsOverrides};
