// nnm/src/cli.rs
//! This file defines the command-line interface (CLI) for the nnm application.
//! License: MIT OR Apache-2.0

use clap::Parser;
use nnm_core::RedactStyle;
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "nnm",
    version = env!("CARGO_PKG_VERSION"),
    about = "Redact a fixed multilingual phrase list from an HTML page",
    long_about = "nnm loads an HTML page, finds every occurrence of its built-in phrase list in the rendered text (matches may span several text nodes), and wraps only the captured word in a styled element. The document title is redacted with a text placeholder. Late content can be injected to exercise the incremental watcher, and the style can be switched afterwards without a rescan.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// HTML file to redact, or `-` for stdin.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Settings snapshot (JSON with addonEnabled, whitelisted, redactClassName).
    #[arg(long, value_name = "FILE", help = "Read the settings snapshot from a JSON file.")]
    pub settings: Option<PathBuf>,

    /// Redaction style; overrides `redactClassName` from the settings.
    #[arg(long, value_name = "STYLE", env = "NNM_STYLE", help = "bordered, strike, block, line or hidden (or a class name).")]
    pub style: Option<RedactStyle>,

    /// Treat the add-on as switched off.
    #[arg(long, help = "Leave the page untouched, as if redaction were switched off.")]
    pub disabled: bool,

    /// Treat the site as whitelisted.
    #[arg(long, help = "Leave the page untouched, as if the site were whitelisted.")]
    pub whitelisted: bool,

    /// HTML fragments appended to the body after the initial scan, one batch per file.
    #[arg(long = "inject", value_name = "FILE", help = "Append the body of this HTML file after the initial scan (repeatable).")]
    pub inject: Vec<PathBuf>,

    /// Style to switch to once every injection has been processed.
    #[arg(long, value_name = "STYLE", help = "Switch to this style after all injections, without rescanning.")]
    pub restyle: Option<RedactStyle>,

    /// Write the redacted page to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Print every notification as a JSON line on stderr.
    #[arg(long, help = "Print notifications as JSON lines on stderr.")]
    pub report: bool,

    /// Disable informational messages
    #[arg(long, short = 'q', help = "Suppress the summary and all log messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', conflicts_with = "quiet", help = "Enable debug logging.")]
    pub debug: bool,
}
