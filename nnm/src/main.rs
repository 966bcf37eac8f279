// nnm/src/main.rs
//! nnm entry point.
//!
//! Parses the command line, builds the settings snapshot and runs the redact command.
//! Failures are printed through the CLI's error formatter and exit non-zero.

use anyhow::Result;
use clap::Parser;
use log::debug;
use std::process::ExitCode;

use nnm::cli::Cli;
use nnm::commands::redact::{
    error_msg, load_injections, load_settings, read_input, run_redact, RedactOptions, SettingsOverrides,
};
use nnm::logger;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    logger::init_logger(logger::level_for(args.quiet, args.debug));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("nnm failed: {:?}", e);
            error_msg(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let overrides = SettingsOverrides {
        style: args.style,
        disabled: args.disabled,
        whitelisted: args.whitelisted,
    };
    let settings = load_settings(args.settings.as_deref(), overrides).await?;

    let opts = RedactOptions {
        input: read_input(&args.input)?,
        settings,
        injections: load_injections(&args.inject)?,
        restyle: args.restyle,
        output_path: args.output,
        report: args.report,
        quiet: args.quiet,
    };
    run_redact(opts).await
}
