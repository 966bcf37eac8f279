// nnm/src/ui/output_format.rs
//! Colored status messages and the end-of-run summary, written to stderr.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::io::Write;

use nnm_core::CountLedger;

pub fn print_info_message<W: Write>(writer: &mut W, message: &str, supports_color: bool) -> Result<()> {
    if supports_color {
        writeln!(writer, "{}", message.cyan())?;
    } else {
        writeln!(writer, "{}", message)?;
    }
    Ok(())
}

pub fn print_warn_message<W: Write>(writer: &mut W, message: &str, supports_color: bool) -> Result<()> {
    if supports_color {
        writeln!(writer, "{} {}", "Warning:".yellow().bold(), message.yellow())?;
    } else {
        writeln!(writer, "Warning: {}", message)?;
    }
    Ok(())
}

pub fn print_error_message<W: Write>(writer: &mut W, message: &str, supports_color: bool) -> Result<()> {
    if supports_color {
        writeln!(writer, "{} {}", "Error:".red().bold(), message.red())?;
    } else {
        writeln!(writer, "Error: {}", message)?;
    }
    Ok(())
}

/// Prints the page and running totals kept by the ledger.
pub fn print_summary<W: Write>(writer: &mut W, ledger: &CountLedger, supports_color: bool) -> Result<()> {
    if supports_color {
        writeln!(writer, "{}", "Redaction Summary:".bold().underline())?;
        writeln!(writer, "  {} {}", "Page:".magenta(), ledger.page.to_string().green().bold())?;
        writeln!(writer, "  {} {}", "Total:".magenta(), ledger.total.to_string().green().bold())?;
    } else {
        writeln!(writer, "Redaction Summary:")?;
        writeln!(writer, "  Page: {}", ledger.page)?;
        writeln!(writer, "  Total: {}", ledger.total)?;
    }
    Ok(())
}
