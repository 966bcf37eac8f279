// nnm/src/commands/redact.rs
//! The redact command: plays host page and coordinator around one page agent.
//!
//! The page is parsed, the agent gets the settings snapshot and performs its
//! initial scan, each `--inject` file becomes one host mutation, and a final
//! `--restyle` becomes a style change. Notifications are collected into a
//! [`CountLedger`] for the summary.

use anyhow::{anyhow, Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use nnm_core::{
    ChannelNotifier, CountLedger, Document, FileSettings, Notification, PageAgent, PageEvent, PhraseEngine,
    RedactStyle, Settings, SettingsSource, StaticSettings, StyleChange,
};

use crate::ui::output_format;

/// Options for one run of the redact command.
#[derive(Debug, Clone, Default)]
pub struct RedactOptions {
    /// The page source.
    pub input: String,
    pub settings: Settings,
    /// `(label, html)` pairs appended to the body after the initial scan.
    pub injections: Vec<(String, String)>,
    pub restyle: Option<RedactStyle>,
    pub output_path: Option<PathBuf>,
    pub report: bool,
    pub quiet: bool,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RedactOutcome {
    pub html: String,
    pub ledger: CountLedger,
    pub notifications: Vec<Notification>,
}

/// Reads the page from a file, or from stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read page from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path.display()))
}

/// Command-line switches layered over the fetched settings snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub style: Option<RedactStyle>,
    pub disabled: bool,
    pub whitelisted: bool,
}

impl SettingsOverrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(style) = self.style {
            settings.redact_class_name = style.class_name().to_string();
        }
        if self.disabled {
            settings.addon_enabled = false;
        }
        if self.whitelisted {
            settings.whitelisted = true;
        }
    }
}

/// Fetches the snapshot from `path` (the defaults when none is given) and applies
/// the overrides. A file that is missing or names an unknown style is an error.
pub async fn load_settings(path: Option<&Path>, overrides: SettingsOverrides) -> Result<Settings> {
    let source: Box<dyn SettingsSource> = match path {
        Some(path) => Box::new(FileSettings::new(path)),
        None => Box::new(StaticSettings::default()),
    };
    let mut settings = source.fetch().await?;
    overrides.apply(&mut settings);
    debug!("Effective settings: {:?}", settings);
    Ok(settings)
}

/// Reads every injection file up front so a missing file fails before any work.
pub fn load_injections(paths: &[PathBuf]) -> Result<Vec<(String, String)>> {
    paths
        .iter()
        .map(|path| {
            let html = fs::read_to_string(path)
                .with_context(|| format!("Failed to read injection file: {}", path.display()))?;
            Ok((path.display().to_string(), html))
        })
        .collect()
}

fn inject_event(label: String, html: String) -> PageEvent {
    PageEvent::mutate(move |doc| match doc.body() {
        Some(body) => match doc.append_html(body, &html) {
            Ok(nodes) => debug!("Injected {} top-level node(s) from {}", nodes.len(), label),
            Err(e) => warn!("Could not inject {}: {}", label, e),
        },
        None => warn!("Document has no body; skipping injection of {}", label),
    })
}

/// Prints an error line to stderr, colored when stderr is a terminal.
pub fn error_msg(msg: impl AsRef<str>) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_error_message(&mut io::stderr(), msg.as_ref(), stderr_supports_color);
}

/// Runs the page agent over the page and returns the redacted markup.
pub async fn redact_page(opts: &RedactOptions) -> Result<RedactOutcome> {
    let engine = Arc::new(PhraseEngine::new().context("Failed to build the phrase patterns")?);
    let (notifier, mut notes) = ChannelNotifier::new();
    let agent = PageAgent::new(Document::parse_html(&opts.input), engine, Arc::new(notifier));

    let (tx, rx) = mpsc::channel(opts.injections.len() + 1);
    for (label, html) in &opts.injections {
        tx.send(inject_event(label.clone(), html.clone()))
            .await
            .map_err(|_| anyhow!("Page agent stopped before {} was injected", label))?;
    }
    if let Some(new_style) = opts.restyle {
        let old_style = opts.settings.style().unwrap_or_default();
        tx.send(PageEvent::StyleChanged(StyleChange::new(old_style, new_style)))
            .await
            .map_err(|_| anyhow!("Page agent stopped before the style change"))?;
    }
    drop(tx);

    let doc = agent.run(&StaticSettings(opts.settings.clone()), rx).await;

    let mut ledger = CountLedger::default();
    let mut notifications = Vec::new();
    while let Ok(notification) = notes.try_recv() {
        ledger.observe(&notification);
        notifications.push(notification);
    }
    Ok(RedactOutcome {
        html: doc.to_html(),
        ledger,
        notifications,
    })
}

/// The main operation runner for the nnm CLI.
pub async fn run_redact(opts: RedactOptions) -> Result<()> {
    info!("Starting nnm redaction.");
    let settings = &opts.settings;
    if settings.addon_enabled && !settings.whitelisted {
        settings.scan_context().context("Invalid settings")?;
    }

    let outcome = redact_page(&opts).await?;

    let mut stderr = io::stderr();
    let supports_color = stderr.is_terminal();
    if opts.report {
        for notification in &outcome.notifications {
            let line = serde_json::to_string(notification).context("Failed to serialize notification")?;
            writeln!(stderr, "{}", line)?;
        }
    }

    write_output(&opts, &outcome.html)?;

    if !opts.quiet {
        if !settings.addon_enabled {
            output_format::print_warn_message(&mut stderr, "Redaction is disabled; page left untouched.", supports_color)?;
        } else if settings.whitelisted {
            output_format::print_warn_message(&mut stderr, "Site is whitelisted; page left untouched.", supports_color)?;
        }
        output_format::print_summary(&mut stderr, &outcome.ledger, supports_color)?;
    }
    info!("nnm redaction completed.");
    Ok(())
}

fn write_output(opts: &RedactOptions, html: &str) -> Result<()> {
    match &opts.output_path {
        Some(path) => {
            if !opts.quiet {
                let msg = format!("Writing redacted page to file: {}", path.display());
                output_format::print_info_message(&mut io::stderr(), &msg, io::stderr().is_terminal())?;
            }
            fs::write(path, html).with_context(|| format!("Failed to write output file: {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", html).context("Failed to write redacted page to stdout")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redact_page_counts_injections_and_restyles() -> Result<()> {
        let opts = RedactOptions {
            input: "<title>Kuzey Makedonya</title><p>North Macedonia</p>".into(),
            injections: vec![
                ("one".into(), "<p>Nordmazedonien</p>".into()),
                ("two".into(), "<p>no match</p>".into()),
            ],
            restyle: Some(RedactStyle::Hidden),
            ..RedactOptions::default()
        };
        let outcome = redact_page(&opts).await?;
        assert_eq!(outcome.ledger, CountLedger { page: 3, total: 3 });
        assert_eq!(outcome.notifications.len(), 2);
        assert!(outcome.html.contains("<title> Makedonya</title>"));
        assert!(outcome.html.contains(r#"<span class="redacted-word-hidden">Nord</span>mazedonien"#));
        assert!(!outcome.html.contains("redacted-word-black"));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_settings_defaults_without_file() -> Result<()> {
        assert_eq!(load_settings(None, SettingsOverrides::default()).await?, Settings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_overrides_apply_after_fetch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"addonEnabled": true, "redactClassName": "strike"}"#)?;

        let overrides = SettingsOverrides { style: Some(RedactStyle::Line), whitelisted: true, ..Default::default() };
        let settings = load_settings(Some(path.as_path()), overrides).await?;
        assert_eq!(settings.redact_class_name, "redacted-word-line");
        assert!(settings.whitelisted);
        assert!(settings.addon_enabled);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_settings_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_settings(Some(dir.path().join("missing.json").as_path()), SettingsOverrides::default()).await;
        assert!(format!("{:#}", missing.unwrap_err()).contains("Failed to read settings file"));

        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"redactClassName": "glitter"}"#).unwrap();
        let overrides = SettingsOverrides { style: Some(RedactStyle::Block), ..Default::default() };
        let bad = load_settings(Some(path.as_path()), overrides).await;
        assert!(format!("{:#}", bad.unwrap_err()).contains("Unknown redaction style 'glitter'"));
    }
}
