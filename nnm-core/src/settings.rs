// nnm-core/src/settings.rs
//! The settings snapshot handed to a page by the settings collaborator, and the
//! scan context derived from it.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::NnmError;
use crate::style::RedactStyle;

/// Settings snapshot: `{ addonEnabled, whitelisted, redactClassName }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub addon_enabled: bool,
    /// The current site is on the user's exception list.
    pub whitelisted: bool,
    /// Style identifier or class name of the active redaction style.
    pub redact_class_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addon_enabled: true,
            whitelisted: false,
            redact_class_name: RedactStyle::default().class_name().to_string(),
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text).context("Failed to parse settings snapshot")?;
        settings.scan_context()?;
        Ok(settings)
    }

    pub fn style(&self) -> Result<RedactStyle, NnmError> {
        self.redact_class_name.parse()
    }

    /// Validates the snapshot and builds the context threaded into every scan.
    pub fn scan_context(&self) -> Result<ScanContext, NnmError> {
        Ok(ScanContext::new(self.style()?))
    }
}

/// Everything a scan needs to know about the user's choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanContext {
    pub style: RedactStyle,
}

impl ScanContext {
    pub fn new(style: RedactStyle) -> Self {
        Self { style }
    }

    /// Class carried by wrapper elements; text under it is never rescanned.
    pub fn redact_class(&self) -> &'static str {
        self.style.class_name()
    }
}

/// Where a page gets its settings from.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn fetch(&self) -> Result<Settings>;
}

/// A fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub Settings);

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn fetch(&self) -> Result<Settings> {
        Ok(self.0.clone())
    }
}

/// A snapshot read from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileSettings {
    pub path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsSource for FileSettings {
    async fn fetch(&self) -> Result<Settings> {
        debug!("Reading settings snapshot from {}", self.path.display());
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read settings file {}", self.path.display()))?;
        Settings::from_json(&text)
            .with_context(|| format!("Invalid settings file {}", self.path.display()))
    }
}
