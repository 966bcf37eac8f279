// nnm-core/src/title.rs
//! Redaction of the document title.
//!
//! The title is a plain string, so its redaction replaces characters instead of
//! wrapping them. The pre-redaction original is cached before the first rewrite so
//! a later style change can start again from clean text.

use log::{debug, warn};

use crate::dom::Document;
use crate::engine::RedactionEngine;
use crate::style::RedactStyle;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleState {
    original: Option<String>,
}

impl TitleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached pre-redaction title, if one has been scanned.
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    /// Takes the document's current title as the new original and redacts it.
    /// Used on initial load and whenever the page itself changes the title.
    /// Returns the number of replacements.
    pub fn scan(&mut self, doc: &mut Document, engine: &dyn RedactionEngine, style: RedactStyle) -> usize {
        let Some(current) = doc.title() else {
            debug!("Document has no title element; nothing to redact.");
            return 0;
        };
        self.original = Some(current);
        self.rewrite(doc, engine, style)
    }

    /// Restores the cached original and redacts it again with `style`.
    pub fn restyle(&mut self, doc: &mut Document, engine: &dyn RedactionEngine, style: RedactStyle) -> usize {
        if self.original.is_none() {
            return 0;
        }
        self.rewrite(doc, engine, style)
    }

    fn rewrite(&self, doc: &mut Document, engine: &dyn RedactionEngine, style: RedactStyle) -> usize {
        let Some(original) = self.original.as_deref() else {
            return 0;
        };
        let redaction = engine.redact_title(original, style);
        if doc.title().as_deref() != Some(redaction.text.as_str()) {
            // Paused so the title observer does not see its own rewrite.
            if let Err(e) = doc.unobserved(|doc| doc.set_title(&redaction.text)) {
                warn!("Could not rewrite the document title: {}", e);
                return 0;
            }
        }
        redaction.count
    }
}
