// nnm-core/src/headless.rs
//! `headless.rs`
//! One-shot redaction of an HTML string, without an agent, observation or
//! notifications.

use anyhow::Result;

use crate::dom::Document;
use crate::engine::RedactionEngine;
use crate::engines::phrase_engine::PhraseEngine;
use crate::settings::ScanContext;
use crate::style::RedactStyle;
use crate::title::TitleState;

/// Redacted markup and how many matches went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessOutput {
    pub html: String,
    pub count: usize,
}

/// Parses `source`, redacts its body and title with `style` and serializes the result.
pub fn headless_redact_html(source: &str, style: RedactStyle) -> Result<HeadlessOutput> {
    let engine = PhraseEngine::new()?;
    let mut doc = Document::parse_html(source);
    let count = redact_document(&engine, &mut doc, style);
    Ok(HeadlessOutput {
        html: doc.to_html(),
        count,
    })
}

/// Runs a full body and title scan over an already parsed document.
pub fn redact_document(engine: &dyn RedactionEngine, doc: &mut Document, style: RedactStyle) -> usize {
    let ctx = ScanContext::new(style);
    let body = match doc.body() {
        Some(body) => engine.scan(doc, &[body], &ctx).applied,
        None => 0,
    };
    body + TitleState::new().scan(doc, engine, style)
}
