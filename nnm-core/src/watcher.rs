// nnm-core/src/watcher.rs
//! Incremental updates: turns journaled mutations into batches and runs each
//! batch through the engine, restricted to the inserted subtrees.

use log::{debug, info};

use crate::dom::{Document, MutationRecord, NodeId};
use crate::engine::{ApplyReport, RedactionEngine};
use crate::settings::ScanContext;
use crate::title::TitleState;

/// One delivery of observed mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    /// Roots of inserted subtrees under `body`, in journal order.
    pub inserted: Vec<NodeId>,
    /// The page replaced the title text.
    pub title_changed: bool,
}

impl MutationBatch {
    /// Keeps insertions whose parent lies under `body`; everything else (the head,
    /// nodes detached again before delivery) is ignored.
    pub fn from_records(doc: &Document, records: &[MutationRecord]) -> Self {
        let mut batch = MutationBatch::default();
        let body = doc.body();
        for record in records {
            match *record {
                MutationRecord::ChildInserted { parent, node } => {
                    let under_body = body.is_some_and(|b| doc.contains(b, parent));
                    if under_body && doc.parent(node) == Some(parent) && !batch.inserted.contains(&node) {
                        batch.inserted.push(node);
                    }
                }
                MutationRecord::TitleChanged => batch.title_changed = true,
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && !self.title_changed
    }
}

/// Matches redacted by one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub body: ApplyReport,
    pub title: usize,
}

impl BatchOutcome {
    pub fn count(&self) -> usize {
        self.body.applied + self.title
    }
}

/// Processes one batch to completion.
pub fn process_batch(
    engine: &dyn RedactionEngine,
    doc: &mut Document,
    batch: &MutationBatch,
    ctx: &ScanContext,
    title: &mut TitleState,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    if batch.is_empty() {
        return outcome;
    }
    if !batch.inserted.is_empty() {
        debug!("Processing {} inserted subtree(s).", batch.inserted.len());
        outcome.body = engine.scan(doc, &batch.inserted, ctx);
    }
    if batch.title_changed {
        outcome.title = title.scan(doc, engine, ctx.style);
    }
    info!("Mutation batch redacted {} new match(es).", outcome.count());
    outcome
}

/// Drains the document's journal and processes it as one batch.
pub fn sync(
    engine: &dyn RedactionEngine,
    doc: &mut Document,
    ctx: &ScanContext,
    title: &mut TitleState,
) -> BatchOutcome {
    let records = doc.take_records();
    let batch = MutationBatch::from_records(doc, &records);
    process_batch(engine, doc, &batch, ctx, title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::phrase_engine::PhraseEngine;
    use crate::style::RedactStyle;

    #[test]
    fn test_batch_ignores_head_and_detached_nodes() {
        let mut doc = Document::parse_html("<title>t</title><p>x</p>");
        doc.observe();
        let head = doc.head().unwrap();
        let body = doc.body().unwrap();

        let meta = doc.create_element("meta");
        doc.append_child(head, meta).unwrap();
        let gone = doc.create_text("gone");
        doc.append_child(body, gone).unwrap();
        doc.detach(gone).unwrap();
        let kept = doc.create_text("kept");
        doc.append_child(body, kept).unwrap();
        doc.set_title("new").unwrap();

        let records = doc.take_records();
        let batch = MutationBatch::from_records(&doc, &records);
        assert_eq!(batch.inserted, vec![kept]);
        assert!(batch.title_changed);
    }

    #[test]
    fn test_sync_counts_only_new_matches() {
        let engine = PhraseEngine::new().unwrap();
        let ctx = ScanContext::new(RedactStyle::Block);
        let mut title = TitleState::new();
        let mut doc = Document::parse_html("<p>North Macedonia</p>");
        let body = doc.body().unwrap();
        engine.scan(&mut doc, &[body], &ctx);
        doc.observe();

        doc.append_html(body, "<div>Hello from North Macedonia</div>").unwrap();
        let outcome = sync(&engine, &mut doc, &ctx, &mut title);
        assert_eq!(outcome.count(), 1);
        assert_eq!(doc.elements_by_class(ctx.redact_class()).len(), 2);

        let again = sync(&engine, &mut doc, &ctx, &mut title);
        assert_eq!(again.count(), 0);
    }
}
