// nnm-core/src/engine.rs
//! Defines the `RedactionEngine` trait and the plan/report types it works with.
//!
//! Redaction is split into two phases. `plan` is a pure read pass: it
//! linearizes the requested subtrees and computes every match range against
//! that one snapshot. `apply` is the single write pass that mutates the tree,
//! walking the ranges from last to first so that splitting a later range never
//! moves the nodes or offsets of an earlier one.
//!
//! License: MIT OR Apache-2.0

use crate::compiler::PhrasePatterns;
use crate::dom::{Document, NodeId};
use crate::linearizer::LinearIndex;
use crate::redaction_match::MatchRange;
use crate::settings::ScanContext;
use crate::style::RedactStyle;

/// The result of the read pass: a snapshot index and the ranges found in it,
/// in ascending document order.
#[derive(Debug, Clone, Default)]
pub struct RedactionPlan {
    pub index: LinearIndex,
    pub ranges: Vec<MatchRange>,
}

impl RedactionPlan {
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// The document node behind a node index of a range.
    pub fn node(&self, i: usize) -> Option<NodeId> {
        self.index.nodes.get(i).copied()
    }
}

/// Outcome of the write pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Ranges that were redacted.
    pub applied: usize,
    /// Ranges dropped because the tree no longer matched the snapshot.
    pub skipped: usize,
    /// Wrapper elements created or restyled.
    pub wrappers: usize,
}

/// A redacted title and how many subspans were replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRedaction {
    pub text: String,
    pub count: usize,
}

/// A pluggable match-and-redact engine.
pub trait RedactionEngine: Send + Sync {
    /// Computes the ranges to redact under `roots` without touching the tree.
    /// Roots that are adjacent siblings are searched as one stream; text from
    /// separated roots never forms a match together.
    fn plan(&self, doc: &Document, roots: &[NodeId], ctx: &ScanContext) -> RedactionPlan;

    /// Applies a plan computed against the current state of `doc`.
    fn apply(&self, doc: &mut Document, plan: &RedactionPlan, ctx: &ScanContext) -> ApplyReport;

    /// Redacts a plain string (the document title) with the given style.
    fn redact_title(&self, title: &str, style: RedactStyle) -> TitleRedaction;

    /// The compiled phrase list this engine searches for.
    fn patterns(&self) -> &PhrasePatterns;

    /// Plans and applies in one call.
    fn scan(&self, doc: &mut Document, roots: &[NodeId], ctx: &ScanContext) -> ApplyReport {
        let plan = self.plan(doc, roots, ctx);
        if plan.is_empty() {
            return ApplyReport::default();
        }
        self.apply(doc, &plan, ctx)
    }
}
