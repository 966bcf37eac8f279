// nnm-core/src/lib.rs
//! # nnm Core Library
//!
//! `nnm-core` finds a fixed, multilingual list of phrases in the text of an HTML
//! document and redacts only the captured part of each match, in place, by
//! wrapping it in a styled element. Matches may span several text nodes.
//!
//! The engine works on a linearized view of the page: eligible text leaves are
//! concatenated into one string, the phrase patterns run over that string, and
//! every hit is mapped back onto `(node, offset)` coordinates before the tree is
//! touched. Reading and writing are separate passes.
//!
//! ## Modules
//!
//! * `dom`: Arena document model with stable node ids and a mutation journal.
//! * `config`: Phrase rules and the embedded rule list.
//! * `compiler`: Compiles and caches the phrase patterns.
//! * `linearizer`: Flattens eligible text leaves into one addressable string.
//! * `engine`: The `RedactionEngine` trait with its plan and report types.
//! * `engines`: Concrete engines (`PhraseEngine`).
//! * `redact`: The write pass that splits text leaves and inserts wrappers.
//! * `style`: Redaction styles and relabeling on style change.
//! * `title`: Destructive redaction of the title string.
//! * `settings`: Settings snapshot, scan context and settings sources.
//! * `watcher`: Batches journaled insertions for incremental scans.
//! * `notify`: Outbound notifications and count bookkeeping.
//! * `agent`: The page agent tying everything to its collaborators.
//! * `headless`: One-shot redaction of an HTML string.
//!
//! ## Usage Example
//!
//! ```rust
//! use nnm_core::{headless_redact_html, RedactStyle};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let out = headless_redact_html("<p>North Macedonia</p>", RedactStyle::Block)?;
//!     assert_eq!(out.count, 1);
//!     assert!(out.html.contains(r#"<span class="redacted-word-black">North</span> Macedonia"#));
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Document primitives return [`DomError`]; everything else surfaces as
//! [`NnmError`] or `anyhow::Error` with context. A range that no longer fits the
//! live tree is skipped and logged rather than failing the scan.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod agent;
pub mod compiler;
pub mod config;
pub mod dom;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod linearizer;
pub mod notify;
pub mod redact;
pub mod redaction_match;
pub mod settings;
pub mod style;
pub mod title;
pub mod watcher;

pub use agent::{AgentStatus, HostScript, PageAgent, PageEvent};
pub use compiler::{compile_rules, default_patterns, get_or_compile_patterns, CompiledPattern, PhrasePatterns};
pub use config::{validate_rules, PhraseConfig, PhraseRule, MAX_PATTERN_LENGTH};
pub use dom::{Document, DomError, MutationRecord, NodeData, NodeId};
pub use engine::{ApplyReport, RedactionEngine, RedactionPlan, TitleRedaction};
pub use engines::phrase_engine::PhraseEngine;
pub use errors::NnmError;
pub use headless::{headless_redact_html, redact_document, HeadlessOutput};
pub use linearizer::{linearize, linearize_roots, LinearIndex};
pub use notify::{ChannelNotifier, CountLedger, CountReport, Notification, Notifier, RecordingNotifier};
pub use redact::{apply_plan, apply_redaction, RedactTarget};
pub use redaction_match::MatchRange;
pub use settings::{FileSettings, ScanContext, Settings, SettingsSource, StaticSettings};
pub use style::{relabel, RedactStyle, StyleChange};
pub use title::TitleState;
pub use watcher::{process_batch, MutationBatch};
