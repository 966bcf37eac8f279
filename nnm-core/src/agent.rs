// nnm-core/src/agent.rs
//! The page agent: owns one document and wires the engine to the settings and
//! notification collaborators.
//!
//! Lifecycle: settings are fetched once, the gates are checked, the body and
//! title get an initial scan and observation starts. From then on every
//! [`PageEvent`] is processed to completion before the next one is received.
//!
//! License: MIT OR Apache-2.0

use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::dom::Document;
use crate::engine::RedactionEngine;
use crate::errors::NnmError;
use crate::notify::{CountReport, Notification, Notifier};
use crate::settings::{ScanContext, Settings, SettingsSource};
use crate::style::{relabel, StyleChange};
use crate::title::TitleState;
use crate::watcher;

/// Code the host page runs against its own document.
pub type HostScript = Box<dyn FnOnce(&mut Document) + Send>;

/// Something that happens to the page after load.
pub enum PageEvent {
    /// The host mutates the document. The journal records it leaves form one batch.
    Mutate(HostScript),
    /// The user picked another redaction style.
    StyleChanged(StyleChange),
}

impl PageEvent {
    pub fn mutate(script: impl FnOnce(&mut Document) + Send + 'static) -> Self {
        PageEvent::Mutate(Box::new(script))
    }
}

impl fmt::Debug for PageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEvent::Mutate(_) => f.write_str("Mutate(..)"),
            PageEvent::StyleChanged(change) => f.debug_tuple("StyleChanged").field(change).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    /// Settings have not been applied yet.
    Pending,
    /// The add-on is switched off.
    Disabled,
    /// The site is on the exception list.
    Whitelisted,
    /// Scanning and observing.
    Active,
    /// Settings could not be fetched or were invalid. Nothing is redacted.
    Failed,
}

pub struct PageAgent {
    doc: Document,
    engine: Arc<dyn RedactionEngine>,
    notifier: Arc<dyn Notifier>,
    ctx: Option<ScanContext>,
    title: TitleState,
    status: AgentStatus,
}

impl PageAgent {
    pub fn new(doc: Document, engine: Arc<dyn RedactionEngine>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            doc,
            engine,
            notifier,
            ctx: None,
            title: TitleState::new(),
            status: AgentStatus::Pending,
        }
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// The active scan context, once the agent is active.
    pub fn context(&self) -> Option<ScanContext> {
        self.ctx
    }

    pub fn title_state(&self) -> &TitleState {
        &self.title
    }

    /// Applies a settings snapshot. Calling it again after the agent has left
    /// `Pending` has no effect.
    pub fn start(&mut self, settings: &Settings) -> AgentStatus {
        if self.status != AgentStatus::Pending {
            debug!("Agent already started ({:?}); ignoring settings.", self.status);
            return self.status;
        }
        if !settings.addon_enabled {
            info!("Redaction is disabled; leaving the page untouched.");
            self.status = AgentStatus::Disabled;
            return self.status;
        }
        if settings.whitelisted {
            info!("Site is whitelisted; leaving the page untouched.");
            self.notifier.notify(Notification::Whitelisted);
            self.status = AgentStatus::Whitelisted;
            return self.status;
        }
        let ctx = match settings.scan_context() {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("Invalid settings snapshot, nothing will be redacted: {}", e);
                self.status = AgentStatus::Failed;
                return self.status;
            }
        };

        let body = match self.doc.body() {
            Some(body) => self.engine.scan(&mut self.doc, &[body], &ctx).applied,
            None => {
                debug!("Document has no body.");
                0
            }
        };
        let title = self.title.scan(&mut self.doc, self.engine.as_ref(), ctx.style);
        let count = body + title;
        info!("Initial scan redacted {} match(es) ({} in the title).", count, title);
        self.notifier.notify(Notification::Count(CountReport { count, mutation: false }));

        self.ctx = Some(ctx);
        self.doc.observe();
        self.status = AgentStatus::Active;
        self.status
    }

    /// Marks the agent as failed without scanning.
    pub fn fail(&mut self, reason: impl fmt::Display) {
        error!("Page agent cannot start, nothing will be redacted: {}", reason);
        self.status = AgentStatus::Failed;
    }

    /// Processes one event. Returns the number of new matches it redacted.
    pub fn handle(&mut self, event: PageEvent) -> usize {
        match event {
            PageEvent::Mutate(script) => {
                script(&mut self.doc);
                self.process_records()
            }
            PageEvent::StyleChanged(change) => {
                self.change_style(&change);
                0
            }
        }
    }

    /// Drains pending journal records as one batch and reports a non-zero count.
    pub fn process_records(&mut self) -> usize {
        let Some(ctx) = self.ctx else {
            return 0;
        };
        let outcome = watcher::sync(self.engine.as_ref(), &mut self.doc, &ctx, &mut self.title);
        let count = outcome.count();
        if count > 0 {
            self.notifier.notify(Notification::Count(CountReport { count, mutation: true }));
        }
        count
    }

    fn change_style(&mut self, change: &StyleChange) {
        let Some(ctx) = self.ctx.as_mut() else {
            debug!("Ignoring style change while {:?}.", self.status);
            return;
        };
        let (old, new) = match change.parse() {
            Ok(styles) => styles,
            Err(e) => {
                warn!("Ignoring style change: {}", e);
                return;
            }
        };
        relabel(&mut self.doc, old.class_name(), new.class_name());
        if ctx.style != old && ctx.style != new {
            // The request named a stale old style; spans still carry the active one.
            relabel(&mut self.doc, ctx.style.class_name(), new.class_name());
        }
        ctx.style = new;
        self.title.restyle(&mut self.doc, self.engine.as_ref(), new);
    }

    /// Fetches settings, starts and then processes events until the channel closes.
    /// Observation stops when the agent returns the document.
    pub async fn run(mut self, source: &dyn SettingsSource, mut events: mpsc::Receiver<PageEvent>) -> Document {
        match source.fetch().await {
            Ok(settings) => {
                self.start(&settings);
            }
            Err(e) => self.fail(NnmError::SettingsUnavailable(format!("{:#}", e))),
        }
        while let Some(event) = events.recv().await {
            debug!("Page event: {:?}", event);
            self.handle(event);
        }
        debug!("Event channel closed; agent finished as {:?}.", self.status);
        self.doc.disconnect();
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::phrase_engine::PhraseEngine;
    use crate::notify::RecordingNotifier;
    use crate::style::RedactStyle;

    fn agent(html: &str) -> (PageAgent, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = Arc::new(PhraseEngine::new().unwrap());
        (PageAgent::new(Document::parse_html(html), engine, notifier.clone()), notifier)
    }

    fn count(count: usize, mutation: bool) -> Notification {
        Notification::Count(CountReport { count, mutation })
    }

    #[test]
    fn test_initial_scan_reports_even_zero() {
        let (mut agent, notifier) = agent("<p>Macedonia</p>");
        assert_eq!(agent.start(&Settings::default()), AgentStatus::Active);
        assert_eq!(notifier.notifications(), vec![count(0, false)]);
        assert!(agent.document().is_observing());
    }

    #[test]
    fn test_gates() {
        let (mut off, notifier) = agent("<p>North Macedonia</p>");
        let settings = Settings { addon_enabled: false, ..Settings::default() };
        assert_eq!(off.start(&settings), AgentStatus::Disabled);
        assert!(notifier.notifications().is_empty());

        let (mut listed, notifier) = agent("<p>North Macedonia</p>");
        let settings = Settings { whitelisted: true, ..Settings::default() };
        assert_eq!(listed.start(&settings), AgentStatus::Whitelisted);
        assert_eq!(notifier.notifications(), vec![Notification::Whitelisted]);
        assert!(listed.document().elements_by_class("redacted-word-black").is_empty());

        let (mut broken, notifier) = agent("<p>North Macedonia</p>");
        let settings = Settings { redact_class_name: "glitter".into(), ..Settings::default() };
        assert_eq!(broken.start(&settings), AgentStatus::Failed);
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn test_mutation_only_reported_when_non_zero() {
        let (mut agent, notifier) = agent("<p>North Macedonia</p>");
        agent.start(&Settings::default());
        let quiet = agent.handle(PageEvent::mutate(|doc| {
            let body = doc.body().unwrap();
            doc.append_html(body, "<p>nothing here</p>").unwrap();
        }));
        assert_eq!(quiet, 0);
        let found = agent.handle(PageEvent::mutate(|doc| {
            let body = doc.body().unwrap();
            doc.append_html(body, "<p>Kuzey Makedonya</p>").unwrap();
        }));
        assert_eq!(found, 1);
        assert_eq!(notifier.notifications(), vec![count(1, false), count(1, true)]);
    }

    #[test]
    fn test_style_change_relabels_and_becomes_active() {
        let (mut agent, _) = agent("<title>North Macedonia</title><p>North Macedonia</p>");
        agent.start(&Settings::default());
        agent.handle(PageEvent::StyleChanged(StyleChange::new(RedactStyle::Block, RedactStyle::Strike)));
        assert_eq!(agent.context(), Some(ScanContext::new(RedactStyle::Strike)));
        assert_eq!(agent.document().elements_by_class("redacted-word-strike").len(), 1);
        assert_eq!(agent.document().title().as_deref(), Some("N\u{336}o\u{336}r\u{336}t\u{336}h\u{336} Macedonia"));

        agent.handle(PageEvent::mutate(|doc| {
            let body = doc.body().unwrap();
            doc.append_html(body, "<p>North Macedonia</p>").unwrap();
        }));
        assert_eq!(agent.document().elements_by_class("redacted-word-strike").len(), 2);
        assert!(agent.document().elements_by_class("redacted-word-black").is_empty());
    }
}
