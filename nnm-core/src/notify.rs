// nnm-core/src/notify.rs
//! Outbound notifications to the coordinating collaborator.
//!
//! The wire shape follows the message protocol of the coordinator:
//! `{"action": "set_count", "data": {"count": 3, "mutation": false}}` after a scan
//! and `{"action": "set_icon"}` once when the site is whitelisted.

use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Matches found by one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountReport {
    pub count: usize,
    /// `false` for the initial scan, `true` for incremental batches.
    pub mutation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum Notification {
    #[serde(rename = "set_count")]
    Count(CountReport),
    #[serde(rename = "set_icon")]
    Whitelisted,
}

/// Receives notifications from a page agent.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!("Notification receiver dropped; discarding {:?}", notification);
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}

/// Per-page and running total counters, kept the way the coordinator keeps them:
/// an initial-scan report resets the page count, an incremental one adds to it,
/// and the total only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountLedger {
    pub page: usize,
    pub total: usize,
}

impl CountLedger {
    pub fn record(&mut self, report: &CountReport) {
        if report.mutation {
            self.page += report.count;
        } else {
            self.page = report.count;
        }
        self.total += report.count;
    }

    /// Clears the page count (the site was whitelisted).
    pub fn clear_page(&mut self) {
        self.page = 0;
    }

    pub fn observe(&mut self, notification: &Notification) {
        match notification {
            Notification::Count(report) => self.record(report),
            Notification::Whitelisted => self.clear_page(),
        }
    }
}
