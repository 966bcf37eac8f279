// nnm-core/src/redaction_match.rs
//! Match ranges produced by the search pass, plus debug-log helpers that keep
//! matched page text out of the logs unless explicitly allowed.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Whether matched page text may appear verbatim in debug logs.
    static ref TEXT_DEBUG_ALLOWED: bool = {
        std::env::var("NNM_ALLOW_DEBUG_TEXT")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// One match, mapped onto the text nodes of a [`LinearIndex`](crate::linearizer::LinearIndex).
///
/// `start_node`/`end_node` are indices into the index's node list. `start_offset`
/// is a byte offset within the start node and `end_offset` one within the end node;
/// both are valid against the snapshot the range was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRange {
    pub pattern: String,
    pub start_node: usize,
    pub end_node: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Absolute span of the redacted subspan in the concatenated text.
    pub abs_start: usize,
    pub abs_end: usize,
    /// The whole regex match.
    pub matched_text: String,
    /// The capture subspan that gets redacted.
    pub redacted_text: String,
}

impl MatchRange {
    pub fn is_single_node(&self) -> bool {
        self.start_node == self.end_node
    }

    /// Whether two ranges share any byte of the concatenated text.
    pub fn overlaps(&self, other: &MatchRange) -> bool {
        self.abs_start < other.abs_end && other.abs_start < self.abs_end
    }
}

pub fn mask_text(s: &str) -> String {
    const MAX_LEN: usize = 8;
    let chars = s.chars().count();
    if chars <= MAX_LEN {
        "[MASKED]".to_string()
    } else {
        format!("[MASKED: {} chars]", chars)
    }
}

fn loggable(text: &str) -> String {
    if *TEXT_DEBUG_ALLOWED {
        text.to_string()
    } else {
        mask_text(text)
    }
}

pub fn log_match_debug(module_path: &str, range: &MatchRange) {
    debug!(
        "{} Found MatchRange: pattern='{}', nodes={}..={}, offsets={}..{}, match='{}', redacted='{}'",
        module_path,
        range.pattern,
        range.start_node,
        range.end_node,
        range.start_offset,
        range.end_offset,
        loggable(&range.matched_text),
        loggable(&range.redacted_text),
    );
}

/// Some title placeholders keep the matched word, so both titles are masked.
pub fn log_title_debug(module_path: &str, original: &str, redacted: &str, count: usize) {
    debug!("{} {}", module_path, title_debug_message(original, redacted, count));
}

fn title_debug_message(original: &str, redacted: &str, count: usize) -> String {
    format!(
        "Title redaction: {} replacement(s), original='{}', redacted='{}'",
        count,
        loggable(original),
        loggable(redacted)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_short_text() {
        assert_eq!(mask_text("north"), "[MASKED]");
    }

    #[test]
    fn test_mask_counts_chars_not_bytes() {
        assert_eq!(mask_text("северна македонија"), "[MASKED: 18 chars]");
    }

    #[test]
    fn test_title_message_masks_both_titles() {
        if *TEXT_DEBUG_ALLOWED {
            return;
        }
        let message = title_debug_message("North Macedonia", "[[North]] Macedonia", 1);
        assert!(!message.contains("North"));
        assert_eq!(
            message,
            "Title redaction: 1 replacement(s), original='[MASKED: 15 chars]', redacted='[MASKED: 19 chars]'"
        );
    }
}
