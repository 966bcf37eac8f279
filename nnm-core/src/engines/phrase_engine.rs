// nnm-core/src/engines/phrase_engine.rs
//! A `RedactionEngine` that searches the linearized page text with the compiled
//! phrase list and maps each capture subspan back onto text nodes.
//! License: MIT OR Apache-2.0

use anyhow::Result;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::compiler::{default_patterns, PhrasePatterns};
use crate::dom::{Document, NodeId};
use crate::engine::{ApplyReport, RedactionEngine, RedactionPlan, TitleRedaction};
use crate::linearizer::{linearize_roots, LinearIndex};
use crate::redact::apply_plan;
use crate::redaction_match::{log_match_debug, log_title_debug, MatchRange};
use crate::settings::ScanContext;
use crate::style::RedactStyle;

/// Node coordinates of an absolute span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpan {
    pub start_node: usize,
    pub end_node: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Maps `[abs_start, abs_end)` of the concatenated text onto node coordinates.
///
/// The start node is the last node starting at or before `abs_start`; the end node
/// is found by walking forward until the span end fits inside it. Returns `None` for
/// empty or out-of-range spans.
pub fn locate(index: &LinearIndex, abs_start: usize, abs_end: usize) -> Option<NodeSpan> {
    if index.is_empty() || abs_start >= abs_end || abs_end > index.text.len() {
        return None;
    }
    let start_node = index
        .starts
        .partition_point(|&start| start <= abs_start)
        .checked_sub(1)?;
    let mut end_node = start_node;
    while abs_end > index.starts[end_node] + index.node_len(end_node) {
        end_node += 1;
        if end_node >= index.len() {
            return None;
        }
    }
    Some(NodeSpan {
        start_node,
        end_node,
        start_offset: abs_start - index.starts[start_node],
        end_offset: abs_end - index.starts[end_node],
    })
}

/// Runs every pattern over each segment of the index text and returns the ranges
/// in ascending document order. Ranges overlapping an earlier accepted range are
/// dropped. No match spans a segment break.
pub fn find_ranges(index: &LinearIndex, patterns: &PhrasePatterns) -> Vec<MatchRange> {
    let mut ranges = Vec::new();
    if index.text.is_empty() {
        return ranges;
    }

    for segment in index.segments() {
        let base = segment.start;
        let text = &index.text[segment];
        for pattern in patterns.iter() {
            for caps in pattern.regex.captures_iter(text) {
                let (Some(whole), Some(group)) = (caps.get(0), caps.get(pattern.group)) else {
                    continue;
                };
                if group.start() == group.end() {
                    debug!("Ignoring empty capture for pattern '{}'", pattern.name);
                    continue;
                }
                let (abs_start, abs_end) = (base + group.start(), base + group.end());
                let Some(span) = locate(index, abs_start, abs_end) else {
                    warn!(
                        "Could not map match of pattern '{}' at {}..{} onto text nodes",
                        pattern.name, abs_start, abs_end
                    );
                    continue;
                };
                ranges.push(MatchRange {
                    pattern: pattern.name.clone(),
                    start_node: span.start_node,
                    end_node: span.end_node,
                    start_offset: span.start_offset,
                    end_offset: span.end_offset,
                    abs_start,
                    abs_end,
                    matched_text: whole.as_str().to_string(),
                    redacted_text: group.as_str().to_string(),
                });
            }
        }
    }

    // Stable: ties keep pattern order.
    ranges.sort_by_key(|r| (r.start_node, r.start_offset));

    let mut accepted: Vec<MatchRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(overlapping) = accepted.iter().find(|a| a.overlaps(&range)) {
            debug!(
                "Dropping match of pattern '{}' overlapping a match of '{}'",
                range.pattern, overlapping.pattern
            );
            continue;
        }
        log_match_debug(module_path!(), &range);
        accepted.push(range);
    }
    accepted
}

/// Replaces every capture subspan in a plain string, pattern by pattern.
pub fn redact_string(text: &str, patterns: &PhrasePatterns, style: RedactStyle) -> TitleRedaction {
    let mut current = text.to_string();
    let mut count = 0;
    for pattern in patterns.iter() {
        let mut out = String::with_capacity(current.len());
        let mut last_end = 0;
        for caps in pattern.regex.captures_iter(&current) {
            let Some(group) = caps.get(pattern.group) else {
                continue;
            };
            if group.start() == group.end() {
                continue;
            }
            out.push_str(&current[last_end..group.start()]);
            out.push_str(&style.title_placeholder(group.as_str()));
            last_end = group.end();
            count += 1;
        }
        if last_end > 0 {
            out.push_str(&current[last_end..]);
            current = out;
        }
    }
    log_title_debug(module_path!(), text, &current, count);
    TitleRedaction { text: current, count }
}

#[derive(Debug, Clone)]
pub struct PhraseEngine {
    patterns: Arc<PhrasePatterns>,
}

impl PhraseEngine {
    /// An engine over the built-in phrase list.
    pub fn new() -> Result<Self> {
        Ok(Self::with_patterns(default_patterns()?))
    }

    pub fn with_patterns(patterns: Arc<PhrasePatterns>) -> Self {
        Self { patterns }
    }
}

impl RedactionEngine for PhraseEngine {
    fn plan(&self, doc: &Document, roots: &[NodeId], ctx: &ScanContext) -> RedactionPlan {
        let index = linearize_roots(doc, roots, ctx.redact_class());
        let ranges = find_ranges(&index, &self.patterns);
        debug!(
            "Planned {} range(s) over {} text node(s) ({} bytes).",
            ranges.len(),
            index.len(),
            index.text.len()
        );
        RedactionPlan { index, ranges }
    }

    fn apply(&self, doc: &mut Document, plan: &RedactionPlan, ctx: &ScanContext) -> ApplyReport {
        let report = apply_plan(doc, plan, ctx.redact_class());
        info!(
            "Redacted {} match(es) with style '{}' ({} skipped).",
            report.applied, ctx.style, report.skipped
        );
        report
    }

    fn redact_title(&self, title: &str, style: RedactStyle) -> TitleRedaction {
        redact_string(title, &self.patterns, style)
    }

    fn patterns(&self) -> &PhrasePatterns {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_rules;
    use crate::config::PhraseRule;

    fn index_of(parts: &[&str]) -> LinearIndex {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p).unwrap();
        for part in parts {
            let t = doc.create_text(part);
            doc.append_child(p, t).unwrap();
        }
        crate::linearizer::linearize(&doc, Some(p), "x")
    }

    #[test]
    fn test_locate_single_and_cross_node() {
        let index = index_of(&["Nor", "th Macedonia"]);
        assert_eq!(
            locate(&index, 0, 5),
            Some(NodeSpan { start_node: 0, end_node: 1, start_offset: 0, end_offset: 2 })
        );
        assert_eq!(
            locate(&index, 3, 5),
            Some(NodeSpan { start_node: 1, end_node: 1, start_offset: 0, end_offset: 2 })
        );
        assert_eq!(locate(&index, 5, 5), None);
        assert_eq!(locate(&index, 5, 99), None);
    }

    #[test]
    fn test_locate_skips_empty_nodes() {
        let index = index_of(&["ab", "", "", "cd"]);
        assert_eq!(
            locate(&index, 2, 4),
            Some(NodeSpan { start_node: 3, end_node: 3, start_offset: 0, end_offset: 2 })
        );
        assert_eq!(
            locate(&index, 1, 3),
            Some(NodeSpan { start_node: 0, end_node: 3, start_offset: 1, end_offset: 1 })
        );
    }

    #[test]
    fn test_find_ranges_orders_across_patterns() {
        let patterns = default_patterns().unwrap();
        let index = index_of(&["Kuzey Makedonya and North Macedonia and Nordmazedonien"]);
        let ranges = find_ranges(&index, &patterns);
        let words: Vec<&str> = ranges.iter().map(|r| r.redacted_text.as_str()).collect();
        assert_eq!(words, vec!["Kuzey", "North", "Nord"]);
        assert!(ranges.windows(2).all(|w| (w[0].start_node, w[0].start_offset) <= (w[1].start_node, w[1].start_offset)));
    }

    #[test]
    fn test_find_ranges_drops_overlaps() {
        let patterns = Arc::new(
            compile_rules(vec![
                PhraseRule::new("long", r"(north\s+mac)edonia", 1),
                PhraseRule::new("short", r"(north)\s+macedonia", 1),
            ])
            .unwrap(),
        );
        let index = index_of(&["north macedonia"]);
        let ranges = find_ranges(&index, &patterns);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].pattern, "long");
    }

    #[test]
    fn test_find_ranges_stops_at_segment_breaks() {
        let patterns = default_patterns().unwrap();
        let mut index = index_of(&["Nord", "mazedonien", " and Nordmazedonien"]);
        index.breaks = vec![4];
        let ranges = find_ranges(&index, &patterns);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start_node, 2);
        assert_eq!((ranges[0].abs_start, ranges[0].abs_end), (19, 23));
    }

    #[test]
    fn test_find_ranges_skips_empty_captures() {
        let patterns = Arc::new(
            compile_rules(vec![
                PhraseRule::new("optional", r"(x?)macedonia", 1),
                PhraseRule::new("north", r"(north)\s+macedonia", 1),
            ])
            .unwrap(),
        );
        let index = index_of(&["north macedonia"]);
        let ranges = find_ranges(&index, &patterns);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].pattern, "north");
        assert_eq!(redact_string("north macedonia", &patterns, RedactStyle::Block).count, 1);
    }

    #[test]
    fn test_cyrillic_offsets_are_byte_offsets() {
        let patterns = default_patterns().unwrap();
        let index = index_of(&["Во Северна ", "Македонија"]);
        let ranges = find_ranges(&index, &patterns);
        assert_eq!(ranges.len(), 1);
        let r = &ranges[0];
        assert_eq!((r.start_node, r.end_node), (0, 0));
        assert_eq!(&index.node_text(0)[r.start_offset..r.end_offset], "Северна");
    }

    #[test]
    fn test_redact_string_styles() {
        let patterns = default_patterns().unwrap();
        let title = "Is North Macedonia in the news?";
        let block = redact_string(title, &patterns, RedactStyle::Block);
        assert_eq!(block.text, "Is █████ Macedonia in the news?");
        assert_eq!(block.count, 1);
        assert_eq!(redact_string(title, &patterns, RedactStyle::Hidden).text, "Is  Macedonia in the news?");
        assert_eq!(
            redact_string(title, &patterns, RedactStyle::Bordered).text,
            "Is [[North]] Macedonia in the news?"
        );
        let untouched = redact_string("Macedonia", &patterns, RedactStyle::Block);
        assert_eq!((untouched.text.as_str(), untouched.count), ("Macedonia", 0));
    }
}
