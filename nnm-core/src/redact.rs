// nnm-core/src/redact.rs
//! The write pass: isolates matched subspans in styled wrapper elements.
//!
//! Every range is checked against the live tree before anything is touched. A
//! range whose nodes were detached, or whose offsets no longer fit the node's
//! current text, is dropped and the pass carries on with the next one.

use log::{debug, warn};

use crate::dom::{Document, DomError, NodeData, NodeId};
use crate::engine::{ApplyReport, RedactionPlan};
use crate::redaction_match::MatchRange;

/// Tag name of the wrapper elements.
pub const WRAPPER_TAG: &str = "span";

/// What a range fragment lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactTarget {
    /// A text leaf; the fragment is split out and wrapped.
    TextLeaf(NodeId),
    /// Already an element; the class is appended and nothing is split.
    StyledElement(NodeId),
}

impl RedactTarget {
    pub fn resolve(doc: &Document, id: NodeId) -> Result<Self, DomError> {
        match doc.data(id) {
            Some(NodeData::Text { .. }) => Ok(RedactTarget::TextLeaf(id)),
            Some(NodeData::Element { .. }) => Ok(RedactTarget::StyledElement(id)),
            Some(_) => Err(DomError::WrongNodeKind(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    pub fn node(self) -> NodeId {
        match self {
            RedactTarget::TextLeaf(id) | RedactTarget::StyledElement(id) => id,
        }
    }
}

fn current_len(doc: &Document, target: RedactTarget) -> usize {
    match target {
        RedactTarget::TextLeaf(id) => doc.text(id).map(str::len).unwrap_or(0),
        RedactTarget::StyledElement(id) => doc.text_content(id).len(),
    }
}

fn check_bounds(doc: &Document, target: RedactTarget, start: usize, end: usize) -> Result<(), DomError> {
    let node = target.node();
    if !doc.is_attached(node) {
        return Err(DomError::Detached(node));
    }
    if let RedactTarget::TextLeaf(id) = target {
        let text = doc.text(id).unwrap_or_default();
        for offset in [start, end] {
            if offset > text.len() || !text.is_char_boundary(offset) {
                return Err(DomError::OffsetOutOfBounds {
                    node: id,
                    offset,
                    len: text.len(),
                });
            }
        }
        if start >= end {
            return Err(DomError::OffsetOutOfBounds {
                node: id,
                offset: start,
                len: text.len(),
            });
        }
    }
    Ok(())
}

/// Redacts `[start, end)` of one target with `class`. Returns the styled element.
///
/// A text leaf is split into `[0, start)`, `[start, end)` and `[end, len)`; empty
/// outer fragments are never created. The middle fragment keeps its node identity
/// and is moved into a new wrapper inserted at its former position.
pub fn apply_redaction(
    doc: &mut Document,
    target: RedactTarget,
    start: usize,
    end: usize,
    class: &str,
) -> Result<NodeId, DomError> {
    check_bounds(doc, target, start, end)?;
    match target {
        RedactTarget::StyledElement(id) => {
            doc.add_class(id, class)?;
            Ok(id)
        }
        RedactTarget::TextLeaf(node) => {
            let len = current_len(doc, target);
            if end < len {
                doc.split_text(node, end)?;
            }
            let middle = if start > 0 { doc.split_text(node, start)? } else { node };
            let parent = doc.parent(middle).ok_or(DomError::Detached(middle))?;
            let next = doc.next_sibling(middle);

            let wrapper = doc.create_element(WRAPPER_TAG);
            doc.add_class(wrapper, class)?;
            doc.detach(middle)?;
            doc.insert_before(parent, wrapper, next)?;
            doc.append_child(wrapper, middle)?;
            Ok(wrapper)
        }
    }
}

/// One fragment of a range: which node and which part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fragment {
    target: RedactTarget,
    start: usize,
    end: usize,
}

/// Resolves and validates every fragment of a range up front, so a range is either
/// applied completely or not at all. Fragments come back in the order they must be
/// applied: end node, middle nodes from last to first, then the start node.
fn fragments(doc: &Document, plan: &RedactionPlan, range: &MatchRange) -> Result<Vec<Fragment>, DomError> {
    let lookup = |i: usize| -> Result<RedactTarget, DomError> {
        let id = plan.node(i).ok_or(DomError::StaleIndex(i))?;
        RedactTarget::resolve(doc, id)
    };

    let mut out = Vec::new();
    if range.is_single_node() {
        out.push(Fragment {
            target: lookup(range.start_node)?,
            start: range.start_offset,
            end: range.end_offset,
        });
    } else {
        out.push(Fragment {
            target: lookup(range.end_node)?,
            start: 0,
            end: range.end_offset,
        });
        for i in (range.start_node + 1..range.end_node).rev() {
            let target = lookup(i)?;
            let len = current_len(doc, target);
            if len == 0 {
                continue;
            }
            out.push(Fragment { target, start: 0, end: len });
        }
        let start_target = lookup(range.start_node)?;
        out.push(Fragment {
            target: start_target,
            start: range.start_offset,
            end: current_len(doc, start_target),
        });
    }

    for fragment in &out {
        check_bounds(doc, fragment.target, fragment.start, fragment.end)?;
    }
    Ok(out)
}

/// Applies one range. Returns the number of wrappers touched.
pub fn apply_range(
    doc: &mut Document,
    plan: &RedactionPlan,
    range: &MatchRange,
    class: &str,
) -> Result<usize, DomError> {
    let fragments = fragments(doc, plan, range)?;
    for fragment in &fragments {
        apply_redaction(doc, fragment.target, fragment.start, fragment.end, class)?;
    }
    Ok(fragments.len())
}

/// Applies every range of `plan`, last to first, with the mutation journal paused.
pub fn apply_plan(doc: &mut Document, plan: &RedactionPlan, class: &str) -> ApplyReport {
    let mut report = ApplyReport::default();
    doc.unobserved(|doc| {
        for range in plan.ranges.iter().rev() {
            match apply_range(doc, plan, range, class) {
                Ok(wrappers) => {
                    report.applied += 1;
                    report.wrappers += wrappers;
                }
                Err(e) => {
                    warn!(
                        "Skipping match of pattern '{}' at nodes {}..={}: {}",
                        range.pattern, range.start_node, range.end_node, e
                    );
                    report.skipped += 1;
                }
            }
        }
    });
    debug!(
        "Applied {} range(s), skipped {}, {} wrapper(s).",
        report.applied, report.skipped, report.wrappers
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linearizer::linearize;

    const CLASS: &str = "redacted-word-black";

    fn paragraph(parts: &[&str]) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::parse_html("");
        let body = doc.body().unwrap();
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();
        let texts = parts
            .iter()
            .map(|part| {
                let t = doc.create_text(part);
                doc.append_child(p, t).unwrap();
                t
            })
            .collect();
        (doc, p, texts)
    }

    fn range(start_node: usize, start_offset: usize, end_node: usize, end_offset: usize) -> MatchRange {
        MatchRange {
            pattern: "test".into(),
            start_node,
            end_node,
            start_offset,
            end_offset,
            abs_start: 0,
            abs_end: 0,
            matched_text: String::new(),
            redacted_text: String::new(),
        }
    }

    #[test]
    fn test_single_node_wraps_only_the_middle() {
        let (mut doc, p, texts) = paragraph(&["Say North Macedonia"]);
        let wrapper = apply_redaction(&mut doc, RedactTarget::TextLeaf(texts[0]), 4, 9, CLASS).unwrap();
        assert_eq!(doc.outer_html(p), r#"<p>Say <span class="redacted-word-black">North</span> Macedonia</p>"#);
        assert_eq!(doc.text(texts[0]), Some("Say "));
        assert_eq!(doc.text_content(wrapper), "North");
        assert_eq!(doc.text_content(p), "Say North Macedonia");
    }

    #[test]
    fn test_no_empty_fragments_at_edges() {
        let (mut doc, p, texts) = paragraph(&["North"]);
        let wrapper = apply_redaction(&mut doc, RedactTarget::TextLeaf(texts[0]), 0, 5, CLASS).unwrap();
        assert_eq!(doc.children(p), &[wrapper]);
        assert_eq!(doc.children(wrapper), &[texts[0]]);
    }

    #[test]
    fn test_element_target_only_gets_the_class() {
        let (mut doc, p, _) = paragraph(&["North"]);
        let before = doc.to_html();
        let id = apply_redaction(&mut doc, RedactTarget::StyledElement(p), 0, 5, CLASS).unwrap();
        assert_eq!(id, p);
        assert!(doc.has_class(p, CLASS));
        assert_eq!(doc.to_html(), before.replace("<p>", r#"<p class="redacted-word-black">"#));
    }

    #[test]
    fn test_cross_node_range_wraps_each_fragment() {
        let (mut doc, p, _) = paragraph(&["Nor", "", "th Macedonia"]);
        let index = linearize(&doc, Some(p), CLASS);
        let plan = RedactionPlan {
            index,
            ranges: vec![range(0, 0, 2, 2)],
        };
        let report = apply_plan(&mut doc, &plan, CLASS);
        assert_eq!(report, ApplyReport { applied: 1, skipped: 0, wrappers: 2 });
        let wrappers = doc.elements_by_class(CLASS);
        let joined: String = wrappers.iter().map(|w| doc.text_content(*w)).collect();
        assert_eq!(joined, "North");
        assert_eq!(doc.text_content(p), "North Macedonia");
    }

    #[test]
    fn test_stale_range_is_skipped_and_others_applied() {
        let (mut doc, p, texts) = paragraph(&["North Macedonia", " and Nord"]);
        let index = linearize(&doc, Some(p), CLASS);
        let plan = RedactionPlan {
            index,
            ranges: vec![range(0, 0, 0, 5), range(1, 5, 1, 40)],
        };
        let report = apply_plan(&mut doc, &plan, CLASS);
        assert_eq!((report.applied, report.skipped), (1, 1));
        assert_eq!(doc.text(texts[1]), Some(" and Nord"));

        doc.detach(texts[1]).unwrap();
        let err = apply_redaction(&mut doc, RedactTarget::TextLeaf(texts[1]), 0, 1, CLASS).unwrap_err();
        assert_eq!(err, DomError::Detached(texts[1]));
    }

    #[test]
    fn test_fragment_must_fall_on_char_boundary() {
        let (mut doc, _, texts) = paragraph(&["Северна"]);
        let err = apply_redaction(&mut doc, RedactTarget::TextLeaf(texts[0]), 0, 3, CLASS).unwrap_err();
        assert!(matches!(err, DomError::OffsetOutOfBounds { offset: 3, .. }));
        assert_eq!(doc.text(texts[0]), Some("Северна"));
    }
}
