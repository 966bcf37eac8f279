// nnm-core/src/linearizer.rs
//! Flattens the text leaves of a subtree into one addressable string.
//!
//! The engine searches the concatenated text and maps every hit back to the
//! text node it starts and ends in. A [`LinearIndex`] describes exactly one
//! snapshot of the tree; once a node has been split it is stale.

use log::debug;
use std::ops::Range;

use crate::dom::{Document, NodeId, SCRIPT_LIKE_ELEMENTS};

/// Eligible text nodes in document order, their concatenation and the byte
/// offset at which each node starts in it.
///
/// Invariant: `starts[i] + len(nodes[i]) == starts[i + 1]`.
///
/// `breaks` holds the byte offsets at which an unrelated subtree begins. Text on
/// either side of a break is not contiguous in the page and is searched apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearIndex {
    pub nodes: Vec<NodeId>,
    pub starts: Vec<usize>,
    pub text: String,
    pub breaks: Vec<usize>,
}

impl LinearIndex {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Byte length of node `i` at the time the index was built.
    pub fn node_len(&self, i: usize) -> usize {
        let end = self.starts.get(i + 1).copied().unwrap_or(self.text.len());
        end - self.starts[i]
    }

    /// Snapshot text of node `i`.
    pub fn node_text(&self, i: usize) -> &str {
        let start = self.starts[i];
        &self.text[start..start + self.node_len(i)]
    }

    /// Byte ranges of the text that may be searched as one string.
    pub fn segments(&self) -> Vec<Range<usize>> {
        let mut segments = Vec::with_capacity(self.breaks.len() + 1);
        let mut start = 0;
        for &end in &self.breaks {
            segments.push(start..end);
            start = end;
        }
        segments.push(start..self.text.len());
        segments
    }

    fn push(&mut self, node: NodeId, text: &str) {
        self.nodes.push(node);
        self.starts.push(self.text.len());
        self.text.push_str(text);
    }
}

/// Whether a text node may be scanned: its immediate parent must not be script-like
/// and must not already carry the active redaction class.
pub fn is_eligible(doc: &Document, node: NodeId, redact_class: &str) -> bool {
    if !doc.is_text(node) {
        return false;
    }
    let Some(parent) = doc.parent(node) else {
        return true;
    };
    if let Some(tag) = doc.tag_name(parent) {
        if SCRIPT_LIKE_ELEMENTS.contains(&tag) {
            return false;
        }
    }
    !doc.has_class(parent, redact_class)
}

/// Linearizes the subtree rooted at `root`. A missing root yields an empty index.
pub fn linearize(doc: &Document, root: Option<NodeId>, redact_class: &str) -> LinearIndex {
    let mut index = LinearIndex::default();
    if let Some(root) = root {
        collect(doc, root, redact_class, &mut index);
    }
    index
}

/// Linearizes a batch of inserted subtrees.
///
/// Roots that are no longer attached, that appear twice, or that sit inside
/// another root of the same batch are skipped, so no text node is indexed twice.
/// Remaining roots are visited in document order. A root that does not directly
/// follow the previous one as its next sibling starts a new segment.
pub fn linearize_roots(doc: &Document, roots: &[NodeId], redact_class: &str) -> LinearIndex {
    let mut kept: Vec<NodeId> = Vec::new();
    for (i, &root) in roots.iter().enumerate() {
        if !doc.is_attached(root) {
            debug!("skipping detached root {:?}", root);
            continue;
        }
        let nested = roots
            .iter()
            .enumerate()
            .any(|(j, &other)| j != i && other != root && doc.contains(other, root));
        if nested || kept.contains(&root) {
            continue;
        }
        kept.push(root);
    }

    let order: Vec<NodeId> = doc.descendants(doc.root()).collect();
    kept.sort_by_key(|id| order.iter().position(|n| n == id));

    let mut index = LinearIndex::default();
    let mut previous: Option<NodeId> = None;
    for root in kept {
        let adjacent = previous.is_some_and(|p| doc.next_sibling(p) == Some(root));
        if previous.is_some() && !adjacent {
            index.breaks.push(index.text.len());
        }
        collect(doc, root, redact_class, &mut index);
        previous = Some(root);
    }
    index
}

fn collect(doc: &Document, root: NodeId, redact_class: &str, index: &mut LinearIndex) {
    for node in doc.descendants(root) {
        if is_eligible(doc, node, redact_class) && !in_template(doc, node) {
            if let Some(text) = doc.text(node) {
                index.push(node, text);
            }
        }
    }
}

/// Template content is inert; it is never rendered in place.
fn in_template(doc: &Document, node: NodeId) -> bool {
    let mut current = doc.parent(node);
    while let Some(id) = current {
        if doc.tag_name(id) == Some("template") {
            return true;
        }
        current = doc.parent(id);
    }
    false
}
