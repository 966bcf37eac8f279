// nnm-core/src/dom/mod.rs
//! An arena-backed document model.
//!
//! The redaction engine needs a small, mutable tree with stable node identities:
//! text leaves are split in place, wrapper elements are inserted next to them and
//! ranges computed before a mutation must still name the same nodes afterwards.
//! Nodes are never freed; a removed node is simply detached from its parent and
//! keeps its `NodeId`.
//!
//! The document also keeps a mutation journal. When observation is enabled, child
//! insertions under attached parents and title changes are recorded so the
//! incremental watcher can pick them up in batches. Writes performed while the
//! journal is paused are not recorded.
//!
//! License: MIT OR Apache-2.0

use log::debug;
use thiserror::Error;

pub mod html;

/// Elements whose text children are never scanned.
pub const SCRIPT_LIKE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Stable handle to a node in a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors raised by document primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} has the wrong kind for this operation")]
    WrongNodeKind(NodeId),
    #[error("node {0:?} cannot have children")]
    InvalidParent(NodeId),
    #[error("node {child:?} is already attached to {parent:?}")]
    AlreadyAttached { parent: NodeId, child: NodeId },
    #[error("{before:?} is not a child of {parent:?}")]
    InvalidSibling { parent: NodeId, before: NodeId },
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("offset {offset} is out of bounds for text node {node:?} (length {len})")]
    OffsetOutOfBounds { node: NodeId, offset: usize, len: usize },
    #[error("node index {0} is outside the scanned snapshot")]
    StaleIndex(usize),
    #[error("node {0:?} is not attached to the document")]
    Detached(NodeId),
    #[error("the document has no title element")]
    MissingTitle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl NodeData {
    fn allows_children(&self) -> bool {
        matches!(self, NodeData::Document | NodeData::Element { .. })
    }
}

#[derive(Debug, Clone)]
struct NodeRecord {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A change observed on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationRecord {
    /// `node` was inserted as a child of `parent`.
    ChildInserted { parent: NodeId, node: NodeId },
    /// The text of the title element was replaced.
    TitleChanged,
}

#[derive(Debug, Default, Clone)]
struct MutationJournal {
    observing: bool,
    paused: bool,
    records: Vec<MutationRecord>,
}

impl MutationJournal {
    fn push(&mut self, record: MutationRecord) {
        if self.observing && !self.paused {
            self.records.push(record);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeRecord>,
    doctype: Option<String>,
    journal: MutationJournal,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            doctype: None,
            journal: MutationJournal::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn set_doctype(&mut self, doctype: Option<String>) {
        self.doctype = doctype;
    }

    fn record(&self, id: NodeId) -> Result<&NodeRecord, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).map(|r| &r.data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|r| r.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text { .. }))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element { .. }))
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text { text }) => Some(text),
            _ => None,
        }
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Element { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// Concatenated text of every text node in the subtree rooted at `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    // --- construction -----------------------------------------------------

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_node(NodeData::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    pub fn create_element_with_attributes(
        &mut self,
        name: &str,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        self.push_node(NodeData::Element {
            name: name.to_ascii_lowercase(),
            attributes,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text {
            text: text.to_string(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Comment {
            text: text.to_string(),
        })
    }

    // --- tree mutation ------------------------------------------------------

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_record = self.record(parent)?;
        let child_record = self.record(child)?;
        if !parent_record.data.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        if let Some(existing) = child_record.parent {
            return Err(DomError::AlreadyAttached {
                parent: existing,
                child,
            });
        }
        if parent == child || self.contains(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        Ok(())
    }

    fn note_insertion(&mut self, parent: NodeId, node: NodeId) {
        if self.is_attached(parent) {
            self.journal
                .push(MutationRecord::ChildInserted { parent, node });
        }
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        self.record_mut(parent)?.children.push(child);
        self.record_mut(child)?.parent = Some(parent);
        self.note_insertion(parent, child);
        Ok(())
    }

    /// Inserts a detached node before `before`, or appends it when `before` is `None`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        let Some(before) = before else {
            return self.append_child(parent, child);
        };
        self.check_insertable(parent, child)?;
        let pos = self
            .record(parent)?
            .children
            .iter()
            .position(|k| *k == before)
            .ok_or(DomError::InvalidSibling { parent, before })?;
        self.record_mut(parent)?.children.insert(pos, child);
        self.record_mut(child)?.parent = Some(parent);
        self.note_insertion(parent, child);
        Ok(())
    }

    /// Detaches a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.record_mut(id)?.parent.take() else {
            return Ok(());
        };
        self.record_mut(parent)?.children.retain(|k| *k != id);
        Ok(())
    }

    /// The sibling following `id` under the same parent.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|k| *k == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Splits a text node at a byte `offset`, keeping `[0, offset)` in `id` and moving
    /// `[offset, len)` into a new text node inserted right after it.
    ///
    /// Returns the new node. Like the DOM's `splitText`, the tail node is created even
    /// when it is empty.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let tail = match &self.record(id)?.data {
            NodeData::Text { text } => {
                if offset > text.len() || !text.is_char_boundary(offset) {
                    return Err(DomError::OffsetOutOfBounds {
                        node: id,
                        offset,
                        len: text.len(),
                    });
                }
                text[offset..].to_string()
            }
            _ => return Err(DomError::WrongNodeKind(id)),
        };
        if let NodeData::Text { text } = &mut self.record_mut(id)?.data {
            text.truncate(offset);
        }
        let new_node = self.create_text(&tail);
        if let Some(parent) = self.parent(id) {
            let next = self.next_sibling(id);
            self.insert_before(parent, new_node, next)?;
        }
        Ok(new_node)
    }

    // --- queries ------------------------------------------------------------

    /// Whether `node` lies in the subtree rooted at `ancestor` (inclusive).
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root(), id)
    }

    /// Depth-first, pre-order walk of the subtree rooted at `id` (inclusive).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if id.0 < self.nodes.len() { vec![id] } else { Vec::new() };
        Descendants { doc: self, stack }
    }

    /// First element with the given tag name in document order under `scope`.
    pub fn find_element(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(scope)
            .find(|id| self.tag_name(*id).is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_element(self.root(), "body")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.find_element(self.root(), "head")
    }

    // --- attributes & classes -------------------------------------------

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Element { attributes, .. }) => attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.record_mut(id)?.data {
            NodeData::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                    Some((_, existing)) => *existing = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|v| v.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        !class.is_empty() && self.class_list(id).contains(&class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if !self.is_element(id) {
            return Err(DomError::WrongNodeKind(id));
        }
        if class.is_empty() || self.has_class(id, class) {
            return Ok(());
        }
        let mut classes: Vec<String> = self.class_list(id).into_iter().map(str::to_string).collect();
        classes.push(class.to_string());
        self.set_attribute(id, "class", &classes.join(" "))
    }

    /// Replaces `old` with `new` in the element's class list, keeping its position.
    /// Returns `false` when the element did not carry `old`.
    pub fn replace_class(&mut self, id: NodeId, old: &str, new: &str) -> Result<bool, DomError> {
        if !self.has_class(id, old) {
            return Ok(false);
        }
        let mut classes: Vec<String> = Vec::new();
        for class in self.class_list(id) {
            let class = if class == old { new } else { class };
            if !class.is_empty() && !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
        self.set_attribute(id, "class", &classes.join(" "))?;
        Ok(true)
    }

    /// Elements under the document carrying `class`, in document order.
    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    // --- title ----------------------------------------------------------

    pub fn title_element(&self) -> Option<NodeId> {
        self.find_element(self.root(), "title")
    }

    /// Text of the title element, if the document has one.
    pub fn title(&self) -> Option<String> {
        self.title_element().map(|t| self.text_content(t))
    }

    /// Replaces the title element's content with a single text node.
    pub fn set_title(&mut self, title: &str) -> Result<(), DomError> {
        let element = self.title_element().ok_or(DomError::MissingTitle)?;
        let old_children = std::mem::take(&mut self.record_mut(element)?.children);
        for child in old_children {
            self.record_mut(child)?.parent = None;
        }
        let text = self.create_text(title);
        self.record_mut(element)?.children.push(text);
        self.record_mut(text)?.parent = Some(element);
        self.journal.push(MutationRecord::TitleChanged);
        Ok(())
    }

    // --- observation ----------------------------------------------------

    /// Starts recording mutations.
    pub fn observe(&mut self) {
        self.journal.observing = true;
    }

    /// Stops recording and drops anything pending.
    pub fn disconnect(&mut self) {
        self.journal.observing = false;
        self.journal.records.clear();
    }

    pub fn is_observing(&self) -> bool {
        self.journal.observing
    }

    /// Drains the recorded mutations.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.journal.records)
    }

    /// Runs `f` with the journal paused, so the document's own writes are not observed.
    pub fn unobserved<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let was_paused = std::mem::replace(&mut self.journal.paused, true);
        let result = f(self);
        self.journal.paused = was_paused;
        if !was_paused {
            debug!("mutation journal resumed ({} pending records)", self.journal.records.len());
        }
        result
    }
}

/// Pre-order iterator over a subtree. See [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}
