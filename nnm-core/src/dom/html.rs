// nnm-core/src/dom/html.rs
//! Loading HTML into a [`Document`] and writing it back out.
//!
//! Parsing goes through `html5ever` into an `RcDom`, which is then copied into
//! the arena. Serialization is done directly from the arena.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use log::debug;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use super::{Document, DomError, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "xmp", "iframe", "noembed", "noframes"];

fn parse_rcdom(source: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(source)
}

impl Document {
    /// Parses a full HTML document. HTML parsing never fails; malformed input is
    /// recovered the way browsers do.
    pub fn parse_html(source: &str) -> Document {
        let dom = parse_rcdom(source);
        let mut doc = Document::new();
        let root = doc.root();
        for child in dom.document.children.borrow().iter() {
            if let Some(id) = doc.import_handle(child) {
                // The fresh document has no observers, so nothing is journaled here.
                if let Err(e) = doc.append_child(root, id) {
                    debug!("dropping top-level node during import: {}", e);
                }
            }
        }
        doc
    }

    /// Parses `source` and appends the children of its `<body>` under `parent`.
    ///
    /// Each top-level node is inserted with one append, so an observing document
    /// journals one insertion per appended subtree. Returns the appended nodes.
    pub fn append_html(&mut self, parent: NodeId, source: &str) -> Result<Vec<NodeId>, DomError> {
        let dom = parse_rcdom(source);
        let Some(body) = find_rc_element(&dom.document, "body") else {
            return Ok(Vec::new());
        };
        let mut appended = Vec::new();
        for child in body.children.borrow().iter() {
            if let Some(id) = self.import_handle(child) {
                self.append_child(parent, id)?;
                appended.push(id);
            }
        }
        Ok(appended)
    }

    /// Copies an `RcDom` subtree into the arena as a detached subtree.
    fn import_handle(&mut self, handle: &Handle) -> Option<NodeId> {
        let id = match &handle.data {
            RcNodeData::Element { name, attrs, .. } => {
                let attributes = attrs
                    .borrow()
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                self.create_element_with_attributes(&name.local, attributes)
            }
            RcNodeData::Text { contents } => self.create_text(&contents.borrow()),
            RcNodeData::Comment { contents } => self.create_comment(contents),
            RcNodeData::Doctype { name, .. } => {
                self.set_doctype(Some(name.to_string()));
                return None;
            }
            RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => return None,
        };
        let mut children: Vec<Handle> = handle.children.borrow().clone();
        // html5ever keeps template content in a separate fragment.
        if let RcNodeData::Element { template_contents, .. } = &handle.data {
            if let Some(fragment) = template_contents.borrow().as_ref() {
                children.extend(fragment.children.borrow().iter().cloned());
            }
        }
        for child in &children {
            if let Some(child_id) = self.import_handle(child) {
                if let Err(e) = self.append_child(id, child_id) {
                    debug!("dropping child node during import: {}", e);
                }
            }
        }
        Some(id)
    }

    /// Serializes the whole document.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
        for child in self.children(self.root()) {
            self.write_node(*child, false, &mut out);
        }
        out
    }

    /// Serializes a subtree, including the node itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self
            .parent(id)
            .and_then(|p| self.tag_name(p))
            .is_some_and(|n| RAW_TEXT_ELEMENTS.contains(&n));
        self.write_node(id, raw, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Element { name, attributes }) => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&name.as_str());
                for child in self.children(id) {
                    self.write_node(*child, raw, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Some(NodeData::Text { text }) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            Some(NodeData::Comment { text }) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeData::Document) => {
                for child in self.children(id) {
                    self.write_node(*child, false, out);
                }
            }
            None => {}
        }
    }
}

fn find_rc_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let RcNodeData::Element { name, .. } = &handle.data {
        if &*name.local == tag {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_rc_element(child, tag))
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
