// nnm-core/src/style.rs
//! Redaction styles and the relabel-without-rescan path.
//!
//! Body redactions are styled purely through the class on their wrapper
//! element, so switching styles only swaps classes. Title redaction is
//! destructive and is handled in [`crate::title`].

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dom::Document;
use crate::errors::NnmError;

/// Combining long stroke overlay, placed after every character for `strike`.
pub const STRIKE_MARK: char = '\u{0336}';
pub const BLOCK_GLYPH: char = '█';
pub const LINE_GLYPH: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RedactStyle {
    Bordered,
    Strike,
    #[default]
    Block,
    Line,
    Hidden,
}

impl RedactStyle {
    pub const ALL: [RedactStyle; 5] = [
        RedactStyle::Bordered,
        RedactStyle::Strike,
        RedactStyle::Block,
        RedactStyle::Line,
        RedactStyle::Hidden,
    ];

    pub fn id(self) -> &'static str {
        match self {
            RedactStyle::Bordered => "bordered",
            RedactStyle::Strike => "strike",
            RedactStyle::Block => "block",
            RedactStyle::Line => "line",
            RedactStyle::Hidden => "hidden",
        }
    }

    /// The CSS class put on wrapper elements.
    pub fn class_name(self) -> &'static str {
        match self {
            RedactStyle::Bordered => "redacted-word-bordered",
            RedactStyle::Strike => "redacted-word-strike",
            RedactStyle::Block => "redacted-word-black",
            RedactStyle::Line => "redacted-word-line",
            RedactStyle::Hidden => "redacted-word-hidden",
        }
    }

    /// What replaces a redacted subspan in the (plain string) title.
    pub fn title_placeholder(self, text: &str) -> String {
        match self {
            RedactStyle::Bordered => format!("[[{}]]", text),
            RedactStyle::Strike => text.chars().flat_map(|c| [c, STRIKE_MARK]).collect(),
            RedactStyle::Block => BLOCK_GLYPH.to_string().repeat(text.chars().count()),
            RedactStyle::Line => LINE_GLYPH.to_string().repeat(text.chars().count()),
            RedactStyle::Hidden => String::new(),
        }
    }
}

impl fmt::Display for RedactStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Accepts either the identifier (`block`) or the class name (`redacted-word-black`).
impl FromStr for RedactStyle {
    type Err = NnmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RedactStyle::ALL
            .into_iter()
            .find(|style| s.eq_ignore_ascii_case(style.id()) || s.eq_ignore_ascii_case(style.class_name()))
            .ok_or_else(|| NnmError::UnknownStyle(s.to_string()))
    }
}

/// Inbound request to switch styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleChange {
    pub old_style: String,
    pub new_style: String,
}

impl StyleChange {
    pub fn new(old: RedactStyle, new: RedactStyle) -> Self {
        Self {
            old_style: old.class_name().to_string(),
            new_style: new.class_name().to_string(),
        }
    }

    pub fn parse(&self) -> Result<(RedactStyle, RedactStyle), NnmError> {
        Ok((self.old_style.parse()?, self.new_style.parse()?))
    }
}

/// Swaps `old_class` for `new_class` on every element carrying it.
/// Elements are relabeled in place, never recreated. Returns how many changed.
pub fn relabel(doc: &mut Document, old_class: &str, new_class: &str) -> usize {
    if old_class == new_class {
        return 0;
    }
    let targets = doc.elements_by_class(old_class);
    let mut changed = 0;
    doc.unobserved(|doc| {
        for id in targets {
            match doc.replace_class(id, old_class, new_class) {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => debug!("could not relabel {:?}: {}", id, e),
            }
        }
    });
    info!("Relabeled {} redacted span(s) from '{}' to '{}'.", changed, old_class, new_class);
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_ids_and_class_names() {
        assert_eq!("block".parse::<RedactStyle>().unwrap(), RedactStyle::Block);
        assert_eq!("redacted-word-black".parse::<RedactStyle>().unwrap(), RedactStyle::Block);
        assert_eq!(" Strike ".parse::<RedactStyle>().unwrap(), RedactStyle::Strike);
        assert!(matches!("sparkles".parse::<RedactStyle>(), Err(NnmError::UnknownStyle(_))));
    }

    #[test]
    fn test_title_placeholders() {
        assert_eq!(RedactStyle::Bordered.title_placeholder("North"), "[[North]]");
        assert_eq!(RedactStyle::Strike.title_placeholder("ab"), "a\u{0336}b\u{0336}");
        assert_eq!(RedactStyle::Block.title_placeholder("North"), "█████");
        assert_eq!(RedactStyle::Line.title_placeholder("северна"), "_______");
        assert_eq!(RedactStyle::Hidden.title_placeholder("North"), "");
    }

    #[test]
    fn test_relabel_swaps_classes_in_place() {
        let mut doc = Document::parse_html(
            "<p><span class=\"redacted-word-black\">North</span> and <span class=\"keep redacted-word-black\">Nord</span></p>",
        );
        let before = doc.elements_by_class("redacted-word-black");
        let changed = relabel(&mut doc, "redacted-word-black", "redacted-word-line");
        assert_eq!(changed, 2);
        assert!(doc.elements_by_class("redacted-word-black").is_empty());
        assert_eq!(doc.elements_by_class("redacted-word-line"), before);
        assert_eq!(doc.attribute(before[1], "class"), Some("keep redacted-word-line"));
    }
}
