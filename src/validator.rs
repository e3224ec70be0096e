//! Message validation: separates real turns from UI noise.
//!
//! A candidate is rejected when it is detached, is itself an interactive
//! control, has no visible text, shows a loading placeholder, or is shorter
//! than the platform's minimum text length.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::adapters::text::{TextOptions, visible_text};
use crate::tree::{Document, Element, NodeId};

/// Default minimum visible-text length, in characters.
pub const MIN_TEXT_LEN: usize = 3;

const INTERACTIVE_TAGS: &[&str] = &["button", "input", "textarea", "select", "option", "menu"];

const INTERACTIVE_ROLES: &[&str] =
    &["button", "menuitem", "menu", "menubar", "tab", "toolbar", "option", "switch", "checkbox"];

static LOADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(loading|thinking|generating|searching|typing|writing|analyzing|analysing)(\s*(\.{1,3}|…))?$")
        .expect("loading pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Detached,
    Interactive,
    Empty,
    Loading,
    TooShort,
}

impl Verdict {
    pub fn is_valid(self) -> bool {
        self == Verdict::Valid
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Verdict::Valid => "valid",
            Verdict::Detached => "detached",
            Verdict::Interactive => "interactive control",
            Verdict::Empty => "no visible text",
            Verdict::Loading => "loading placeholder",
            Verdict::TooShort => "text too short",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    min_text_len: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(MIN_TEXT_LEN)
    }
}

impl Validator {
    pub fn new(min_text_len: usize) -> Self {
        Self { min_text_len }
    }

    pub fn check(&self, doc: &Document, node: NodeId, options: &TextOptions) -> Verdict {
        let Some(el) = doc.element(node) else {
            return Verdict::Empty;
        };
        if !doc.is_attached(node) {
            return Verdict::Detached;
        }
        if is_interactive(el) {
            return Verdict::Interactive;
        }

        let text = visible_text(doc, node, options);
        let text = text.trim();
        if text.is_empty() {
            Verdict::Empty
        } else if is_loading_placeholder(text) {
            Verdict::Loading
        } else if text.chars().count() < self.min_text_len {
            Verdict::TooShort
        } else {
            Verdict::Valid
        }
    }
}

pub fn is_interactive(el: &Element) -> bool {
    INTERACTIVE_TAGS.contains(&el.tag.as_str())
        || el.attr("role").is_some_and(|role| INTERACTIVE_ROLES.contains(&role))
}

pub fn is_loading_placeholder(text: &str) -> bool {
    let text = text.trim();
    text.chars().all(|c| c == '.' || c == '…') || LOADING.is_match(text)
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn single(el: Element, text: &str) -> (Document, NodeId) {
        let mut doc = Document::new(Url::parse("https://claude.ai/").unwrap());
        let node = doc.create_element(el);
        let t = doc.create_text(text);
        doc.append_child(node, t).unwrap();
        let root = doc.root();
        doc.append_child(root, node).unwrap();
        (doc, node)
    }

    fn verdict(el: Element, text: &str) -> Verdict {
        let (doc, node) = single(el, text);
        Validator::default().check(&doc, node, &TextOptions::default())
    }

    #[test]
    fn test_accepts_real_text() {
        assert_eq!(verdict(Element::new("div"), "How do I sort a Vec?"), Verdict::Valid);
    }

    #[test]
    fn test_rejects_interactive_controls() {
        assert_eq!(verdict(Element::new("button"), "Regenerate"), Verdict::Interactive);
        assert_eq!(
            verdict(Element::new("div").with_attr("role", "menuitem"), "Share chat"),
            Verdict::Interactive
        );
    }

    #[test]
    fn test_rejects_loading_placeholders() {
        for text in ["Loading...", "thinking", "Generating…", "...", "…"] {
            assert_eq!(verdict(Element::new("div"), text), Verdict::Loading, "{text}");
        }
        assert_eq!(verdict(Element::new("div"), "Loading the dataset works now"), Verdict::Valid);
    }

    #[test]
    fn test_rejects_short_and_empty() {
        assert_eq!(verdict(Element::new("div"), "ok"), Verdict::TooShort);
        assert_eq!(verdict(Element::new("div"), "   "), Verdict::Empty);
        let (doc, node) = single(Element::new("div"), "hey");
        assert_eq!(Validator::new(5).check(&doc, node, &TextOptions::default()), Verdict::TooShort);
    }

    #[test]
    fn test_rejects_detached() {
        let (mut doc, node) = single(Element::new("div"), "long enough");
        doc.remove(node).unwrap();
        assert_eq!(Validator::default().check(&doc, node, &TextOptions::default()), Verdict::Detached);
    }
}
