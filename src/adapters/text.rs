//! Visible-text extraction and preview normalisation shared by every adapter.

use std::sync::LazyLock;

use regex::Regex;

use crate::tree::{Document, Element, NodeId};

/// Maximum preview length in UTF-16 code units.
pub const PREVIEW_LIMIT: usize = 120;

/// Subtrees under these tags never contribute visible text.
const SKIPPED_TAGS: &[&str] = &["button", "script", "style", "svg", "noscript", "template"];

static ROLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(you|user|assistant|claude|chatgpt|gemini|model|deepseek|grok)\s*:\s*")
        .expect("role prefix pattern is valid")
});

/// Per-platform tweaks to the visible-text walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOptions {
    /// Extra tags to skip (e.g. `code` for platforms that label code blocks).
    pub skip_tags: &'static [&'static str],
    /// Class fragments whose subtrees are skipped (copy buttons, language labels).
    pub skip_class_fragments: &'static [&'static str],
}

impl TextOptions {
    fn skips(&self, el: &Element) -> bool {
        SKIPPED_TAGS.contains(&el.tag.as_str())
            || self.skip_tags.contains(&el.tag.as_str())
            || self.skip_class_fragments.iter().any(|f| el.class_contains(f))
            || el.style.is_display_none()
            || el.style.is_visibility_hidden()
    }
}

/// Trimmed text of every visible text node under `node`, joined by single spaces.
pub fn visible_text(doc: &Document, node: NodeId, options: &TextOptions) -> String {
    if let Some(el) = doc.element(node)
        && options.skips(el)
    {
        return String::new();
    }

    let mut parts = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(node).iter().rev().copied().collect();
    while let Some(current) = stack.pop() {
        if let Some(text) = doc.text(current) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
            continue;
        }
        if doc.element(current).is_some_and(|el| options.skips(el)) {
            continue;
        }
        stack.extend(doc.children(current).iter().rev());
    }
    parts.join(" ")
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_role_prefix(text: &str) -> &str {
    match ROLE_PREFIX.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Cuts `text` to at most `limit` UTF-16 code units without splitting a character.
pub fn truncate_code_units(text: &str, limit: usize) -> &str {
    let mut units = 0;
    for (offset, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > limit {
            return &text[..offset];
        }
    }
    text
}

/// Collapse whitespace, strip a leading role label, and bound the length.
pub fn normalize_preview(raw: &str, limit: usize) -> String {
    let collapsed = collapse_whitespace(raw);
    let stripped = strip_role_prefix(&collapsed);
    truncate_code_units(stripped, limit).trim_end().to_string()
}
