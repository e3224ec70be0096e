//! Role-classification heuristics.
//!
//! Each heuristic is a pure function that either recognises the role of a node
//! or abstains. Adapters list theirs in priority order (attribute, class,
//! ancestor attribute, layout, text pattern, sibling alternation) and
//! [`classify`] returns the first verdict, defaulting to [`Role::Assistant`].

use crate::models::Role;
use crate::tree::{Document, Element, NodeId};

pub type RoleHeuristic = fn(&Document, NodeId) -> Option<Role>;

/// Role used when every heuristic abstains.
pub const DEFAULT_ROLE: Role = Role::Assistant;

const ROLE_ATTRIBUTES: &[&str] =
    &["data-message-author-role", "data-role", "data-message-role", "data-augmented-ui-role"];

pub fn classify(chain: &[RoleHeuristic], doc: &Document, node: NodeId) -> Role {
    chain.iter().find_map(|heuristic| heuristic(doc, node)).unwrap_or(DEFAULT_ROLE)
}

fn attribute_role(el: &Element) -> Option<Role> {
    ROLE_ATTRIBUTES.iter().find_map(|name| el.attr(name).and_then(Role::from_token))
}

/// Explicit role attribute on the node itself.
pub fn role_attribute(doc: &Document, node: NodeId) -> Option<Role> {
    doc.element(node).and_then(attribute_role)
}

/// Explicit role attribute on the nearest ancestor that carries one.
pub fn ancestor_role_attribute(doc: &Document, node: NodeId) -> Option<Role> {
    doc.ancestors(node).find_map(|a| doc.element(a).and_then(attribute_role))
}

/// Right-aligned bubbles belong to the user: nearest flex container packs to the end.
pub fn flex_end_alignment(doc: &Document, node: NodeId) -> Option<Role> {
    let flex = doc.closest(node, is_flex_container)?;
    let el = doc.element(flex)?;
    (el.style.aligns_end() || el.has_class("items-end") || el.has_class("justify-end"))
        .then_some(Role::User)
}

/// Like [`flex_end_alignment`], but also reads start alignment as the assistant.
pub fn flex_alignment(doc: &Document, node: NodeId) -> Option<Role> {
    if let Some(role) = flex_end_alignment(doc, node) {
        return Some(role);
    }
    let flex = doc.closest(node, is_flex_container)?;
    let el = doc.element(flex)?;
    (el.style.aligns_start() || el.has_class("items-start") || el.has_class("justify-start"))
        .then_some(Role::Assistant)
}

fn is_flex_container(el: &Element) -> bool {
    el.has_class("flex") || el.style.display.as_deref() == Some("flex")
}

/// Avatar `alt` text near the message (two levels up).
pub fn avatar_alt(doc: &Document, node: NodeId) -> Option<Role> {
    let scope = doc.ancestors(node).nth(1).or_else(|| doc.parent(node))?;
    let img = doc.find(scope, |el| el.is("img") && el.has_attr("alt"))?;
    let alt = doc.element(img)?.attr("alt")?.to_lowercase();
    let words: Vec<&str> = alt.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
    let has = |names: &[&str]| words.iter().any(|w| names.contains(w));
    if has(&["user", "you"]) {
        Some(Role::User)
    } else if has(&["assistant", "claude", "chatgpt", "gemini", "deepseek", "grok"]) {
        Some(Role::Assistant)
    } else {
        None
    }
}

/// A leading `You:`/`User:` label marks a user turn.
pub fn user_label_prefix(doc: &Document, node: NodeId) -> Option<Role> {
    let text = doc.text_content(node);
    let text = text.trim_start();
    (text.starts_with("You:") || text.starts_with("User:")).then_some(Role::User)
}

/// Short text ending in a question mark reads as a user prompt.
pub fn short_question(doc: &Document, node: NodeId) -> Option<Role> {
    let text = doc.text_content(node);
    let text = text.trim();
    (text.chars().count() < 200 && text.ends_with('?')).then_some(Role::User)
}

/// Turn-taking: the opposite of the previous sibling's explicit role.
pub fn sibling_alternation(doc: &Document, node: NodeId) -> Option<Role> {
    let previous = doc.previous_element_sibling(node)?;
    let el = doc.element(previous)?;
    let role = attribute_role(el).or_else(|| explicit_class_role(el))?;
    Some(role.opposite())
}

fn explicit_class_role(el: &Element) -> Option<Role> {
    if el.has_class("user") || el.class_contains("user-message") {
        Some(Role::User)
    } else if el.has_class("assistant") || el.class_contains("assistant-message") {
        Some(Role::Assistant)
    } else {
        None
    }
}
