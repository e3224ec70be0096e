//! Claude (`claude.ai`).
//!
//! Claude marks turns with font classes (`font-user-message`,
//! `font-claude-message`) that have been renamed more than once, so the
//! candidate rule also accepts the streaming marker and the bare text wrapper.
//! Nested matches fold into the outermost turn.

use super::heuristics::{
    RoleHeuristic, ancestor_role_attribute, avatar_alt, flex_end_alignment, role_attribute,
    short_question, sibling_alternation,
};
use super::{
    AttachmentProfile, ElementPredicate, ExtractError, Platform, PlatformAdapter, Profile,
    TextOptions, attached_element, message_id_attribute,
};
use crate::identity::{CandidateFacts, ResolvedIdentity};
use crate::models::Role;
use crate::scheduler::navigation::IdPattern;
use crate::tree::{Document, Element, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Claude;

const ROLES: &[RoleHeuristic] = &[
    role_attribute,
    streaming_marker,
    font_class,
    ancestor_role_attribute,
    grid_layout,
    avatar_alt,
    flex_end_alignment,
    short_question,
    sibling_alternation,
];

const CONTAINERS: &[ElementPredicate] =
    &[is_scroll_main, super::chatgpt::is_main, super::chatgpt::has_main_role];

const TEXT_CONTAINERS: &[ElementPredicate] = &[is_pre_wrap, is_prose];

fn is_scroll_main(el: &Element) -> bool {
    el.is("main") && el.class_contains("react-scroll")
}

fn is_pre_wrap(el: &Element) -> bool {
    el.has_class("whitespace-pre-wrap")
}

fn is_prose(el: &Element) -> bool {
    el.class_contains("prose")
}

fn is_candidate(doc: &Document, node: NodeId) -> bool {
    let Some(el) = doc.element(node) else {
        return false;
    };
    if el.has_class("font-user-message")
        || el.has_class("font-claude-message")
        || el.has_attr("data-is-streaming")
    {
        return true;
    }
    if !el.is("div") {
        return false;
    }
    if el.has_class("whitespace-pre-wrap") && el.has_class("break-words") {
        return true;
    }
    el.class_contains("font")
        && doc
            .parent(node)
            .and_then(|p| doc.element(p))
            .is_some_and(|parent| parent.class_contains("contents"))
}

/// Streaming output is always a reply.
fn streaming_marker(doc: &Document, node: NodeId) -> Option<Role> {
    doc.element(node)?.has_attr("data-is-streaming").then_some(Role::Assistant)
}

fn font_class(doc: &Document, node: NodeId) -> Option<Role> {
    let el = doc.element(node)?;
    if el.has_class("font-user-message") {
        Some(Role::User)
    } else if el.has_class("font-claude-message") {
        Some(Role::Assistant)
    } else {
        None
    }
}

/// User turns sit in a grid with an accent bubble or an `auto` column.
fn grid_layout(doc: &Document, node: NodeId) -> Option<Role> {
    let grid = doc.closest(node, |el| el.has_class("grid"))?;
    let has_accent = doc.find(grid, |el| el.has_class("bg-accent")).is_some();
    let auto_columns = doc
        .element(grid)?
        .style
        .grid_template_columns
        .as_deref()
        .is_some_and(|cols| cols.contains("auto"));
    (has_accent || auto_columns).then_some(Role::User)
}

static PROFILE: Profile = Profile {
    containers: CONTAINERS,
    candidate: is_candidate,
    roles: ROLES,
    text: TextOptions { skip_tags: &["code"], skip_class_fragments: &["copy"] },
    text_containers: TEXT_CONTAINERS,
    attachments: AttachmentProfile::new(100, &["avatar", "claude", "user"]),
    min_text_len: 3,
    conversation: &[IdPattern::PathAfter(&["chat"])],
};

impl PlatformAdapter for Claude {
    fn platform(&self) -> Platform {
        Platform::Claude
    }

    fn profile(&self) -> &'static Profile {
        &PROFILE
    }

    /// `data-message-id` first, then the turn's own `id` attribute.
    ///
    /// Ancestor `id`s are ignored: they belong to layout wrappers shared by
    /// many turns and would merge them into one identity.
    fn compute_identity(
        &self,
        doc: &Document,
        node: NodeId,
        facts: &CandidateFacts<'_>,
    ) -> Result<ResolvedIdentity, ExtractError> {
        let el = attached_element(doc, node)?;
        if let Some(id) = message_id_attribute(doc, node) {
            return Ok(ResolvedIdentity::durable(id));
        }
        if let Some(id) = el.id().filter(|id| !id.is_empty()) {
            return Ok(ResolvedIdentity::durable(id));
        }
        Ok(ResolvedIdentity::fallback(self.platform().name(), facts))
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::identity::IdentitySource;
    use crate::tree::Style;

    fn doc() -> (Document, NodeId) {
        let mut doc = Document::new(Url::parse("https://claude.ai/chat/4f1e").unwrap());
        let root = doc.root();
        let main = doc.create_element(Element::new("main").with_class("react-scroll-to-bottom"));
        doc.append_child(root, main).unwrap();
        (doc, main)
    }

    fn add(doc: &mut Document, parent: NodeId, el: Element, text: Option<&str>) -> NodeId {
        let node = doc.create_element(el);
        if let Some(text) = text {
            let t = doc.create_text(text);
            doc.append_child(node, t).unwrap();
        }
        doc.append_child(parent, node).unwrap();
        node
    }

    #[test]
    fn test_font_classes_and_folding() {
        let (mut doc, main) = doc();
        let user = add(&mut doc, main, Element::new("div").with_class("font-user-message"), None);
        add(
            &mut doc,
            user,
            Element::new("div").with_class("whitespace-pre-wrap break-words"),
            Some("What is a monad"),
        );
        let reply =
            add(&mut doc, main, Element::new("div").with_class("font-claude-message"), Some("A monoid."));

        assert_eq!(Claude.locate_container(&doc), main);
        let candidates = Claude.locate_candidates(&doc, main);
        assert_eq!(candidates, vec![user, reply]);
        assert_eq!(Claude.classify_role(&doc, user), Role::User);
        assert_eq!(Claude.classify_role(&doc, reply), Role::Assistant);
    }

    #[test]
    fn test_streaming_is_assistant() {
        let (mut doc, main) = doc();
        let node = add(
            &mut doc,
            main,
            Element::new("div").with_attr("data-is-streaming", "true"),
            Some("Are you sure?"),
        );
        // The question mark alone would say user; the streaming marker ranks higher.
        assert_eq!(Claude.classify_role(&doc, node), Role::Assistant);
    }

    #[test]
    fn test_grid_layout_marks_user() {
        let (mut doc, main) = doc();
        let grid = add(
            &mut doc,
            main,
            Element::new("div").with_class("grid").with_style(Style {
                grid_template_columns: Some("auto 1fr".into()),
                ..Style::default()
            }),
            None,
        );
        let node = add(&mut doc, grid, Element::new("div"), Some("Plain statement."));
        assert_eq!(Claude.classify_role(&doc, node), Role::User);
    }

    #[test]
    fn test_preview_skips_code_labels_and_copy_buttons() {
        let (mut doc, main) = doc();
        let node = add(&mut doc, main, Element::new("div").with_class("font-claude-message"), None);
        let prose = add(&mut doc, node, Element::new("div").with_class("prose"), Some("Claude: Try this"));
        add(&mut doc, prose, Element::new("code"), Some("let x = 1;"));
        add(&mut doc, prose, Element::new("span").with_class("copy-label"), Some("Copy"));

        assert_eq!(Claude.extract_preview(&doc, node).unwrap(), "Try this");
    }

    #[test]
    fn test_identity_prefers_own_id_then_fallback() {
        let (mut doc, main) = doc();
        let with_id = add(
            &mut doc,
            main,
            Element::new("div").with_class("font-user-message").with_attr("id", "turn-7"),
            Some("hello there"),
        );
        let without = add(&mut doc, main, Element::new("div").with_class("font-claude-message"), None);
        let facts = CandidateFacts { role: Role::Assistant, preview: "hi", position: 1 };

        let own = Claude.compute_identity(&doc, with_id, &facts).unwrap();
        assert_eq!(own.identity.as_str(), "turn-7");

        let fallback = Claude.compute_identity(&doc, without, &facts).unwrap();
        assert_eq!(fallback.source, IdentitySource::Fallback);
        assert!(fallback.identity.as_str().starts_with("claude-assistant-1-"));
    }

    #[test]
    fn test_detached_node_fails_extraction() {
        let (mut doc, main) = doc();
        let node = add(&mut doc, main, Element::new("div").with_class("font-user-message"), Some("hey"));
        doc.remove(node).unwrap();
        assert_eq!(Claude.extract_preview(&doc, node), Err(ExtractError::Detached(node)));
    }
}
