//! Perplexity (`perplexity.ai`).
//!
//! Queries and answers live in `group/query` and `group/answer` blocks. Answers
//! are wrapped in source cards and buttons, so the preview reads the `prose`
//! body when there is one.

use super::attachments::node_scope;
use super::heuristics::{
    RoleHeuristic, ancestor_role_attribute, role_attribute, sibling_alternation,
};
use super::{AttachmentProfile, ElementPredicate, Platform, PlatformAdapter, Profile, TextOptions};
use crate::models::Role;
use crate::scheduler::navigation::IdPattern;
use crate::tree::{Document, Element, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Perplexity;

const ROLES: &[RoleHeuristic] = &[
    role_attribute,
    group_class,
    ancestor_role_attribute,
    enclosing_group,
    query_heading,
    sibling_alternation,
];

const CONTAINERS: &[ElementPredicate] = &[super::chatgpt::is_main];

const TEXT_CONTAINERS: &[ElementPredicate] = &[is_prose];

fn is_prose(el: &Element) -> bool {
    el.class_contains("prose")
}

fn is_candidate(doc: &Document, node: NodeId) -> bool {
    doc.element(node).is_some_and(|el| {
        el.has_class("group/query")
            || el.has_class("group/answer")
            || (el.is("div") && el.attr("dir") == Some("auto"))
    })
}

fn group_role(el: &Element) -> Option<Role> {
    if el.has_class("group/query") {
        Some(Role::User)
    } else if el.has_class("group/answer") {
        Some(Role::Assistant)
    } else {
        None
    }
}

fn group_class(doc: &Document, node: NodeId) -> Option<Role> {
    doc.element(node).and_then(group_role)
}

/// A bare `dir="auto"` text block inherits the role of its query/answer group.
fn enclosing_group(doc: &Document, node: NodeId) -> Option<Role> {
    doc.ancestors(node).find_map(|a| doc.element(a).and_then(group_role))
}

/// The query is rendered as the page heading.
fn query_heading(doc: &Document, node: NodeId) -> Option<Role> {
    doc.find(node, |el| el.is("h1")).map(|_| Role::User)
}

static PROFILE: Profile = Profile {
    containers: CONTAINERS,
    candidate: is_candidate,
    roles: ROLES,
    text: TextOptions { skip_tags: &[], skip_class_fragments: &["citation"] },
    text_containers: TEXT_CONTAINERS,
    attachments: AttachmentProfile {
        scope: node_scope,
        ..AttachmentProfile::new(100, &["avatar", "user", "favicon", "perplexity"])
    },
    min_text_len: 3,
    conversation: &[IdPattern::PathAfter(&["search"])],
};

impl PlatformAdapter for Perplexity {
    fn platform(&self) -> Platform {
        Platform::Perplexity
    }

    fn profile(&self) -> &'static Profile {
        &PROFILE
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

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
    fn test_query_and_answer_groups() {
        let mut doc =
            Document::new(Url::parse("https://www.perplexity.ai/search/rust-async-Xy12").unwrap());
        let root = doc.root();
        let main = add(&mut doc, root, Element::new("main"), None);
        let query = add(&mut doc, main, Element::new("div").with_class("group/query"), None);
        add(&mut doc, query, Element::new("h1"), Some("rust async runtimes"));
        let answer = add(&mut doc, main, Element::new("div").with_class("group/answer"), None);
        add(&mut doc, answer, Element::new("button"), Some("Sources"));
        let prose = add(&mut doc, answer, Element::new("div").with_class("prose"), None);
        add(&mut doc, prose, Element::new("div").with_attr("dir", "auto"), Some("Tokio is the most used."));

        assert_eq!(Perplexity.locate_container(&doc), main);
        assert_eq!(Perplexity.locate_candidates(&doc, main), vec![query, answer]);
        assert_eq!(Perplexity.classify_role(&doc, query), Role::User);
        assert_eq!(Perplexity.classify_role(&doc, answer), Role::Assistant);
        assert_eq!(Perplexity.extract_preview(&doc, answer).unwrap(), "Tokio is the most used.");
        assert_eq!(Perplexity.conversation_id(doc.location()), "rust-async-Xy12");
    }

    #[test]
    fn test_bare_text_block_inherits_group_role() {
        let mut doc = Document::new(Url::parse("https://perplexity.ai/search/x").unwrap());
        let root = doc.root();
        let query = add(&mut doc, root, Element::new("section").with_class("group/query"), None);
        let inner = add(&mut doc, query, Element::new("div").with_attr("dir", "auto"), Some("why"));
        assert_eq!(Perplexity.classify_role(&doc, inner), Role::User);
    }
}
