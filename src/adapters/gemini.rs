//! Gemini (`gemini.google.com`).
//!
//! Gemini keeps drafts and earlier renderings of a reply in the tree next to
//! the visible one. Only the final `message-content` elements are candidates,
//! and hidden copies are dropped by the rendered check.

use super::heuristics::{
    RoleHeuristic, ancestor_role_attribute, role_attribute, sibling_alternation, user_label_prefix,
};
use super::{AttachmentProfile, ElementPredicate, Platform, PlatformAdapter, Profile, TextOptions};
use crate::models::Role;
use crate::scheduler::navigation::IdPattern;
use crate::tree::{Document, Element, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gemini;

const ROLES: &[RoleHeuristic] = &[
    role_attribute,
    query_class,
    ancestor_role_attribute,
    query_container,
    user_label_prefix,
    sibling_alternation,
];

const CONTAINERS: &[ElementPredicate] = &[is_chat_window, is_main_region, is_conversation_container];

const TEXT_CONTAINERS: &[ElementPredicate] = &[is_markdown];

fn is_chat_window(el: &Element) -> bool {
    el.is("chat-window")
}

fn is_main_region(el: &Element) -> bool {
    el.is("main") && el.attr("role") == Some("main")
}

fn is_conversation_container(el: &Element) -> bool {
    el.has_class("conversation-container")
}

fn is_markdown(el: &Element) -> bool {
    el.has_class("markdown-content") || el.has_class("message-text-content")
}

fn is_candidate(doc: &Document, node: NodeId) -> bool {
    doc.element(node).is_some_and(|el| {
        (el.is("message-content") && (el.has_class("model-response-text") || el.has_class("user-query")))
            || el.has_attr("data-augmented-ui-role")
    })
}

fn query_class(doc: &Document, node: NodeId) -> Option<Role> {
    let el = doc.element(node)?;
    if el.has_class("user-query") {
        Some(Role::User)
    } else if el.has_class("model-response-text") {
        Some(Role::Assistant)
    } else {
        None
    }
}

fn query_container(doc: &Document, node: NodeId) -> Option<Role> {
    doc.closest(node, |el| el.has_class("user-query-container")).map(|_| Role::User)
}

static PROFILE: Profile = Profile {
    containers: CONTAINERS,
    candidate: is_candidate,
    roles: ROLES,
    text: TextOptions { skip_tags: &[], skip_class_fragments: &["tooltip"] },
    text_containers: TEXT_CONTAINERS,
    attachments: AttachmentProfile::new(100, &["avatar", "user", "gemini"]),
    min_text_len: 5,
    conversation: &[
        IdPattern::PathAfter(&["app"]),
        IdPattern::PathAfter(&["gem", "*"]),
        IdPattern::Query("thread_id"),
    ],
};

impl PlatformAdapter for Gemini {
    fn platform(&self) -> Platform {
        Platform::Gemini
    }

    fn profile(&self) -> &'static Profile {
        &PROFILE
    }
}
