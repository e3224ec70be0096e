//! DeepSeek (`chat.deepseek.com`).
//!
//! Turns are plain flex columns with no role attribute. User turns are
//! right-aligned (`items-end`) and carry the user avatar.

use super::heuristics::{
    RoleHeuristic, ancestor_role_attribute, flex_end_alignment, role_attribute, sibling_alternation,
    user_label_prefix,
};
use super::{AttachmentProfile, ElementPredicate, Platform, PlatformAdapter, Profile, TextOptions};
use crate::models::Role;
use crate::scheduler::navigation::IdPattern;
use crate::tree::{Document, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeepSeek;

const ROLES: &[RoleHeuristic] = &[
    role_attribute,
    aligned_end,
    ancestor_role_attribute,
    flex_end_alignment,
    user_avatar,
    user_label_prefix,
    sibling_alternation,
];

const CONTAINERS: &[ElementPredicate] = &[super::chatgpt::is_main];

fn is_candidate(doc: &Document, node: NodeId) -> bool {
    doc.element(node).is_some_and(|el| {
        el.has_class("ds-message")
            || (el.is("div") && el.has_class("flex") && el.has_class("w-full") && el.has_class("flex-col"))
    })
}

fn aligned_end(doc: &Document, node: NodeId) -> Option<Role> {
    doc.element(node)?.has_class("items-end").then_some(Role::User)
}

fn user_avatar(doc: &Document, node: NodeId) -> Option<Role> {
    doc.find(node, |el| el.class_contains("ds-user-avatar")).map(|_| Role::User)
}

static PROFILE: Profile = Profile {
    containers: CONTAINERS,
    candidate: is_candidate,
    roles: ROLES,
    text: TextOptions { skip_tags: &[], skip_class_fragments: &["ds-icon"] },
    text_containers: &[],
    attachments: AttachmentProfile::new(40, &["avatar", "user", "deepseek"]),
    min_text_len: 3,
    // The longer share path must win over the plain chat path.
    conversation: &[IdPattern::PathAfter(&["a", "chat", "s"]), IdPattern::PathAfter(&["chat"])],
};

impl PlatformAdapter for DeepSeek {
    fn platform(&self) -> Platform {
        Platform::DeepSeek
    }

    fn profile(&self) -> &'static Profile {
        &PROFILE
    }
}
