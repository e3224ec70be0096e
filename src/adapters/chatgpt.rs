//! ChatGPT (`chatgpt.com`, `chat.openai.com`).
//!
//! Every turn carries `data-message-author-role`, and most carry a
//! `data-message-id`, so this is the most reliable platform.

use super::heuristics::{
    RoleHeuristic, ancestor_role_attribute, flex_end_alignment, role_attribute, sibling_alternation,
    user_label_prefix,
};
use super::{AttachmentProfile, ElementPredicate, Platform, PlatformAdapter, Profile, TextOptions};
use crate::scheduler::navigation::IdPattern;
use crate::tree::{Document, Element, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatGpt;

const ROLES: &[RoleHeuristic] = &[
    role_attribute,
    ancestor_role_attribute,
    flex_end_alignment,
    user_label_prefix,
    sibling_alternation,
];

const CONTAINERS: &[ElementPredicate] = &[is_main, has_main_role];

const TEXT_CONTAINERS: &[ElementPredicate] = &[is_markdown, is_pre_wrap];

pub(super) fn is_main(el: &Element) -> bool {
    el.is("main")
}

pub(super) fn has_main_role(el: &Element) -> bool {
    el.attr("role") == Some("main")
}

fn is_markdown(el: &Element) -> bool {
    el.has_class("markdown")
}

fn is_pre_wrap(el: &Element) -> bool {
    el.has_class("whitespace-pre-wrap")
}

fn is_candidate(doc: &Document, node: NodeId) -> bool {
    doc.element(node).is_some_and(|el| el.has_attr("data-message-author-role"))
}

static PROFILE: Profile = Profile {
    containers: CONTAINERS,
    candidate: is_candidate,
    roles: ROLES,
    text: TextOptions { skip_tags: &[], skip_class_fragments: &["sr-only"] },
    text_containers: TEXT_CONTAINERS,
    attachments: AttachmentProfile {
        upload_classes: &["upload", "attachment", "file", "grid"],
        ..AttachmentProfile::new(30, &["avatar", "user", "chatgpt"])
    },
    min_text_len: 3,
    conversation: &[IdPattern::PathAfter(&["c"])],
};

impl PlatformAdapter for ChatGpt {
    fn platform(&self) -> Platform {
        Platform::ChatGpt
    }

    fn profile(&self) -> &'static Profile {
        &PROFILE
    }
}
