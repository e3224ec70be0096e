//! Grok (`grok.com`, and the Grok pane on `x.com`).
//!
//! On X every turn is a timeline cell (`data-testid="cellInnerDiv"`); Grok's
//! replies carry the Grok mark, anything else in a cell is the user. On
//! grok.com turns are `message-bubble` elements aligned like other chat UIs.

use super::heuristics::{
    RoleHeuristic, ancestor_role_attribute, flex_alignment, role_attribute, sibling_alternation,
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
pub struct Grok;

const CELL: &str = "cellInnerDiv";

const ROLES: &[RoleHeuristic] = &[
    role_attribute,
    grok_mark,
    ancestor_role_attribute,
    flex_alignment,
    sibling_alternation,
    unmarked_cell,
];

const CONTAINERS: &[ElementPredicate] = &[super::chatgpt::is_main];

fn is_cell(el: &Element) -> bool {
    el.attr("data-testid") == Some(CELL)
}

fn is_candidate(doc: &Document, node: NodeId) -> bool {
    doc.element(node).is_some_and(|el| is_cell(el) || el.has_class("message-bubble"))
}

/// Grok's icon (`svg[aria-label="Grok"]`) or a leading "Grok" header.
fn grok_mark(doc: &Document, node: NodeId) -> Option<Role> {
    let icon = doc.find(node, |el| el.is("svg") && el.attr("aria-label") == Some("Grok"));
    let header = doc.text_content(node).trim_start().starts_with("Grok");
    (icon.is_some() || header).then_some(Role::Assistant)
}

/// A timeline cell without the Grok mark was written by the user.
fn unmarked_cell(doc: &Document, node: NodeId) -> Option<Role> {
    doc.element(node).filter(|el| is_cell(el)).map(|_| Role::User)
}

/// Status id from a `/status/{id}` permalink inside the cell.
fn status_id(doc: &Document, node: NodeId) -> Option<String> {
    doc.find_all(node, |el| el.is("a")).into_iter().find_map(|link| {
        let href = doc.element(link)?.attr("href")?;
        let (_, rest) = href.split_once("/status/")?;
        let id = rest.split(['/', '?', '#']).next()?;
        (!id.is_empty()).then(|| format!("status-{id}"))
    })
}

static PROFILE: Profile = Profile {
    containers: CONTAINERS,
    candidate: is_candidate,
    roles: ROLES,
    text: TextOptions { skip_tags: &[], skip_class_fragments: &[] },
    text_containers: &[],
    attachments: AttachmentProfile {
        upload_srcs: &["blob:", "/files", "upload", "media"],
        ..AttachmentProfile::new(50, &["avatar", "user", "grok", "profile"])
    },
    min_text_len: 3,
    conversation: &[IdPattern::PathAfter(&["chat"]), IdPattern::Query("conversation")],
};

impl PlatformAdapter for Grok {
    fn platform(&self) -> Platform {
        Platform::Grok
    }

    fn profile(&self) -> &'static Profile {
        &PROFILE
    }

    fn compute_identity(
        &self,
        doc: &Document,
        node: NodeId,
        facts: &CandidateFacts<'_>,
    ) -> Result<ResolvedIdentity, ExtractError> {
        attached_element(doc, node)?;
        Ok(message_id_attribute(doc, node)
            .or_else(|| status_id(doc, node))
            .map(ResolvedIdentity::durable)
            .unwrap_or_else(|| ResolvedIdentity::fallback(self.platform().name(), facts)))
    }
}
