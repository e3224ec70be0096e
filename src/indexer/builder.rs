//! Index builder: one full rescan of the document.
//!
//! A rescan is split in two so the runtime can model a scan that yields
//! between reading the tree and publishing its result:
//!
//! 1. [`collect`] resolves the container and turns every candidate into a
//!    [`Message`], producing a [`Draft`]
//! 2. [`commit`] numbers the user turns, applies the retention guard, and
//!    swaps the draft into the [`Session`]
//!
//! [`rescan`] runs both back to back.

use tracing::{debug, info};

use super::diff::IndexDiff;
use crate::adapters::text::truncate_code_units;
use crate::adapters::{ExtractError, PlatformAdapter};
use crate::config::EngineConfig;
use crate::identity::{CandidateFacts, SeenSet};
use crate::models::{Index, Message, Role};
use crate::session::Session;
use crate::tree::{Document, NodeId};

/// Result of reading the tree, not yet published.
#[derive(Debug, Clone)]
pub struct Draft {
    pub container: NodeId,
    /// Candidates enumerated before validation.
    pub candidates: usize,
    pub messages: Vec<Message>,
    /// Candidates dropped as invalid, failing, or duplicate.
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescanOutcome {
    /// The draft replaced the index and the consumer should be notified.
    Accepted(IndexDiff),
    /// The draft was empty while the previous index was not; the index was kept.
    Retained { kept: usize },
    /// No usable container yet; retry later.
    ContainerUnresolved,
}

/// Reads the document through `adapter`. Returns `None` when the container
/// is detached or has nothing rendered in it yet.
pub fn collect<A: PlatformAdapter>(adapter: &A, doc: &Document, config: &EngineConfig) -> Option<Draft> {
    let container = adapter.locate_container(doc);
    if !doc.is_attached(container) || doc.children(container).is_empty() {
        debug!(platform = %adapter.platform(), %container, "container unresolved");
        return None;
    }

    let candidates = adapter.locate_candidates(doc, container);
    let mut seen = SeenSet::new();
    let mut messages = Vec::with_capacity(candidates.len());
    let mut dropped = 0;

    for (position, &node) in candidates.iter().enumerate() {
        if !adapter.is_valid_candidate(doc, node) {
            dropped += 1;
            continue;
        }
        let message = match extract(adapter, doc, node, position, config) {
            Ok(message) => message,
            Err(err) => {
                debug!(%node, error = %err, "candidate dropped");
                dropped += 1;
                continue;
            }
        };
        if !seen.insert(&message.identity) {
            debug!(identity = %message.identity, "duplicate identity in scan");
            dropped += 1;
            continue;
        }
        messages.push(message);
    }

    debug!(
        platform = %adapter.platform(),
        candidates = candidates.len(),
        entries = messages.len(),
        dropped,
        "draft collected"
    );
    Some(Draft { container, candidates: candidates.len(), messages, dropped })
}

fn extract<A: PlatformAdapter>(
    adapter: &A,
    doc: &Document,
    node: NodeId,
    position: usize,
    config: &EngineConfig,
) -> Result<Message, ExtractError> {
    let role = adapter.classify_role(doc, node);
    let preview = adapter.extract_preview(doc, node)?;
    let preview = truncate_code_units(&preview, config.preview_limit).trim_end().to_string();
    let full_text = adapter.extract_full_text(doc, node)?;
    let attachment = adapter.extract_attachment_kind(doc, node)?;
    let facts = CandidateFacts { role, preview: &preview, position };
    let resolved = adapter.compute_identity(doc, node, &facts)?;

    Ok(Message {
        identity: resolved.identity,
        identity_source: resolved.source,
        role,
        preview,
        full_text,
        attachment,
        serial: None,
        source: node,
    })
}

/// Numbers user turns 1..=N in order; assistant turns carry no serial.
pub fn assign_serials(messages: &mut [Message]) {
    let mut next = 0u32;
    for message in messages {
        message.serial = match message.role {
            Role::User => {
                next += 1;
                Some(next)
            }
            Role::Assistant => None,
        };
    }
}

/// Publishes a draft into the session, unless the retention guard keeps the old index.
pub fn commit(session: &mut Session, draft: Draft) -> RescanOutcome {
    let mut messages = draft.messages;
    assign_serials(&mut messages);

    if messages.is_empty() && !session.index().is_empty() && !session.switched_since_build() {
        info!(
            session = %session.id(),
            kept = session.index().len(),
            "empty rescan ignored, keeping previous index"
        );
        return RescanOutcome::Retained { kept: session.index().len() };
    }

    let diff = IndexDiff::between(session.index(), &messages, session.identities());
    debug!(
        session = %session.id(),
        entries = messages.len(),
        added = diff.added.len(),
        removed = diff.removed.len(),
        upgraded = diff.upgraded.len(),
        "index accepted"
    );
    session.accept(Index::from_messages(messages));
    RescanOutcome::Accepted(diff)
}

/// Collects and commits in one step.
pub fn rescan<A: PlatformAdapter>(
    adapter: &A,
    doc: &Document,
    session: &mut Session,
    config: &EngineConfig,
) -> RescanOutcome {
    match collect(adapter, doc, config) {
        Some(draft) => commit(session, draft),
        None => RescanOutcome::ContainerUnresolved,
    }
}
