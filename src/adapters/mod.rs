//! Platform adapters.
//!
//! Every supported chat platform renders conversations differently and changes
//! its markup without notice. An adapter hides that behind one capability set:
//! find the container, enumerate candidate nodes, classify roles, extract
//! previews and attachment kinds, and compute identities.
//!
//! # Architecture
//!
//! - [`PlatformAdapter`] is the capability trait. Most behaviour is provided
//!   from a static [`Profile`] (selectors, heuristic chain, thresholds), and a
//!   platform overrides a method only where its markup needs it.
//! - [`Adapter`] is the tagged variant selected once per session from the
//!   document origin, so the rest of the engine is generic over one concrete type.
//!
//! # Error Handling Strategy
//!
//! Extraction steps return [`ExtractError`] for a single candidate. The index
//! builder logs the error and drops that candidate; a failing candidate never
//! aborts a rescan. Role classification and container lookup cannot fail.

pub mod attachments;
pub mod chatgpt;
pub mod claude;
pub mod deepseek;
pub mod gemini;
pub mod grok;
pub mod heuristics;
pub mod perplexity;
pub mod text;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::identity::{CandidateFacts, ResolvedIdentity};
use crate::models::{AttachmentKind, Role};
use crate::scheduler::navigation::{IdPattern, extract_conversation_id};
use crate::tree::{Document, Element, NodeId};
use crate::validator::Validator;

pub use attachments::AttachmentProfile;
pub use chatgpt::ChatGpt;
pub use claude::Claude;
pub use deepseek::DeepSeek;
pub use gemini::Gemini;
pub use grok::Grok;
pub use heuristics::RoleHeuristic;
pub use perplexity::Perplexity;
pub use text::{PREVIEW_LIMIT, TextOptions};

/// Failure to extract one field from one candidate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("node {0} is no longer attached to the document")]
    Detached(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0} has no visible text")]
    EmptyText(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    ChatGpt,
    Claude,
    Gemini,
    Perplexity,
    DeepSeek,
    Grok,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::ChatGpt,
        Platform::Claude,
        Platform::Gemini,
        Platform::Perplexity,
        Platform::DeepSeek,
        Platform::Grok,
    ];

    /// Maps a document host to its platform. Subdomains match (`www.perplexity.ai`).
    pub fn from_host(host: &str) -> Option<Platform> {
        let host = host.to_ascii_lowercase();
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if matches("chatgpt.com") || matches("chat.openai.com") {
            Some(Platform::ChatGpt)
        } else if matches("gemini.google.com") {
            Some(Platform::Gemini)
        } else if matches("claude.ai") {
            Some(Platform::Claude)
        } else if matches("grok.com") || matches("x.com") {
            Some(Platform::Grok)
        } else if matches("deepseek.com") {
            Some(Platform::DeepSeek)
        } else if matches("perplexity.ai") {
            Some(Platform::Perplexity)
        } else {
            None
        }
    }

    /// Short lowercase name, also the prefix of fallback identities.
    pub fn name(self) -> &'static str {
        match self {
            Platform::ChatGpt => "chatgpt",
            Platform::Claude => "claude",
            Platform::Gemini => "gemini",
            Platform::Perplexity => "perplexity",
            Platform::DeepSeek => "deepseek",
            Platform::Grok => "grok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type ElementPredicate = fn(&Element) -> bool;
pub type CandidatePredicate = fn(&Document, NodeId) -> bool;

/// Static description of a platform's markup.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    /// Container selectors, most stable first.
    pub containers: &'static [ElementPredicate],
    pub candidate: CandidatePredicate,
    pub roles: &'static [RoleHeuristic],
    pub text: TextOptions,
    /// Preferred inner text wrappers, tried in order before the candidate itself.
    pub text_containers: &'static [ElementPredicate],
    pub attachments: AttachmentProfile,
    pub min_text_len: usize,
    /// Conversation id patterns, tried in order.
    pub conversation: &'static [IdPattern],
}

pub trait PlatformAdapter {
    fn platform(&self) -> Platform;

    fn profile(&self) -> &'static Profile;

    /// Most stable node hosting every message. Never fails; falls back to the root.
    ///
    /// A container selector only wins if something under it looks like a
    /// message. When none does, the first existing container is used so the
    /// change scheduler still has something narrow to watch.
    fn locate_container(&self, doc: &Document) -> NodeId {
        let profile = self.profile();
        let root = doc.root();
        let mut first_existing = None;

        for selector in profile.containers {
            let Some(found) = std::iter::once(root)
                .chain(doc.descendants(root))
                .find(|n| doc.element(*n).is_some_and(selector))
            else {
                continue;
            };
            if doc.descendants(found).into_iter().any(|n| (profile.candidate)(doc, n)) {
                return found;
            }
            first_existing.get_or_insert(found);
        }
        first_existing.unwrap_or(root)
    }

    /// Rendered candidate nodes under `container`, in document order.
    fn locate_candidates(&self, doc: &Document, container: NodeId) -> Vec<NodeId> {
        collect_candidates(doc, container, self.profile().candidate)
    }

    fn classify_role(&self, doc: &Document, node: NodeId) -> Role {
        heuristics::classify(self.profile().roles, doc, node)
    }

    fn extract_preview(&self, doc: &Document, node: NodeId) -> Result<String, ExtractError> {
        let raw = self.raw_text(doc, node)?;
        let preview = text::normalize_preview(&raw, PREVIEW_LIMIT);
        if preview.is_empty() {
            return Err(ExtractError::EmptyText(node));
        }
        Ok(preview)
    }

    /// Whole visible text with collapsed whitespace; input for title generation.
    fn extract_full_text(&self, doc: &Document, node: NodeId) -> Result<String, ExtractError> {
        let raw = self.raw_text(doc, node)?;
        Ok(text::collapse_whitespace(&raw))
    }

    fn extract_attachment_kind(
        &self,
        doc: &Document,
        node: NodeId,
    ) -> Result<AttachmentKind, ExtractError> {
        attached_element(doc, node)?;
        Ok(attachments::detect(doc, node, &self.profile().attachments))
    }

    /// Platform-supplied id when present, deterministic fallback otherwise.
    fn compute_identity(
        &self,
        doc: &Document,
        node: NodeId,
        facts: &CandidateFacts<'_>,
    ) -> Result<ResolvedIdentity, ExtractError> {
        attached_element(doc, node)?;
        Ok(message_id_attribute(doc, node)
            .map(ResolvedIdentity::durable)
            .unwrap_or_else(|| ResolvedIdentity::fallback(self.platform().name(), facts)))
    }

    fn is_valid_candidate(&self, doc: &Document, node: NodeId) -> bool {
        let profile = self.profile();
        Validator::new(profile.min_text_len).check(doc, node, &profile.text).is_valid()
    }

    fn conversation_id(&self, url: &Url) -> String {
        extract_conversation_id(url, self.profile().conversation)
    }

    /// Visible text of the preferred text wrapper (or the node itself).
    fn raw_text(&self, doc: &Document, node: NodeId) -> Result<String, ExtractError> {
        attached_element(doc, node)?;
        let profile = self.profile();
        let source = profile
            .text_containers
            .iter()
            .find_map(|selector| doc.find(node, selector))
            .unwrap_or(node);
        Ok(text::visible_text(doc, source, &profile.text))
    }
}

/// Resolves `node` to an attached element or explains why it cannot be read.
pub fn attached_element(doc: &Document, node: NodeId) -> Result<&Element, ExtractError> {
    let el = doc.element(node).ok_or(ExtractError::NotAnElement(node))?;
    if !doc.is_attached(node) {
        return Err(ExtractError::Detached(node));
    }
    Ok(el)
}

/// `data-message-id` on the node or its nearest ancestor.
pub fn message_id_attribute(doc: &Document, node: NodeId) -> Option<String> {
    let holder = doc.closest(node, |el| el.has_attr("data-message-id"))?;
    doc.element(holder)?.attr("data-message-id").filter(|v| !v.is_empty()).map(str::to_string)
}

/// Rendered nodes under `container` matching `candidate`, in document order.
///
/// A candidate nested inside an accepted candidate is folded into it, so a
/// message whose inner text wrapper also matches is only counted once.
pub fn collect_candidates(
    doc: &Document,
    container: NodeId,
    candidate: CandidatePredicate,
) -> Vec<NodeId> {
    let mut accepted: Vec<NodeId> = Vec::new();
    let mut members: HashSet<NodeId> = HashSet::new();

    for node in doc.descendants(container) {
        if doc.element(node).is_none() || !candidate(doc, node) || !doc.is_rendered(node) {
            continue;
        }
        let nested = doc.ancestors(node).take_while(|a| *a != container).any(|a| members.contains(&a));
        if nested {
            continue;
        }
        members.insert(node);
        accepted.push(node);
    }
    accepted
}

/// The adapter selected for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapter {
    ChatGpt(ChatGpt),
    Claude(Claude),
    Gemini(Gemini),
    Perplexity(Perplexity),
    DeepSeek(DeepSeek),
    Grok(Grok),
}

impl Adapter {
    pub fn new(platform: Platform) -> Self {
        match platform {
            Platform::ChatGpt => Adapter::ChatGpt(ChatGpt),
            Platform::Claude => Adapter::Claude(Claude),
            Platform::Gemini => Adapter::Gemini(Gemini),
            Platform::Perplexity => Adapter::Perplexity(Perplexity),
            Platform::DeepSeek => Adapter::DeepSeek(DeepSeek),
            Platform::Grok => Adapter::Grok(Grok),
        }
    }

    /// Selects the adapter for a document location, `None` for unsupported hosts.
    pub fn for_location(url: &Url) -> Option<Self> {
        url.host_str().and_then(Platform::from_host).map(Adapter::new)
    }
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $call:expr) => {
        match $self {
            Adapter::ChatGpt($inner) => $call,
            Adapter::Claude($inner) => $call,
            Adapter::Gemini($inner) => $call,
            Adapter::Perplexity($inner) => $call,
            Adapter::DeepSeek($inner) => $call,
            Adapter::Grok($inner) => $call,
        }
    };
}

impl PlatformAdapter for Adapter {
    fn platform(&self) -> Platform {
        delegate!(self, a => a.platform())
    }

    fn profile(&self) -> &'static Profile {
        delegate!(self, a => a.profile())
    }

    fn locate_container(&self, doc: &Document) -> NodeId {
        delegate!(self, a => a.locate_container(doc))
    }

    fn locate_candidates(&self, doc: &Document, container: NodeId) -> Vec<NodeId> {
        delegate!(self, a => a.locate_candidates(doc, container))
    }

    fn classify_role(&self, doc: &Document, node: NodeId) -> Role {
        delegate!(self, a => a.classify_role(doc, node))
    }

    fn extract_preview(&self, doc: &Document, node: NodeId) -> Result<String, ExtractError> {
        delegate!(self, a => a.extract_preview(doc, node))
    }

    fn extract_full_text(&self, doc: &Document, node: NodeId) -> Result<String, ExtractError> {
        delegate!(self, a => a.extract_full_text(doc, node))
    }

    fn extract_attachment_kind(
        &self,
        doc: &Document,
        node: NodeId,
    ) -> Result<AttachmentKind, ExtractError> {
        delegate!(self, a => a.extract_attachment_kind(doc, node))
    }

    fn compute_identity(
        &self,
        doc: &Document,
        node: NodeId,
        facts: &CandidateFacts<'_>,
    ) -> Result<ResolvedIdentity, ExtractError> {
        delegate!(self, a => a.compute_identity(doc, node, facts))
    }

    fn is_valid_candidate(&self, doc: &Document, node: NodeId) -> bool {
        delegate!(self, a => a.is_valid_candidate(doc, node))
    }

    fn conversation_id(&self, url: &Url) -> String {
        delegate!(self, a => a.conversation_id(url))
    }

    fn raw_text(&self, doc: &Document, node: NodeId) -> Result<String, ExtractError> {
        delegate!(self, a => a.raw_text(doc, node))
    }
}
