//! Attachment-kind detection.
//!
//! Checks run in a fixed order (image, pdf, code, document) and the first hit
//! wins, so a message with both a screenshot and `main.rs` in its text is an
//! image message.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::AttachmentKind;
use crate::tree::{Document, Element, NodeId};

/// Images smaller than this in either dimension are treated as icons.
const ICON_PX: u32 = 16;

/// Ancestor levels searched for a message wrapper around a candidate.
const SCOPE_DEPTH: usize = 3;

static PDF_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[\w-]+\.pdf\b").expect("pdf pattern is valid"));

static CODE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b[\w-]+\.(py|js|ts|tsx|jsx|html|css|json|cpp|c|h|java|rs|go|rb|sh|md|yaml|yml|toml|sql)\b",
    )
    .expect("code extension pattern is valid")
});

static DOCUMENT_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[\w-]+\.(docx?|xlsx?|pptx?|txt|csv|rtf|odt)\b")
        .expect("document extension pattern is valid")
});

const FENCE: &str = "```";

pub type ScopeFn = fn(&Document, NodeId) -> NodeId;

/// Per-platform thresholds and markers for attachment detection.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentProfile {
    /// Minimum width and height for a free-standing image to count as content.
    pub content_px: u32,
    /// Lowercase `alt` fragments that identify avatars.
    pub avatar_alts: &'static [&'static str],
    /// Class fragments of upload/attachment wrappers.
    pub upload_classes: &'static [&'static str],
    /// `src` fragments of uploaded media.
    pub upload_srcs: &'static [&'static str],
    /// Resolves the subtree searched for attachments.
    pub scope: ScopeFn,
}

impl AttachmentProfile {
    pub const fn new(content_px: u32, avatar_alts: &'static [&'static str]) -> Self {
        Self {
            content_px,
            avatar_alts,
            upload_classes: &["upload", "attachment", "file"],
            upload_srcs: &["blob:", "/files", "upload"],
            scope: message_scope,
        }
    }
}

/// The message wrapper around `node`: a `data-message-id` element, a nearby
/// `group`/`message`/`conversation-turn` classed ancestor, or the node itself.
pub fn message_scope(doc: &Document, node: NodeId) -> NodeId {
    if let Some(found) = doc.closest(node, |el| el.has_attr("data-message-id")) {
        return found;
    }
    doc.ancestors(node)
        .take(SCOPE_DEPTH)
        .find(|a| {
            doc.element(*a).is_some_and(|el| {
                el.has_class("group")
                    || el.class_contains("message")
                    || el.class_contains("conversation-turn")
            })
        })
        .unwrap_or(node)
}

/// Scope limited to the candidate itself.
pub fn node_scope(_doc: &Document, node: NodeId) -> NodeId {
    node
}

pub fn detect(doc: &Document, node: NodeId, profile: &AttachmentProfile) -> AttachmentKind {
    let scope = (profile.scope)(doc, node);

    if has_content_image(doc, scope, profile) {
        return AttachmentKind::Image;
    }

    let text = doc.text_content(scope);
    if PDF_NAME.is_match(&text) || has_pdf_marker(doc, scope) {
        return AttachmentKind::Pdf;
    }
    if CODE_FILE.is_match(&text) && !text.contains(FENCE) {
        return AttachmentKind::Code;
    }
    if DOCUMENT_FILE.is_match(&text) {
        return AttachmentKind::Document;
    }
    AttachmentKind::None
}

fn has_content_image(doc: &Document, scope: NodeId, profile: &AttachmentProfile) -> bool {
    doc.find_all(scope, |el| el.is("img")).into_iter().any(|img| {
        let Some(el) = doc.element(img) else {
            return false;
        };
        if is_avatar(el, profile) || is_icon(el) {
            return false;
        }
        let src = el.attr("src").unwrap_or_default();
        if profile.upload_srcs.iter().any(|marker| src.contains(marker)) {
            return true;
        }
        if in_upload_wrapper(doc, scope, img, profile) {
            return true;
        }
        let (width, height) = el.dimensions();
        width >= profile.content_px && height >= profile.content_px
    })
}

fn is_avatar(el: &Element, profile: &AttachmentProfile) -> bool {
    let alt = el.attr("alt").unwrap_or_default().to_lowercase();
    !alt.is_empty() && profile.avatar_alts.iter().any(|token| alt.contains(token))
}

fn is_icon(el: &Element) -> bool {
    if el.attr("aria-hidden") == Some("true") || el.attr("role") == Some("presentation") {
        return true;
    }
    if el.class_contains("icon") {
        return true;
    }
    let (width, height) = el.dimensions();
    let measured = width > 0 && height > 0;
    measured && (width < ICON_PX || height < ICON_PX)
}

fn in_upload_wrapper(doc: &Document, scope: NodeId, img: NodeId, profile: &AttachmentProfile) -> bool {
    doc.ancestors(img)
        .take_while(|a| *a != scope)
        .chain(std::iter::once(scope))
        .any(|a| {
            doc.element(a)
                .is_some_and(|el| profile.upload_classes.iter().any(|c| el.class_contains(c)))
        })
}

fn has_pdf_marker(doc: &Document, scope: NodeId) -> bool {
    let is_marker = |el: &Element| el.attr("data-file-type") == Some("pdf") || el.class_contains("pdf");
    doc.element(scope).is_some_and(is_marker) || doc.find(scope, is_marker).is_some()
}
