//! JSON snapshots of a document, used by the CLI and by replay scripts.
//!
//! ```json
//! {
//!   "url": "https://chatgpt.com/c/123",
//!   "root": {
//!     "tag": "body",
//!     "children": [
//!       { "tag": "main", "children": [
//!         { "tag": "div", "attrs": { "data-message-author-role": "user" },
//!           "children": [ { "text": "Hello?" } ] }
//!       ] }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::document::Document;
use super::node::{Element, NodeId, Size, Style};
use crate::utils::safe_open_file;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid document url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("snapshot root must be an element, found a text node")]
    TextRoot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text {
        text: String,
    },
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "is_default_style")]
        style: Style,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Size>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<SnapshotNode>,
    },
}

fn is_default_style(style: &Style) -> bool {
    *style == Style::default()
}

impl SnapshotNode {
    fn to_element(&self) -> Option<Element> {
        match self {
            SnapshotNode::Text { .. } => None,
            SnapshotNode::Element { tag, attrs, style, size, .. } => {
                let mut element = Element::new(tag.as_str());
                for (name, value) in attrs {
                    element = element.with_attr(name, value.as_str());
                }
                element.style = style.clone();
                element.size = *size;
                Some(element)
            }
        }
    }

    fn children(&self) -> &[SnapshotNode] {
        match self {
            SnapshotNode::Text { .. } => &[],
            SnapshotNode::Element { children, .. } => children,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub url: String,
    pub root: SnapshotNode,
}

impl DocumentSnapshot {
    pub fn into_document(self) -> Result<Document, SnapshotError> {
        let location = parse_location(&self.url)?;
        let root = self.root.to_element().ok_or(SnapshotError::TextRoot)?;
        let mut doc = Document::with_root(location, root);
        let root_id = doc.root();
        for child in self.root.children() {
            let id = doc.graft(child);
            // Freshly created nodes under a known element cannot fail to attach.
            let _ = doc.append_child(root_id, id);
        }
        Ok(doc)
    }
}

pub fn parse_location(url: &str) -> Result<Url, SnapshotError> {
    Url::parse(url).map_err(|source| SnapshotError::InvalidUrl { url: url.to_string(), source })
}

impl Document {
    /// Builds a detached subtree from a snapshot node and returns its root.
    pub fn graft(&mut self, node: &SnapshotNode) -> NodeId {
        match node {
            SnapshotNode::Text { text } => self.create_text(text.as_str()),
            SnapshotNode::Element { children, .. } => {
                let element = node.to_element().unwrap_or_else(|| Element::new("div"));
                let id = self.create_element(element);
                for child in children {
                    let child_id = self.graft(child);
                    let _ = self.append_child(id, child_id);
                }
                id
            }
        }
    }
}

/// Load a snapshot file from disk (size-checked, 10MB max).
pub fn load_snapshot(path: &Path) -> Result<Document> {
    let file = safe_open_file(path)?;
    let snapshot: DocumentSnapshot = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
    snapshot
        .into_document()
        .with_context(|| format!("Invalid snapshot: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "url": "https://claude.ai/chat/42",
        "root": {
            "tag": "body",
            "children": [
                { "tag": "main", "attrs": { "class": "react-scroll" }, "children": [
                    { "tag": "div", "attrs": { "class": "font-user-message" },
                      "style": { "justify-content": "flex-end" },
                      "children": [ { "text": "Hi there?" } ] },
                    { "tag": "img", "size": { "width": 200, "height": 150 } }
                ] }
            ]
        }
    }"#;

    #[test]
    fn test_snapshot_into_document() {
        let snapshot: DocumentSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let doc = snapshot.into_document().unwrap();

        assert_eq!(doc.location().host_str(), Some("claude.ai"));
        let message = doc.find(doc.root(), |el| el.has_class("font-user-message")).unwrap();
        assert_eq!(doc.text_content(message), "Hi there?");
        assert!(doc.element(message).unwrap().style.aligns_end());

        let img = doc.find(doc.root(), |el| el.is("img")).unwrap();
        assert_eq!(doc.element(img).unwrap().dimensions(), (200, 150));
    }

    #[test]
    fn test_text_root_rejected() {
        let snapshot = DocumentSnapshot {
            url: "https://chatgpt.com/".into(),
            root: SnapshotNode::Text { text: "oops".into() },
        };
        assert!(matches!(snapshot.into_document(), Err(SnapshotError::TextRoot)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let snapshot = DocumentSnapshot {
            url: "not a url".into(),
            root: SnapshotNode::Text { text: String::new() },
        };
        assert!(matches!(snapshot.into_document(), Err(SnapshotError::InvalidUrl { .. })));
    }

    #[test]
    fn test_load_snapshot_missing_file() {
        let result = load_snapshot(Path::new("/nonexistent/snapshot.json"));
        assert!(result.is_err());
    }
}
