//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;
use turn_navigator::Document;
use turn_navigator::tree::{DocumentSnapshot, Size, SnapshotNode, Style};

/// Builder for one element of a snapshot tree
#[derive(Debug, Clone)]
pub struct El {
    tag: String,
    attrs: BTreeMap<String, String>,
    style: Style,
    size: Option<Size>,
    children: Vec<SnapshotNode>,
}

pub fn el(tag: &str) -> El {
    El {
        tag: tag.to_string(),
        attrs: BTreeMap::new(),
        style: Style::default(),
        size: None,
        children: Vec::new(),
    }
}

pub fn text(value: &str) -> SnapshotNode {
    SnapshotNode::Text { text: value.to_string() }
}

impl El {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn id(self, value: &str) -> Self {
        self.attr("id", value)
    }

    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(Size { width, height });
        self
    }

    pub fn justify(mut self, value: &str) -> Self {
        self.style.justify_content = Some(value.to_string());
        self
    }

    pub fn display(mut self, value: &str) -> Self {
        self.style.display = Some(value.to_string());
        self
    }

    pub fn child(mut self, node: impl Into<SnapshotNode>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, value: &str) -> Self {
        self.child(text(value))
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<SnapshotNode>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }
}

impl From<El> for SnapshotNode {
    fn from(el: El) -> Self {
        SnapshotNode::Element {
            tag: el.tag,
            attrs: el.attrs,
            style: el.style,
            size: el.size,
            children: el.children,
        }
    }
}

/// Builder for whole documents
pub struct DocBuilder {
    url: String,
    body: El,
}

impl DocBuilder {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string(), body: el("body") }
    }

    pub fn child(mut self, node: impl Into<SnapshotNode>) -> Self {
        self.body = self.body.child(node);
        self
    }

    pub fn snapshot(self) -> DocumentSnapshot {
        DocumentSnapshot { url: self.url, root: self.body.into() }
    }

    pub fn build(self) -> Document {
        self.snapshot().into_document().expect("valid test snapshot")
    }
}

/// A ChatGPT turn with a durable id.
pub fn chatgpt_turn(role: &str, id: &str, body: &str) -> El {
    el("div")
        .attr("data-message-author-role", role)
        .attr("data-message-id", id)
        .child(el("div").class("markdown").text(body))
}

/// A ChatGPT conversation page at `/c/{conversation}`.
pub fn chatgpt_page(conversation: &str, turns: Vec<El>) -> DocBuilder {
    DocBuilder::new(&format!("https://chatgpt.com/c/{conversation}"))
        .child(el("main").id("thread").children(turns))
}

/// Writes a snapshot file into `dir` and returns its path.
pub fn write_snapshot(dir: &Path, name: &str, snapshot: &DocumentSnapshot) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(snapshot).expect("serialize snapshot"))
        .expect("Failed to write snapshot");
    path
}

/// Writes a replay script built from a starting snapshot and raw event values.
pub fn write_script(dir: &Path, name: &str, start: DocumentSnapshot, events: Vec<serde_json::Value>) -> PathBuf {
    let script = json!({ "url": start.url, "root": start.root, "events": events });
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(&script).expect("serialize script"))
        .expect("Failed to write script");
    path
}

/// Temp directory holding a settings file path for CLI tests.
pub struct ConfigDir {
    temp_dir: TempDir,
}

impl ConfigDir {
    pub fn new() -> Self {
        Self { temp_dir: TempDir::new().expect("Failed to create temp dir") }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings(&self) -> PathBuf {
        self.temp_dir.path().join("settings.json")
    }
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}
