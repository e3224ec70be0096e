//! Replay scripts: a starting snapshot plus timed edits.
//!
//! ```json
//! {
//!   "url": "https://chatgpt.com/c/one",
//!   "root": { "tag": "body", "children": [ { "tag": "main", "attrs": { "id": "thread" } } ] },
//!   "events": [
//!     { "at_ms": 0, "op": "append", "parent": "thread",
//!       "node": { "tag": "div", "attrs": { "data-message-author-role": "user" },
//!                 "children": [ { "text": "Hello?" } ] } },
//!     { "at_ms": 2000, "op": "navigate", "url": "https://chatgpt.com/c/two" }
//!   ]
//! }
//! ```
//!
//! Targets are `id` attribute values. Events must be sorted by `at_ms`.

use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Runtime, RuntimeStats};
use crate::adapters::{Adapter, PlatformAdapter};
use crate::config::EngineConfig;
use crate::consumer::RenderConsumer;
use crate::models::Message;
use crate::scheduler::Millis;
use crate::tree::{Document, DocumentSnapshot, MutationRecord, NodeId, SnapshotNode, parse_location};
use crate::utils::safe_open_file;

/// Time allowed after the last event for timers to drain.
pub const DRAIN_MS: Millis = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub url: String,
    pub root: SnapshotNode,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptEvent {
    pub at_ms: Millis,
    #[serde(flatten)]
    pub op: ScriptOp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    Append { parent: String, node: SnapshotNode },
    Remove { target: String },
    Replace { target: String, node: SnapshotNode },
    SetText { target: String, text: String },
    /// Changes the location; with `root`, the body's children are swapped too.
    Navigate {
        url: String,
        #[serde(default)]
        root: Option<SnapshotNode>,
    },
}

/// One consumer notification, stamped with virtual time.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayFrame {
    pub at_ms: Millis,
    pub entries: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub frames: Vec<ReplayFrame>,
    pub final_index: Vec<Message>,
    pub stats: RuntimeStatsReport,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RuntimeStatsReport {
    pub rescans: usize,
    pub accepted: usize,
    pub retained: usize,
    pub unresolved: usize,
    pub resets: usize,
}

impl From<RuntimeStats> for RuntimeStatsReport {
    fn from(stats: RuntimeStats) -> Self {
        Self {
            rescans: stats.rescans,
            accepted: stats.accepted,
            retained: stats.retained,
            unresolved: stats.unresolved,
            resets: stats.resets,
        }
    }
}

pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let file = safe_open_file(path)?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse replay script: {}", path.display()))
}

impl ReplayScript {
    /// Runs the script against the adapter for its starting url.
    pub fn replay(&self, config: EngineConfig) -> Result<ReplayReport> {
        let doc = self.starting_document()?;
        let adapter = Adapter::for_location(doc.location())
            .ok_or_else(|| anyhow!("No adapter for '{}'", self.url))?;
        self.replay_with(adapter, config)
    }

    pub fn replay_with<A: PlatformAdapter>(&self, adapter: A, config: EngineConfig) -> Result<ReplayReport> {
        let doc = self.starting_document()?;
        let mut runtime = Runtime::new(doc, adapter, TimedRecorder::default(), config);
        runtime.start();

        for (i, event) in self.events.iter().enumerate() {
            if event.at_ms < runtime.now() {
                bail!("Event {} at {}ms is earlier than the previous event", i, event.at_ms);
            }
            let step = event.at_ms - runtime.now();
            advance_stamped(&mut runtime, step);
            apply(&mut runtime, &event.op).with_context(|| format!("Event {} failed", i))?;
        }
        advance_stamped(&mut runtime, DRAIN_MS);

        let final_index = runtime.session().index().as_slice().to_vec();
        let stats = runtime.stats().into();
        let frames = std::mem::take(&mut runtime.consumer_mut().frames);
        Ok(ReplayReport { frames, final_index, stats })
    }

    fn starting_document(&self) -> Result<Document> {
        let snapshot = DocumentSnapshot { url: self.url.clone(), root: self.root.clone() };
        Ok(snapshot.into_document()?)
    }
}

#[derive(Debug, Default)]
struct TimedRecorder {
    now: Millis,
    frames: Vec<ReplayFrame>,
}

impl RenderConsumer for TimedRecorder {
    fn on_index_updated(&mut self, index: &[Message]) {
        self.frames.push(ReplayFrame { at_ms: self.now, entries: index.to_vec() });
    }
}

/// Advances one timer boundary at a time so frames carry the time they fired.
fn advance_stamped<A: PlatformAdapter>(runtime: &mut Runtime<A, TimedRecorder>, duration: Millis) {
    let until = runtime.now().saturating_add(duration);
    while runtime.now() < until {
        let step = runtime.next_due().map_or(until, |due| due.clamp(runtime.now(), until));
        runtime.consumer_mut().now = step;
        let delta = step - runtime.now();
        runtime.advance(delta);
    }
}

fn lookup(doc: &Document, id: &str) -> Result<NodeId> {
    doc.element_by_id(id).ok_or_else(|| anyhow!("No element with id '{}'", id))
}

fn apply<A: PlatformAdapter>(runtime: &mut Runtime<A, TimedRecorder>, op: &ScriptOp) -> Result<()> {
    debug!(at_ms = runtime.now(), ?op, "replay event");
    match op {
        ScriptOp::Append { parent, node } => {
            let parent = lookup(runtime.document(), parent)?;
            runtime.mutate(|doc| {
                let child = doc.graft(node);
                doc.append_child(parent, child)
            })?;
        }
        ScriptOp::Remove { target } => {
            let target = lookup(runtime.document(), target)?;
            runtime.mutate(|doc| doc.remove(target))?;
        }
        ScriptOp::Replace { target, node } => {
            let target = lookup(runtime.document(), target)?;
            let parent = runtime
                .document()
                .parent(target)
                .ok_or_else(|| anyhow!("Cannot replace a detached or root node"))?;
            runtime.mutate(|doc| replace_node(doc, parent, target, node))?;
        }
        ScriptOp::SetText { target, text } => {
            let target = lookup(runtime.document(), target)?;
            runtime.mutate(|doc| doc.set_text(target, text.as_str()))?;
        }
        ScriptOp::Navigate { url, root } => {
            let location = parse_location(url)?;
            runtime.document_mut().set_location(location);
            if let Some(root) = root {
                let body = runtime.document().root();
                runtime.mutate(|doc| {
                    let fresh = doc.graft(root);
                    let children = doc.children(fresh).to_vec();
                    doc.replace_children(body, children)
                })?;
            }
        }
    }
    Ok(())
}

fn replace_node(
    doc: &mut Document,
    parent: NodeId,
    target: NodeId,
    node: &SnapshotNode,
) -> Result<MutationRecord, crate::tree::TreeError> {
    let fresh = doc.graft(node);
    let children = doc
        .children(parent)
        .iter()
        .map(|&child| if child == target { fresh } else { child })
        .collect();
    doc.replace_children(parent, children)
}
