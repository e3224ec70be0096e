//! Data models for the conversation index.
//!
//! - [`Message`] - one indexed conversation turn
//! - [`Index`] - ordered, deduplicated snapshot of messages
//! - [`Role`] / [`AttachmentKind`] - classification results
//!
//! Everything serializes with serde so the CLI can emit the index as JSON.

pub mod index;
pub mod message;

pub use index::Index;
pub use message::{AttachmentKind, Message, Role};
