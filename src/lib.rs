//! Turn Navigator - a live, deduplicated index of conversation turns
//!
//! This library watches the document tree of a chat application and keeps an
//! ordered index of its user and assistant messages while the page streams,
//! re-renders, and switches conversations. It supports:
//!
//! - Platform adapters for ChatGPT, Claude, Gemini, Perplexity, DeepSeek and Grok
//! - Stable message identities that survive rescans
//! - Debounced rescans driven by tree mutations, with a retention guard
//! - Conversation-switch detection and reset
//! - Filtered fuzzy search, copy, jump-to and title generation over the index
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use turn_navigator::{Adapter, EngineConfig, Session, load_snapshot, rescan};
//!
//! let doc = load_snapshot(Path::new("snapshot.json"))?;
//! let adapter = Adapter::for_location(doc.location())
//!     .ok_or_else(|| anyhow::anyhow!("unsupported host"))?;
//! let mut session = Session::new(turn_navigator::PlatformAdapter::platform(&adapter));
//! rescan(&adapter, &doc, &mut session, &EngineConfig::default());
//! println!("Indexed {} turns", session.index().len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod adapters;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod consumer;
pub mod filters;
pub mod identity;
pub mod indexer;
pub mod jump;
pub mod models;
pub mod runtime;
pub mod scheduler;
pub mod search;
pub mod session;
pub mod title;
pub mod tree;
pub mod utils;
pub mod validator;

// Re-export commonly used types
pub use adapters::{Adapter, Platform, PlatformAdapter};
pub use config::EngineConfig;
pub use consumer::{RecordingConsumer, RenderConsumer};
pub use identity::Identity;
pub use indexer::{RescanOutcome, rescan};
pub use models::{AttachmentKind, Index, Message, Role};
pub use runtime::Runtime;
pub use session::Session;
pub use tree::{Document, load_snapshot};
