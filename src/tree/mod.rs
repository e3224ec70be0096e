//! Read/write model of the foreign document the index is built from.
//!
//! - [`Document`] - arena of element and text nodes plus the current location
//! - [`Element`] / [`Style`] / [`Size`] - what adapters inspect on a node
//! - [`MutationRecord`] - childList change emitted by every structural edit
//! - [`snapshot`] - JSON snapshot format used by the CLI and replay scripts

pub mod document;
pub mod node;
pub mod snapshot;

pub use document::{Document, TreeError};
pub use node::{Element, MutationRecord, NodeId, NodeKind, Size, Style};
pub use snapshot::{DocumentSnapshot, SnapshotError, SnapshotNode, load_snapshot, parse_location};
