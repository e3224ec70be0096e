//! Jump-to-message requests.

use std::time::Duration;

use tracing::{debug, warn};

use crate::identity::Identity;
use crate::session::Session;
use crate::tree::{Document, NodeId};

/// How long a jumped-to message stays highlighted.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(2000);

/// The host environment that can move the viewport.
pub trait ScrollHost {
    /// Scrolls `node` to the vertical center of the viewport.
    fn scroll_into_view(&mut self, doc: &Document, node: NodeId);

    /// Marks `node` for `duration`. The host removes the mark itself.
    fn highlight(&mut self, doc: &Document, node: NodeId, duration: Duration);
}

/// Scrolls to the entry with `identity` and highlights it.
///
/// Does nothing, apart from a warning, when the identity is not in the
/// current index or its node has been detached since the last rescan.
pub fn jump_to(session: &Session, doc: &Document, identity: &Identity, host: &mut impl ScrollHost) {
    let Some(message) = session.index().get(identity) else {
        warn!(session = %session.id(), %identity, "jump target not in index");
        return;
    };
    if !doc.is_attached(message.source) {
        warn!(session = %session.id(), %identity, node = %message.source, "jump target detached");
        return;
    }
    debug!(%identity, node = %message.source, "jumping to message");
    host.scroll_into_view(doc, message.source);
    host.highlight(doc, message.source, HIGHLIGHT_DURATION);
}
