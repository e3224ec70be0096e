//! Debounced change scheduling with a reentrancy guard.
//!
//! The scheduler is a pure state machine: it decides what a mutation means
//! for the next rescan, and the runtime turns those decisions into timers.

use tracing::trace;

use super::timers::Millis;
use crate::tree::{Document, MutationRecord, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEffect {
    /// Outside the subscribed container, not structural, or not subscribed.
    Ignored,
    /// The quiet window was (re)started and now ends at `deadline`.
    Armed { deadline: Millis },
    /// A rescan is running; exactly one follow-up will run after it.
    FollowUpQueued,
}

#[derive(Debug)]
pub struct ChangeScheduler {
    quiet_window: Millis,
    container: Option<NodeId>,
    deadline: Option<Millis>,
    running: bool,
    follow_up: bool,
}

impl ChangeScheduler {
    pub fn new(quiet_window: Millis) -> Self {
        Self { quiet_window, container: None, deadline: None, running: false, follow_up: false }
    }

    pub fn subscribe(&mut self, container: NodeId) {
        self.container = Some(container);
    }

    /// Stops listening and drops any pending quiet-window deadline.
    pub fn unsubscribe(&mut self) {
        self.container = None;
        self.deadline = None;
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_follow_up(&self) -> bool {
        self.follow_up
    }

    /// A mutation matters when it adds or removes nodes under the container.
    /// A container that has itself been detached counts too, since its
    /// replacement needs a rescan to be found.
    pub fn is_relevant(&self, doc: &Document, record: &MutationRecord) -> bool {
        let Some(container) = self.container else {
            return false;
        };
        record.is_structural() && (doc.contains(container, record.target) || !doc.is_attached(container))
    }

    pub fn on_mutation(&mut self, doc: &Document, record: &MutationRecord, now: Millis) -> MutationEffect {
        if !self.is_relevant(doc, record) {
            return MutationEffect::Ignored;
        }
        if self.running {
            self.follow_up = true;
            trace!(node = %record.target, "mutation during rescan, follow-up queued");
            return MutationEffect::FollowUpQueued;
        }
        let deadline = now.saturating_add(self.quiet_window);
        self.deadline = Some(deadline);
        MutationEffect::Armed { deadline }
    }

    /// Returns `true` when `fired` is still the live deadline.
    pub fn on_deadline(&mut self, fired: Millis) -> bool {
        if self.deadline == Some(fired) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Enters the guarded section. A rescan requested while one is running
    /// becomes the follow-up instead.
    pub fn try_begin(&mut self) -> bool {
        if self.running {
            self.follow_up = true;
            return false;
        }
        self.running = true;
        self.deadline = None;
        true
    }

    /// Leaves the guarded section; returns whether a follow-up rescan is owed.
    pub fn finish(&mut self) -> bool {
        self.running = false;
        std::mem::take(&mut self.follow_up)
    }

    /// Leaves the guarded section and forgets any follow-up (navigation reset).
    pub fn abort_run(&mut self) {
        self.running = false;
        self.follow_up = false;
    }
}
