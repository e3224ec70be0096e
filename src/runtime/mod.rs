//! Deterministic single-threaded event loop.
//!
//! [`Runtime`] owns the document, the session, and both event sources, and
//! runs every callback from one virtual-time [`TimerQueue`]. Nothing happens
//! until the caller mutates the document or advances time, so tests can step
//! through debounce windows, navigation polls, and settle delays exactly.
//!
//! A rescan reads the tree when it starts. With a non-zero `layout_settle`
//! it then yields until a commit timer fires; mutations landing in that gap
//! queue a single follow-up rescan.

pub mod script;

use std::time::Duration;

use tracing::{debug, warn};

use crate::adapters::PlatformAdapter;
use crate::config::{EngineConfig, period_ticks, ticks};
use crate::consumer::RenderConsumer;
use crate::indexer::{Draft, RescanOutcome, collect, commit};
use crate::scheduler::{
    ChangeScheduler, Millis, MutationEffect, NavigationDetector, Observation, TimerId, TimerQueue,
};
use crate::session::Session;
use crate::tree::{Document, MutationRecord, TreeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    QuietWindow(Millis),
    NavigationTick,
    Settle,
    ContainerRetry,
    Rescan,
    CommitRescan,
}

#[derive(Debug, Default)]
struct Timers {
    quiet: Option<TimerId>,
    retry: Option<TimerId>,
    commit: Option<TimerId>,
    settle: Option<TimerId>,
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub rescans: usize,
    pub accepted: usize,
    pub retained: usize,
    pub unresolved: usize,
    pub resets: usize,
}

pub struct Runtime<A, C> {
    doc: Document,
    adapter: A,
    consumer: C,
    session: Session,
    config: EngineConfig,
    queue: TimerQueue<Task>,
    timers: Timers,
    changes: ChangeScheduler,
    navigation: NavigationDetector,
    in_flight: Option<Draft>,
    stats: RuntimeStats,
    started: bool,
}

impl<A: PlatformAdapter, C: RenderConsumer> Runtime<A, C> {
    pub fn new(doc: Document, adapter: A, consumer: C, config: EngineConfig) -> Self {
        let session = Session::new(adapter.platform());
        let changes = ChangeScheduler::new(ticks(config.quiet_window));
        Self {
            doc,
            adapter,
            consumer,
            session,
            config,
            queue: TimerQueue::new(),
            timers: Timers::default(),
            changes,
            navigation: NavigationDetector::new(),
            in_flight: None,
            stats: RuntimeStats::default(),
            started: false,
        }
    }

    /// Subscribes to the container, starts the navigation poll, and runs the first rescan.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let id = self.adapter.conversation_id(self.doc.location());
        debug!(session = %self.session.id(), platform = %self.adapter.platform(), conversation = %id, "runtime started");
        self.navigation.prime(id);
        let container = self.adapter.locate_container(&self.doc);
        self.changes.subscribe(container);
        self.schedule_periodic(self.config.navigation_poll, Task::NavigationTick);
        self.begin_rescan();
    }

    pub fn now(&self) -> Millis {
        self.queue.now()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.queue.next_due()
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    pub fn navigation(&self) -> &NavigationDetector {
        &self.navigation
    }

    pub fn changes(&self) -> &ChangeScheduler {
        &self.changes
    }

    /// Applies one tree edit and feeds the resulting record to the change scheduler.
    pub fn mutate<F>(&mut self, edit: F) -> Result<MutationEffect, TreeError>
    where
        F: FnOnce(&mut Document) -> Result<MutationRecord, TreeError>,
    {
        let record = edit(&mut self.doc)?;
        Ok(self.observe_mutation(&record))
    }

    /// Feeds a record produced outside [`Runtime::mutate`].
    pub fn observe_mutation(&mut self, record: &MutationRecord) -> MutationEffect {
        let effect = self.changes.on_mutation(&self.doc, record, self.queue.now());
        if let MutationEffect::Armed { deadline } = effect {
            self.cancel_quiet();
            let delay = deadline.saturating_sub(self.queue.now());
            self.timers.quiet = Some(self.queue.schedule(delay, Task::QuietWindow(deadline)));
        }
        effect
    }

    /// Direct access to the document; edits made here are not observed.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Runs every timer due within the next `duration` milliseconds.
    pub fn advance(&mut self, duration: Millis) {
        let until = self.queue.now().saturating_add(duration);
        while let Some((id, task)) = self.queue.pop_due(until) {
            self.run(id, task);
        }
        self.queue.advance_to(until);
    }

    /// Requests a rescan right away, bypassing the quiet window.
    pub fn request_rescan(&mut self) {
        self.cancel_quiet();
        self.begin_rescan();
    }

    fn run(&mut self, id: TimerId, task: Task) {
        match task {
            Task::QuietWindow(deadline) => {
                if self.timers.quiet == Some(id) {
                    self.timers.quiet = None;
                }
                if self.changes.on_deadline(deadline) {
                    self.begin_rescan();
                }
            }
            Task::Rescan => self.begin_rescan(),
            Task::ContainerRetry => {
                self.timers.retry = None;
                self.begin_rescan();
            }
            Task::CommitRescan => {
                self.timers.commit = None;
                if let Some(draft) = self.in_flight.take() {
                    self.finish_rescan(draft);
                }
            }
            Task::NavigationTick => {
                self.schedule_periodic(self.config.navigation_poll, Task::NavigationTick);
                self.poll_navigation();
            }
            Task::Settle => {
                self.timers.settle = None;
                self.settle();
            }
        }
    }

    fn poll_navigation(&mut self) {
        let id = self.adapter.conversation_id(self.doc.location());
        match self.navigation.observe(&id) {
            Observation::Unchanged => {}
            Observation::Switched { .. } => {
                self.reset();
                self.restart_settle();
            }
            Observation::Retargeted { to } => {
                debug!(conversation = %to, "switched again while resetting");
                self.restart_settle();
            }
        }
    }

    /// Drops all conversation state and cancels pending work.
    fn reset(&mut self) {
        self.stats.resets += 1;
        self.session.reset();
        self.changes.unsubscribe();
        self.changes.abort_run();
        self.cancel_quiet();
        for id in [self.timers.retry.take(), self.timers.commit.take()].into_iter().flatten() {
            self.queue.cancel(id);
        }
        if self.in_flight.take().is_some() {
            debug!("in-flight rescan discarded by reset");
        }
    }

    fn restart_settle(&mut self) {
        if let Some(id) = self.timers.settle.take() {
            self.queue.cancel(id);
        }
        self.timers.settle = Some(self.queue.schedule(ticks(self.config.settle_delay), Task::Settle));
    }

    fn settle(&mut self) {
        if let Some(id) = self.navigation.settle() {
            debug!(conversation = %id, "navigation settled");
        }
        let container = self.adapter.locate_container(&self.doc);
        self.changes.subscribe(container);
        self.begin_rescan();
    }

    fn begin_rescan(&mut self) {
        if self.navigation.is_resetting() {
            // The settle step rescans once the new conversation has rendered.
            return;
        }
        if !self.changes.try_begin() {
            debug!("rescan already running, follow-up queued");
            return;
        }
        self.stats.rescans += 1;

        let Some(draft) = collect(&self.adapter, &self.doc, &self.config) else {
            self.stats.unresolved += 1;
            self.schedule_retry();
            self.end_run();
            return;
        };

        if let Some(id) = self.timers.retry.take() {
            self.queue.cancel(id);
        }
        if self.changes.container() != Some(draft.container) {
            debug!(container = %draft.container, "change scheduler re-subscribed");
            self.changes.subscribe(draft.container);
        }

        let settle = ticks(self.config.layout_settle);
        if settle == 0 {
            self.finish_rescan(draft);
        } else {
            self.in_flight = Some(draft);
            self.timers.commit = Some(self.queue.schedule(settle, Task::CommitRescan));
        }
    }

    fn finish_rescan(&mut self, draft: Draft) {
        match commit(&mut self.session, draft) {
            RescanOutcome::Accepted(_) => {
                self.stats.accepted += 1;
                self.consumer.on_index_updated(self.session.index().as_slice());
            }
            RescanOutcome::Retained { .. } => self.stats.retained += 1,
            RescanOutcome::ContainerUnresolved => {
                warn!("commit reported an unresolved container");
            }
        }
        self.end_run();
    }

    fn end_run(&mut self) {
        if self.changes.finish() {
            self.queue.schedule(0, Task::Rescan);
        }
    }

    fn schedule_retry(&mut self) {
        if self.timers.retry.is_none() {
            debug!(delay_ms = period_ticks(self.config.container_retry), "container unresolved, retry scheduled");
            self.timers.retry = self.schedule_periodic(self.config.container_retry, Task::ContainerRetry);
        }
    }

    /// Schedules a self-repeating task at least 1 ms ahead. Nothing is
    /// scheduled once the clock cannot move that far.
    fn schedule_periodic(&mut self, period: Duration, task: Task) -> Option<TimerId> {
        let delay = period_ticks(period);
        self.queue.now().checked_add(delay)?;
        Some(self.queue.schedule(delay, task))
    }

    fn cancel_quiet(&mut self) {
        if let Some(id) = self.timers.quiet.take() {
            self.queue.cancel(id);
        }
    }
}
