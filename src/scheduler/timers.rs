use std::collections::{BTreeMap, HashMap};

/// Virtual time in milliseconds since the runtime started.
pub type Millis = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deterministic timer queue.
///
/// Timers fire in due-time order; timers due at the same instant fire in the
/// order they were scheduled. Time only moves when the owner advances it.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Millis,
    next_seq: u64,
    pending: BTreeMap<(Millis, u64), T>,
    due_by_id: HashMap<u64, Millis>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self { now: 0, next_seq: 0, pending: BTreeMap::new(), due_by_id: HashMap::new() }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn schedule(&mut self, delay: Millis, task: T) -> TimerId {
        let due = self.now.saturating_add(delay);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((due, seq), task);
        self.due_by_id.insert(seq, due);
        TimerId(seq)
    }

    /// Removes a pending timer. Returns its task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let due = self.due_by_id.remove(&id.0)?;
        self.pending.remove(&(due, id.0))
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id.0)
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Pops the earliest timer due at or before `until`, moving the clock to its due time.
    pub fn pop_due(&mut self, until: Millis) -> Option<(TimerId, T)> {
        let (&(due, seq), _) = self.pending.first_key_value()?;
        if due > until {
            return None;
        }
        let task = self.pending.remove(&(due, seq))?;
        self.due_by_id.remove(&seq);
        self.now = self.now.max(due);
        Some((TimerId(seq), task))
    }

    /// Moves the clock forward without firing anything.
    pub fn advance_to(&mut self, time: Millis) {
        self.now = self.now.max(time);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
