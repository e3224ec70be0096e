//! The render-consumer boundary.

use crate::models::Message;

/// Receives the full index after every accepted rescan.
///
/// Never called for retained or aborted rescans. The slice is a snapshot;
/// consumers that need it later must copy it.
pub trait RenderConsumer {
    fn on_index_updated(&mut self, index: &[Message]);
}

impl<F> RenderConsumer for F
where
    F: FnMut(&[Message]),
{
    fn on_index_updated(&mut self, index: &[Message]) {
        self(index)
    }
}

/// Keeps a copy of every snapshot it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingConsumer {
    snapshots: Vec<Vec<Message>>,
}

impl RecordingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> &[Vec<Message>] {
        &self.snapshots
    }

    pub fn last(&self) -> Option<&[Message]> {
        self.snapshots.last().map(Vec::as_slice)
    }

    pub fn calls(&self) -> usize {
        self.snapshots.len()
    }
}

impl RenderConsumer for RecordingConsumer {
    fn on_index_updated(&mut self, index: &[Message]) {
        self.snapshots.push(index.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_consumer() {
        let mut sizes = Vec::new();
        {
            let mut consumer = |index: &[Message]| sizes.push(index.len());
            consumer.on_index_updated(&[]);
        }
        assert_eq!(sizes, vec![0]);
    }

    #[test]
    fn test_recording_consumer() {
        let mut recorder = RecordingConsumer::new();
        assert!(recorder.last().is_none());
        recorder.on_index_updated(&[]);
        assert_eq!(recorder.calls(), 1);
        assert_eq!(recorder.last(), Some(&[][..]));
    }
}
