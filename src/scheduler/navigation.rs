//! Conversation switch detection.
//!
//! Single-page chat apps swap conversations without a page load. The detector
//! is polled with the current conversation id and moves
//! `Idle -> Resetting -> Idle`: a changed id starts a reset, the runtime waits
//! for the settle delay, and [`NavigationDetector::settle`] returns to idle.
//! Further changes while resetting only replace the target (last write wins).

use percent_encoding::percent_decode_str;
use tracing::info;
use url::Url;

/// Where a platform keeps its conversation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPattern {
    /// Path segment right after this prefix; `*` matches any one segment.
    PathAfter(&'static [&'static str]),
    /// Query parameter value.
    Query(&'static str),
}

impl IdPattern {
    pub fn extract(&self, url: &Url) -> Option<String> {
        match self {
            IdPattern::PathAfter(prefix) => {
                let segments: Vec<String> = url
                    .path_segments()?
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect();
                segments.windows(prefix.len() + 1).find_map(|window| {
                    let matches = window
                        .iter()
                        .zip(prefix.iter())
                        .all(|(segment, expected)| *expected == "*" || segment == expected);
                    matches.then(|| window[prefix.len()].clone())
                })
            }
            IdPattern::Query(name) => url
                .query_pairs()
                .find(|(key, value)| key == *name && !value.is_empty())
                .map(|(_, value)| value.into_owned()),
        }
    }
}

/// First matching pattern, else the decoded path.
pub fn extract_conversation_id(url: &Url, patterns: &[IdPattern]) -> String {
    patterns
        .iter()
        .find_map(|pattern| pattern.extract(url))
        .unwrap_or_else(|| percent_decode_str(url.path()).decode_utf8_lossy().into_owned())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    Idle,
    Resetting { target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Unchanged,
    /// Left idle for a new conversation; the caller resets and starts the settle delay.
    Switched { from: Option<String>, to: String },
    /// Changed again while resetting; only the target moved.
    Retargeted { to: String },
}

#[derive(Debug)]
pub struct NavigationDetector {
    current: Option<String>,
    state: NavigationState,
}

impl Default for NavigationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationDetector {
    pub fn new() -> Self {
        Self { current: None, state: NavigationState::Idle }
    }

    /// Records the id the session started on without triggering a reset.
    pub fn prime(&mut self, id: impl Into<String>) {
        self.current = Some(id.into());
        self.state = NavigationState::Idle;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn is_resetting(&self) -> bool {
        matches!(self.state, NavigationState::Resetting { .. })
    }

    pub fn observe(&mut self, id: &str) -> Observation {
        if self.current.as_deref() == Some(id) {
            return Observation::Unchanged;
        }
        let previous = self.current.replace(id.to_string());
        if let NavigationState::Resetting { target } = &mut self.state {
            *target = id.to_string();
            return Observation::Retargeted { to: id.to_string() };
        }
        info!(from = ?previous, to = id, "conversation switch detected");
        self.state = NavigationState::Resetting { target: id.to_string() };
        Observation::Switched { from: previous, to: id.to_string() }
    }

    /// Ends a reset. Returns the conversation id it settled on.
    pub fn settle(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, NavigationState::Idle) {
            NavigationState::Resetting { target } => Some(target),
            NavigationState::Idle => None,
        }
    }
}
