//! Engine timing and extraction limits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::PREVIEW_LIMIT;
use crate::scheduler::Millis;

/// Timing knobs for the indexing engine. Durations serialize as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mutation-free period required before a rescan fires.
    #[serde(with = "millis")]
    pub quiet_window: Duration,
    /// Period of the conversation-id poll. Must be non-zero.
    #[serde(with = "period_millis")]
    pub navigation_poll: Duration,
    /// Wait after a conversation switch before re-indexing.
    #[serde(with = "millis")]
    pub settle_delay: Duration,
    /// Wait before retrying when the container could not be resolved. Must be non-zero.
    #[serde(with = "period_millis")]
    pub container_retry: Duration,
    /// Simulated layout wait between reading the tree and committing a rescan.
    #[serde(with = "millis")]
    pub layout_settle: Duration,
    /// Preview cap in UTF-16 code units. Values above the adapter limit have no effect.
    pub preview_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quiet_window: Duration::from_millis(750),
            navigation_poll: Duration::from_millis(1_000),
            settle_delay: Duration::from_millis(500),
            container_retry: Duration::from_millis(1_000),
            layout_settle: Duration::ZERO,
            preview_limit: PREVIEW_LIMIT,
        }
    }
}

/// Converts a duration to scheduler ticks, saturating at `u64::MAX`.
pub fn ticks(duration: Duration) -> Millis {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Ticks for a self-rescheduling task. Never zero, so a periodic task cannot
/// starve the timer queue.
pub fn period_ticks(duration: Duration) -> Millis {
    ticks(duration).max(1)
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(super::ticks(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod period_millis {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        super::millis::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match u64::deserialize(deserializer)? {
            0 => Err(D::Error::custom("period must be at least 1 ms")),
            ms => Ok(Duration::from_millis(ms)),
        }
    }
}
