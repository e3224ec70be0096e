//! Stable identities for indexed messages.
//!
//! A platform-supplied id (`data-message-id` and friends) is preferred. When a
//! platform exposes nothing durable, the identity falls back to a deterministic
//! key built from the platform, role, candidate position, and a short hash of
//! the preview, so an unchanged tree always produces the same identities.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Index, Role};

/// Characters of the preview that feed the fallback hash.
const FALLBACK_HASH_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    /// Supplied by the source platform.
    Durable,
    /// Derived from role, position and preview.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub source: IdentitySource,
}

impl ResolvedIdentity {
    pub fn durable(value: impl Into<String>) -> Self {
        Self { identity: Identity::new(value), source: IdentitySource::Durable }
    }

    pub fn fallback(platform: &str, facts: &CandidateFacts<'_>) -> Self {
        Self { identity: fallback_identity(platform, facts), source: IdentitySource::Fallback }
    }
}

/// What the builder already knows about a candidate when asking for its identity.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFacts<'a> {
    pub role: Role,
    pub preview: &'a str,
    /// Ordinal among all candidates of the scan.
    pub position: usize,
}

pub fn fallback_identity(platform: &str, facts: &CandidateFacts<'_>) -> Identity {
    Identity(format!(
        "{}-{}-{}-{}",
        platform,
        facts.role,
        facts.position,
        preview_hash(facts.preview)
    ))
}

/// 32-bit rolling hash (`h * 31 + unit`) over the first UTF-16 units of the preview, in base 36.
pub fn preview_hash(preview: &str) -> String {
    let hash = preview
        .encode_utf16()
        .take(FALLBACK_HASH_CHARS)
        .fold(0i32, |hash, unit| hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32));
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Per-rescan dedup set. Rebuilt from scratch on every scan.
#[derive(Debug, Default)]
pub struct SeenSet {
    seen: HashSet<Identity>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the identity was already seen in this scan.
    pub fn insert(&mut self, identity: &Identity) -> bool {
        self.seen.insert(identity.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Cross-scan identity state: the identity set of the last accepted index.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    previous: HashSet<Identity>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&mut self, index: &Index) {
        self.previous = index.iter().map(|m| m.identity.clone()).collect();
    }

    pub fn knows(&self, identity: &Identity) -> bool {
        self.previous.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn clear(&mut self) {
        self.previous.clear();
    }
}
