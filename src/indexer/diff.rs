use std::collections::HashSet;

use serde::Serialize;

use crate::identity::{Identity, IdentityResolver, IdentitySource};
use crate::models::{Index, Message};

/// What changed between two accepted indexes.
///
/// An upgrade is a fallback identity that disappeared while an entry with the
/// same role and preview appeared under a new identity: the platform exposed a
/// durable id (or the turn moved) and the entry was re-keyed, not duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexDiff {
    pub added: Vec<Identity>,
    pub removed: Vec<Identity>,
    /// `(old, new)` pairs.
    pub upgraded: Vec<(Identity, Identity)>,
}

impl IndexDiff {
    pub fn between(previous: &Index, next: &[Message], known: &IdentityResolver) -> Self {
        let next_ids: HashSet<&Identity> = next.iter().map(|m| &m.identity).collect();

        let mut added: Vec<&Message> = next.iter().filter(|m| !known.knows(&m.identity)).collect();
        let mut removed = Vec::new();
        let mut upgraded = Vec::new();

        for old in previous.iter().filter(|m| !next_ids.contains(&m.identity)) {
            let successor = (old.identity_source == IdentitySource::Fallback)
                .then(|| added.iter().position(|m| m.role == old.role && m.preview == old.preview))
                .flatten();
            match successor {
                Some(pos) => {
                    let new = added.remove(pos);
                    upgraded.push((old.identity.clone(), new.identity.clone()));
                }
                None => removed.push(old.identity.clone()),
            }
        }

        Self { added: added.into_iter().map(|m| m.identity.clone()).collect(), removed, upgraded }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.upgraded.is_empty()
    }
}
