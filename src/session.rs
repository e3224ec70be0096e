//! Per-conversation session context.
//!
//! A [`Session`] owns the only mutable engine state: the current [`Index`] and
//! the cross-scan identity record. It is passed explicitly to the builder,
//! the runtime, and the jump and title operations.

use tracing::info;
use uuid::Uuid;

use crate::adapters::Platform;
use crate::identity::IdentityResolver;
use crate::models::Index;

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    platform: Platform,
    index: Index,
    identities: IdentityResolver,
    /// A conversation switch happened since the last accepted build.
    switched: bool,
}

impl Session {
    pub fn new(platform: Platform) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform,
            index: Index::default(),
            identities: IdentityResolver::new(),
            switched: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn identities(&self) -> &IdentityResolver {
        &self.identities
    }

    pub fn switched_since_build(&self) -> bool {
        self.switched
    }

    /// Clears the index and identity state after a conversation switch.
    pub fn reset(&mut self) {
        info!(session = %self.id, dropped = self.index.len(), "session reset");
        self.index.clear();
        self.identities.clear();
        self.switched = true;
    }

    /// Installs an accepted index.
    pub(crate) fn accept(&mut self, index: Index) {
        self.identities.remember(&index);
        self.index = index;
        self.switched = false;
    }
}
