use serde::Serialize;

use super::message::{AttachmentKind, Message, Role};
use crate::identity::Identity;

/// Ordered snapshot of the conversation, in document order of the last accepted scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Index {
    messages: Vec<Message>,
}

impl Index {
    /// Wraps messages that already satisfy the uniqueness and serial invariants.
    pub(crate) fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn get(&self, identity: &Identity) -> Option<&Message> {
        self.messages.iter().find(|m| &m.identity == identity)
    }

    pub fn find_str(&self, identity: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.identity.as_str() == identity)
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    pub fn count_attachment(&self, kind: AttachmentKind) -> usize {
        self.messages.iter().filter(|m| m.attachment == kind).count()
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
