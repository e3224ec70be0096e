use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::identity::{Identity, IdentitySource};
use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn opposite(self) -> Role {
        match self {
            Role::User => Role::Assistant,
            Role::Assistant => Role::User,
        }
    }

    /// Maps the role vocabulary used by chat front-ends onto the two index roles.
    pub fn from_token(token: &str) -> Option<Role> {
        match token.trim().to_ascii_lowercase().as_str() {
            "user" | "human" | "you" => Some(Role::User),
            "assistant" | "model" | "ai" | "bot" | "tool" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Attachment shown next to a message. Variants are declared in detection priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    #[default]
    None,
    Image,
    Pdf,
    Code,
    Document,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 5] = [
        AttachmentKind::Image,
        AttachmentKind::Pdf,
        AttachmentKind::Code,
        AttachmentKind::Document,
        AttachmentKind::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttachmentKind::None => "none",
            AttachmentKind::Image => "image",
            AttachmentKind::Pdf => "pdf",
            AttachmentKind::Code => "code",
            AttachmentKind::Document => "document",
        }
    }

    pub fn is_some(self) -> bool {
        self != AttachmentKind::None
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttachmentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown attachment kind '{}'", s))
    }
}

/// One conversation turn in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub identity: Identity,
    pub identity_source: IdentitySource,
    pub role: Role,
    pub preview: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_text: String,
    pub attachment: AttachmentKind,
    /// 1-based ordinal, user messages only.
    pub serial: Option<u32>,
    /// Non-owning handle used for jump requests.
    #[serde(skip)]
    pub source: NodeId,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
