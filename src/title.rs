//! Generated titles for index entries.
//!
//! The engine only shapes the request and keeps the consumer-side view
//! consistent; the network call lives behind [`TitleGenerator`]. A title
//! replaces the preview shown for one entry and never touches the [`Index`].
//!
//! [`Index`]: crate::models::Index

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapters::text::collapse_whitespace;
use crate::identity::Identity;
use crate::models::Message;
use crate::session::Session;

/// Shown in place of the preview while a title is being generated.
pub const PENDING_LABEL: &str = "Summarizing...";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
        }
    }

    /// Cheap shape check run before any generator call.
    pub fn accepts_key(self, key: &str) -> bool {
        match self {
            Provider::OpenAi => {
                key.starts_with("sk-") && key.len() > 3 && !key.chars().any(char::is_whitespace)
            }
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            other => Err(format!("Unsupported provider '{other}' (expected: openai)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleRequest {
    pub full_text: String,
    pub api_key: String,
    pub provider: Provider,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TitleResponse {
    pub summary: String,
}

/// Turns a message's full text into a short title.
pub trait TitleGenerator {
    fn generate(&mut self, request: &TitleRequest) -> Result<TitleResponse, String>;
}

impl<F> TitleGenerator for F
where
    F: FnMut(&TitleRequest) -> Result<TitleResponse, String>,
{
    fn generate(&mut self, request: &TitleRequest) -> Result<TitleResponse, String> {
        self(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleError {
    #[error("API key is missing")]
    MissingApiKey,
    #[error("API key is not a valid {0} key")]
    MalformedApiKey(Provider),
    #[error("no entry with identity {0} in the current index")]
    UnknownEntry(Identity),
    #[error("title generation failed: {0}")]
    Generation(String),
}

/// Canonical prompt for generator implementations.
pub fn build_title_prompt(full_text: &str) -> String {
    format!(
        "Generate a concise, 5-8 word title for the following text. \
         Do not add any other text, just the title. Text: \"\"\"{full_text}\"\"\""
    )
}

/// Strips quotes and collapses whitespace in a generated summary.
pub fn clean_summary(raw: &str) -> String {
    let unquoted: String = raw.chars().filter(|c| !matches!(c, '"' | '\u{201c}' | '\u{201d}')).collect();
    collapse_whitespace(&unquoted)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Pending { previous: Option<String> },
    Titled(String),
}

/// What the consumer shows for each entry once titles are involved.
#[derive(Debug, Default, Clone)]
pub struct TitleView {
    slots: HashMap<Identity, Slot>,
}

impl TitleView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to display for `message`: its title, the pending label, or the preview.
    pub fn display<'a>(&'a self, message: &'a Message) -> &'a str {
        match self.slots.get(&message.identity) {
            Some(Slot::Titled(title)) => title,
            Some(Slot::Pending { .. }) => PENDING_LABEL,
            None => &message.preview,
        }
    }

    pub fn is_pending(&self, identity: &Identity) -> bool {
        matches!(self.slots.get(identity), Some(Slot::Pending { .. }))
    }

    pub fn title(&self, identity: &Identity) -> Option<&str> {
        match self.slots.get(identity) {
            Some(Slot::Titled(title)) => Some(title),
            _ => None,
        }
    }

    pub fn mark_pending(&mut self, identity: &Identity) {
        let previous = match self.slots.remove(identity) {
            Some(Slot::Titled(title)) => Some(title),
            Some(Slot::Pending { previous }) => previous,
            None => None,
        };
        self.slots.insert(identity.clone(), Slot::Pending { previous });
    }

    pub fn resolve(&mut self, identity: &Identity, title: String) {
        self.slots.insert(identity.clone(), Slot::Titled(title));
    }

    /// Puts back whatever was shown before [`TitleView::mark_pending`].
    pub fn restore(&mut self, identity: &Identity) {
        if let Some(Slot::Pending { previous }) = self.slots.remove(identity)
            && let Some(title) = previous
        {
            self.slots.insert(identity.clone(), Slot::Titled(title));
        }
    }

    /// Drops every title, e.g. after a conversation switch.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Requests a title for the entry with `identity` and updates `view`.
///
/// The key is checked before the generator runs. On failure the view shows
/// what it showed before the request.
pub fn request_title(
    session: &Session,
    identity: &Identity,
    api_key: Option<&str>,
    provider: Provider,
    generator: &mut impl TitleGenerator,
    view: &mut TitleView,
) -> Result<String, TitleError> {
    let api_key = api_key.map(str::trim).filter(|k| !k.is_empty()).ok_or(TitleError::MissingApiKey)?;
    if !provider.accepts_key(api_key) {
        return Err(TitleError::MalformedApiKey(provider));
    }
    let message = session.index().get(identity).ok_or_else(|| TitleError::UnknownEntry(identity.clone()))?;

    let request = TitleRequest {
        full_text: message.full_text.clone(),
        api_key: api_key.to_string(),
        provider,
    };
    view.mark_pending(identity);
    debug!(%identity, %provider, chars = request.full_text.len(), "title requested");

    match generator.generate(&request) {
        Ok(response) => {
            let title = clean_summary(&response.summary);
            view.resolve(identity, title.clone());
            Ok(title)
        }
        Err(reason) => {
            warn!(%identity, %provider, error = %reason, "title generation failed");
            view.restore(identity);
            Err(TitleError::Generation(reason))
        }
    }
}
