//! "Copy Text" for index entries.

use anyhow::{Context, Result, bail};
use arboard::Clipboard;
use tracing::debug;

use crate::models::Message;

/// Maximum clipboard payload in bytes.
pub const MAX_CLIPBOARD_SIZE: usize = 10 * 1024 * 1024;

/// Which text of an entry to copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyTarget {
    #[default]
    Preview,
    FullText,
}

impl CopyTarget {
    pub fn text(self, message: &Message) -> &str {
        match self {
            CopyTarget::Preview => &message.preview,
            // Adapters that never fill the full text still have a preview.
            CopyTarget::FullText if message.full_text.is_empty() => &message.preview,
            CopyTarget::FullText => &message.full_text,
        }
    }
}

/// Clipboard backend, swappable in tests.
pub trait ClipboardProvider {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard through arboard.
pub struct SystemClipboard {
    clipboard: Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let clipboard = Clipboard::new().context("Failed to initialize clipboard")?;
        Ok(Self { clipboard })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.clipboard.set_text(text).context("Failed to set clipboard contents")
    }
}

fn validate_clipboard_text(text: &str) -> Result<()> {
    if text.is_empty() {
        bail!("Cannot copy empty text to clipboard");
    }
    if text.len() > MAX_CLIPBOARD_SIZE {
        bail!("Text too large for clipboard ({} bytes, max {})", text.len(), MAX_CLIPBOARD_SIZE);
    }
    Ok(())
}

/// Copies one entry's text through `provider`, returning the copied text.
pub fn copy_message<'a>(
    message: &'a Message,
    target: CopyTarget,
    provider: &mut dyn ClipboardProvider,
) -> Result<&'a str> {
    let text = target.text(message);
    validate_clipboard_text(text)?;
    provider.set_text(text)?;
    debug!(identity = %message.identity, bytes = text.len(), ?target, "copied to clipboard");
    Ok(text)
}

/// Copies `text` to the system clipboard.
///
/// Validation (non-empty, at most 10 MB) runs before the clipboard is
/// opened, so headless environments still report input errors first.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    validate_clipboard_text(text)?;
    SystemClipboard::new()?.set_text(text)
}
