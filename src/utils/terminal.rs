//! Terminal output sanitization.
//!
//! Previews and identities come from pages the user does not control. They
//! are passed through [`sanitize_for_terminal`] before the CLI prints them,
//! so embedded escape sequences cannot move the cursor, recolor output, or
//! rewrite the window title.

use std::sync::LazyLock;

use regex::Regex;

/// CSI (`ESC [ ... final`) and OSC (`ESC ] ... BEL` or `ESC ] ... ESC \`) sequences.
static ESCAPE_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?")
        .expect("escape sequence pattern is valid")
});

/// Removes escape sequences and control characters other than tab and newline.
///
/// ```
/// use turn_navigator::utils::terminal::sanitize_for_terminal;
///
/// assert_eq!(sanitize_for_terminal("\x1b[31mRed\x1b[0m text"), "Red text");
/// ```
pub fn sanitize_for_terminal(text: &str) -> String {
    ESCAPE_SEQUENCE
        .replace_all(text, "")
        .chars()
        .filter(|&ch| !ch.is_control() || ch == '\t' || ch == '\n')
        .collect()
}
