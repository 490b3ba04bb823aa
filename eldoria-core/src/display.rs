//! What the dialogue box shows.
//!
//! Rendering itself belongs to the game; these helpers only compose the text.

use crate::types::TargetId;

/// Hint appended below a reply once text starts arriving.
pub const CONTINUE_HINT: &str = "\n\n\nPress Space to answer or Escape to leave...";

/// Dialogue box text for a reply in progress.
///
/// Before the first increment only the speaker's name is shown.
#[must_use]
pub fn reply_text(target: &TargetId, visible: &str) -> String {
    let name = target.display_name();
    if visible.is_empty() {
        format!("{name}: ")
    } else {
        format!("{name}: {visible}{CONTINUE_HINT}")
    }
}

/// Dialogue box text after a target turns hostile: the running tally.
#[must_use]
pub fn hostile_text<'a>(
    roster: impl ExactSizeIterator<Item = &'a TargetId>,
    cap: usize,
) -> String {
    let count = roster.len();
    let names: Vec<&str> = roster.map(TargetId::as_str).collect();
    format!("You've angered: {}\n\n{count}/{cap}", names.join(","))
}
