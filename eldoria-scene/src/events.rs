//! Scene input events that drive the conversation.

use eldoria_core::TargetId;

/// Something the player did that the conversation layer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Pressed the interact key while overlapping an NPC.
    Interact(TargetId),
    /// Pressed the answer key (space) with a dialogue box open.
    Answer,
    /// Pressed the leave key (escape).
    Cancel,
    /// Per-frame distance between the player and the active NPC.
    Moved {
        /// Current distance in world units.
        distance: f32,
    },
}

impl SceneEvent {
    /// Shorthand for [`SceneEvent::Interact`].
    #[must_use]
    pub fn interact(target: impl Into<TargetId>) -> Self {
        Self::Interact(target.into())
    }

    /// Shorthand for [`SceneEvent::Moved`].
    #[must_use]
    pub fn moved(distance: f32) -> Self {
        Self::Moved { distance }
    }
}
