//! Presentation hooks: what the conversation layer asks of the renderer.
//!
//! Rendering, animation and input polling stay in the game; these callbacks
//! are the whole contract.

/// Callbacks implemented by the game's renderer.
pub trait Presentation {
    /// A piece of reply text arrived; append it to the dialogue box.
    fn on_text_increment(&mut self, text: &str);

    /// The NPC is (or just became) hostile. `tally` is the full dialogue box
    /// text; `roster_count` is how many NPCs have turned so far.
    fn on_hostile_greeting(&mut self, roster_count: usize, tally: &str);

    /// The turn failed to reach the NPC; the dialogue box is closing.
    fn on_transport_error(&mut self, error: &dyn std::error::Error);

    /// Ask the player what to say next. `None` means the prompt was cancelled.
    fn request_follow_up_text(&mut self) -> Option<String>;

    /// Freeze movement and hotkeys (while a modal prompt is up).
    fn disable_controls(&mut self);

    /// Restore movement and hotkeys.
    fn enable_controls(&mut self);

    /// The dialogue box was closed.
    fn on_dialogue_closed(&mut self) {}
}
