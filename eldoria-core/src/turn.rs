//! Turn bookkeeping shared between the session and whoever drives a turn.

use crate::types::TargetId;

/// Monotonic identifier of one turn within a session.
pub type TurnId = u64;

/// Everything needed to issue one turn's outbound request.
///
/// Handed out by the session when it accepts a `begin` or a follow-up; the
/// `id` is what the session later uses to tell live callbacks from stale ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTicket {
    /// Turn identifier.
    pub id: TurnId,
    /// Who the player is talking to.
    pub target: TargetId,
    /// Message to send.
    pub message: String,
    /// Whether this is the opening turn (the request carries the target's lore).
    pub opening: bool,
}

/// How a turn ended, from the driver's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Signal resolved `false`; the stream ran to completion.
    Continued,
    /// Signal resolved `true`; consumption stopped early.
    Hostile,
    /// The stream ended without resolving a signal. Treated as hostile.
    Unresolved,
    /// The request failed or the stream broke.
    TransportFailed,
}

impl TurnOutcome {
    /// Whether the outcome adds the target to the hostility roster.
    #[must_use]
    pub fn is_hostile(self) -> bool {
        matches!(self, Self::Hostile | Self::Unresolved)
    }
}

/// Receiver of a running turn's events.
///
/// Callbacks fire in stream order, each text increment as soon as it is
/// decoded. After `on_hostile` or `on_transport_error` nothing else is sent.
pub trait TurnSink {
    /// A piece of visible reply text.
    fn on_text_increment(&mut self, text: &str);

    /// The turn ended hostile (explicitly, or because no signal resolved).
    fn on_hostile(&mut self);

    /// The request or the stream failed.
    fn on_transport_error(&mut self, error: &dyn std::error::Error);

    /// The stream completed normally after a peaceful signal.
    fn on_complete(&mut self) {}
}
