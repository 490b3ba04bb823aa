//! Conversation session state machine.
//!
//! ```text
//!            begin(target)                   hostile verdict
//!   Idle ───────────────────► Active ─────────────────────────► CoolingDown
//!    ▲                          │  ▲                                 │
//!    │   end() / blank prompt   │  │ follow-up                       │ cooldown
//!    ├──────────────────────────┘  └─────┘                           │ elapses
//!    └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! A session is cheap to clone; clones share state, so the game loop can keep
//! a handle for distance checks while a turn is streaming. Everything runs on
//! one thread in practice; the mutex only makes the handle `Send`.
//!
//! Turns are identified by a [`TurnId`]. Callbacks from a turn that is no
//! longer the session's current turn (the player walked away, or pressed
//! escape) are dropped without touching any state.

mod roster;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::display;
use crate::turn::{TurnId, TurnSink, TurnTicket};
use crate::types::TargetId;

pub use roster::HostilityRoster;

/// Coarse session state, as seen by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No dialogue box is open.
    Idle,
    /// Talking to someone.
    Active,
    /// A hostile verdict is still on screen after the cooldown; `begin()` is
    /// accepted and replaces it.
    Dismissable,
    /// A hostile verdict was reached recently; `begin()` is refused.
    CoolingDown,
}

/// What the answer key does while a conversation is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Prompt the player for a follow-up message.
    Reply,
    /// Close the dialogue box (shown after a hostile verdict).
    Dismiss,
}

/// Result of [`ConversationSession::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginOutcome {
    /// Cooling down or already talking: nothing happened.
    Ignored,
    /// The target is on the roster; the hostile tally is shown, no remote call.
    HostileGreeting {
        /// Roster size, for the tally.
        roster_count: usize,
    },
    /// A new conversation started; run this turn.
    Started(TurnTicket),
}

/// Result of [`ConversationSession::submit_follow_up`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUpOutcome {
    /// No reply-mode conversation to follow up, or a turn is still streaming.
    Ignored,
    /// The prompt was blank or cancelled; the session ended.
    Ended,
    /// Run this turn.
    Started(TurnTicket),
}

#[derive(Debug)]
struct Conversation {
    target: TargetId,
    visible: String,
    mode: InputMode,
    turn: Option<TurnId>,
}

#[derive(Debug)]
struct SessionInner {
    conversation: Option<Conversation>,
    roster: HostilityRoster,
    cooling_until: Option<Instant>,
    next_turn: TurnId,
}

impl SessionInner {
    fn cooling(&self, now: Instant) -> bool {
        self.cooling_until.is_some_and(|until| now < until)
    }

    fn allocate_turn(&mut self) -> TurnId {
        self.next_turn += 1;
        self.next_turn
    }

    /// The conversation, only if `turn` is its in-flight turn.
    fn current(&mut self, turn: TurnId) -> Option<&mut Conversation> {
        self.conversation
            .as_mut()
            .filter(|c| c.turn == Some(turn))
    }
}

/// The single active conversation, the hostility roster and the cooldown.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    inner: Arc<Mutex<SessionInner>>,
    cooldown: Duration,
    hostility_cap: usize,
    opening_message: String,
}

impl ConversationSession {
    /// Create an idle session with an empty roster.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                conversation: None,
                roster: HostilityRoster::new(),
                cooling_until: None,
                next_turn: 0,
            })),
            cooldown: config.cooldown(),
            hostility_cap: config.hostility_cap,
            opening_message: config.opening_message.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Player-driven operations
    // -----------------------------------------------------------------------

    /// Start talking to `target`.
    pub fn begin(&self, target: &TargetId) -> BeginOutcome {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        if inner.cooling(now) {
            debug!(%target, "begin ignored: cooling down");
            return BeginOutcome::Ignored;
        }
        if inner
            .conversation
            .as_ref()
            .is_some_and(|c| c.mode == InputMode::Reply)
        {
            debug!(%target, "begin ignored: conversation already active");
            return BeginOutcome::Ignored;
        }

        if inner.roster.contains(target) {
            inner.conversation = Some(Conversation {
                target: target.clone(),
                visible: String::new(),
                mode: InputMode::Dismiss,
                turn: None,
            });
            inner.cooling_until = Some(now + self.cooldown);
            let roster_count = inner.roster.len();
            info!(%target, roster_count, "target already hostile");
            return BeginOutcome::HostileGreeting { roster_count };
        }

        let id = inner.allocate_turn();
        inner.conversation = Some(Conversation {
            target: target.clone(),
            visible: String::new(),
            mode: InputMode::Reply,
            turn: Some(id),
        });
        info!(%target, turn = id, "conversation started");
        BeginOutcome::Started(TurnTicket {
            id,
            target: target.clone(),
            message: self.opening_message.clone(),
            opening: true,
        })
    }

    /// Continue the conversation with what the player typed.
    ///
    /// `None` or blank text means the prompt was cancelled: the session ends.
    pub fn submit_follow_up(&self, text: Option<&str>) -> FollowUpOutcome {
        let mut inner = self.inner.lock();
        let Some(conversation) = inner.conversation.as_ref() else {
            return FollowUpOutcome::Ignored;
        };
        if conversation.mode != InputMode::Reply || conversation.turn.is_some() {
            return FollowUpOutcome::Ignored;
        }

        let Some(message) = text.filter(|t| !t.trim().is_empty()) else {
            info!(target = %conversation.target, "follow-up cancelled");
            inner.conversation = None;
            return FollowUpOutcome::Ended;
        };

        let id = inner.allocate_turn();
        let Some(conversation) = inner.conversation.as_mut() else {
            return FollowUpOutcome::Ignored;
        };
        conversation.visible.clear();
        conversation.turn = Some(id);
        debug!(target = %conversation.target, turn = id, "follow-up turn");
        FollowUpOutcome::Started(TurnTicket {
            id,
            target: conversation.target.clone(),
            message: message.to_owned(),
            opening: false,
        })
    }

    /// Close the conversation. Any in-flight turn becomes stale.
    pub fn end(&self) {
        let mut inner = self.inner.lock();
        if let Some(conversation) = inner.conversation.take() {
            info!(target = %conversation.target, "conversation ended");
        }
    }

    /// End the conversation if the player moved further than `threshold`
    /// away. Returns whether it ended.
    pub fn distance_check(&self, current_distance: f32, threshold: f32) -> bool {
        if self.is_active() && current_distance > threshold {
            debug!(current_distance, threshold, "out of conversation range");
            self.end();
            true
        } else {
            false
        }
    }

    // -----------------------------------------------------------------------
    // Turn callbacks
    // -----------------------------------------------------------------------

    /// Handle for feeding one turn's events back into this session.
    #[must_use]
    pub fn turn(&self, ticket: &TurnTicket) -> SessionTurn {
        SessionTurn {
            session: self.clone(),
            id: ticket.id,
        }
    }

    fn push_text(&self, turn: TurnId, text: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.current(turn) {
            Some(conversation) => {
                conversation.visible.push_str(text);
                true
            }
            None => {
                debug!(turn, "dropping text for stale turn");
                false
            }
        }
    }

    fn resolve_hostile(&self, turn: TurnId) -> Option<usize> {
        let mut inner = self.inner.lock();
        let target = {
            let conversation = inner.current(turn)?;
            conversation.visible.clear();
            conversation.mode = InputMode::Dismiss;
            conversation.turn = None;
            conversation.target.clone()
        };
        inner.roster.insert(target.clone());
        inner.cooling_until = Some(Instant::now() + self.cooldown);
        let roster_count = inner.roster.len();
        info!(%target, roster_count, "target turned hostile");
        Some(roster_count)
    }

    fn fail_turn(&self, turn: TurnId) -> bool {
        let mut inner = self.inner.lock();
        if inner.current(turn).is_none() {
            return false;
        }
        if let Some(conversation) = inner.conversation.take() {
            warn!(target = %conversation.target, turn, "turn failed, conversation closed");
        }
        true
    }

    fn complete_turn(&self, turn: TurnId) -> bool {
        let mut inner = self.inner.lock();
        match inner.current(turn) {
            Some(conversation) => {
                conversation.turn = None;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Coarse state. Every state except [`SessionState::Idle`] may have a
    /// dialogue box open; see [`Self::is_active`].
    #[must_use]
    pub fn state(&self) -> SessionState {
        let inner = self.inner.lock();
        if inner.cooling(Instant::now()) {
            return SessionState::CoolingDown;
        }
        match inner.conversation.as_ref().map(|c| c.mode) {
            Some(InputMode::Reply) => SessionState::Active,
            Some(InputMode::Dismiss) => SessionState::Dismissable,
            None => SessionState::Idle,
        }
    }

    /// Whether a dialogue box is open (reply or hostile verdict). False
    /// exactly when [`Self::state`] is [`SessionState::Idle`], or during a
    /// cooldown after the verdict was dismissed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.lock().conversation.is_some()
    }

    /// Whether `begin()` would currently be accepted.
    #[must_use]
    pub fn may_begin(&self) -> bool {
        matches!(
            self.state(),
            SessionState::Idle | SessionState::Dismissable
        )
    }

    /// Who the player is talking to.
    #[must_use]
    pub fn active_target(&self) -> Option<TargetId> {
        self.inner
            .lock()
            .conversation
            .as_ref()
            .map(|c| c.target.clone())
    }

    /// Text the dialogue box should show. `Some` exactly when a target is active.
    #[must_use]
    pub fn displayed_text(&self) -> Option<String> {
        let inner = self.inner.lock();
        inner.conversation.as_ref().map(|c| match c.mode {
            InputMode::Reply => display::reply_text(&c.target, &c.visible),
            InputMode::Dismiss => display::hostile_text(inner.roster.iter(), self.hostility_cap),
        })
    }

    /// The raw visible reply text of the current turn.
    #[must_use]
    pub fn visible_text(&self) -> Option<String> {
        self.inner
            .lock()
            .conversation
            .as_ref()
            .map(|c| c.visible.clone())
    }

    /// What the answer key does right now.
    #[must_use]
    pub fn input_mode(&self) -> Option<InputMode> {
        self.inner.lock().conversation.as_ref().map(|c| c.mode)
    }

    /// Whether a turn is streaming.
    #[must_use]
    pub fn turn_in_flight(&self) -> bool {
        self.inner
            .lock()
            .conversation
            .as_ref()
            .is_some_and(|c| c.turn.is_some())
    }

    /// Whether `target` has turned hostile before.
    #[must_use]
    pub fn is_hostile(&self, target: &TargetId) -> bool {
        self.inner.lock().roster.contains(target)
    }

    /// Snapshot of the hostility roster, in order.
    #[must_use]
    pub fn roster(&self) -> Vec<TargetId> {
        self.inner.lock().roster.iter().cloned().collect()
    }
}

/// One turn's view of the session. Every call is a no-op once the turn is
/// stale, and reports whether it took effect.
#[derive(Debug, Clone)]
pub struct SessionTurn {
    session: ConversationSession,
    id: TurnId,
}

impl SessionTurn {
    /// Append visible text.
    pub fn push_text(&self, text: &str) -> bool {
        self.session.push_text(self.id, text)
    }

    /// Record a hostile verdict. Returns the new roster size.
    pub fn resolve_hostile(&self) -> Option<usize> {
        self.session.resolve_hostile(self.id)
    }

    /// Abort the conversation after a transport failure.
    pub fn fail(&self) -> bool {
        self.session.fail_turn(self.id)
    }

    /// Mark the turn finished; follow-ups are accepted again.
    pub fn complete(&self) -> bool {
        self.session.complete_turn(self.id)
    }
}

impl TurnSink for SessionTurn {
    fn on_text_increment(&mut self, text: &str) {
        self.push_text(text);
    }

    fn on_hostile(&mut self) {
        self.resolve_hostile();
    }

    fn on_transport_error(&mut self, error: &dyn std::error::Error) {
        warn!(turn = self.id, %error, "transport error");
        self.fail();
    }

    fn on_complete(&mut self) {
        self.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ConversationSession {
        ConversationSession::new(&SessionConfig::default())
    }

    fn start(session: &ConversationSession, name: &str) -> TurnTicket {
        match session.begin(&TargetId::new(name)) {
            BeginOutcome::Started(ticket) => ticket,
            other => panic!("expected a started turn, got {other:?}"),
        }
    }

    fn assert_invariant(session: &ConversationSession) {
        assert_eq!(
            session.displayed_text().is_some(),
            session.active_target().is_some()
        );
    }

    #[tokio::test]
    async fn begin_starts_opening_turn() {
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.displayed_text(), None);

        let ticket = start(&session, "mira");
        assert!(ticket.opening);
        assert_eq!(ticket.message, "hello");
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.displayed_text().as_deref(), Some("Mira: "));
        assert_invariant(&session);
    }

    #[tokio::test]
    async fn begin_while_active_is_ignored() {
        let session = session();
        start(&session, "mira");
        assert_eq!(session.begin(&"bram".into()), BeginOutcome::Ignored);
        assert_eq!(session.active_target(), Some(TargetId::new("mira")));
    }

    #[tokio::test]
    async fn text_accumulates_and_end_detaches() {
        let session = session();
        let ticket = start(&session, "mira");
        let turn = session.turn(&ticket);
        assert!(turn.push_text("Good"));
        assert!(turn.push_text(" day."));
        assert_eq!(session.visible_text().as_deref(), Some("Good day."));

        session.end();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!turn.push_text(" More."));
        assert_eq!(turn.resolve_hostile(), None);
        assert!(session.roster().is_empty());
        assert_invariant(&session);
    }

    #[tokio::test]
    async fn follow_up_requires_finished_turn() {
        let session = session();
        let ticket = start(&session, "mira");
        assert_eq!(session.submit_follow_up(Some("hi")), FollowUpOutcome::Ignored);

        let turn = session.turn(&ticket);
        turn.push_text("Hello.");
        assert!(turn.complete());

        let FollowUpOutcome::Started(next) = session.submit_follow_up(Some("Nice hat.")) else {
            panic!("follow-up should start a turn");
        };
        assert!(!next.opening);
        assert_eq!(next.message, "Nice hat.");
        assert_eq!(next.target, TargetId::new("mira"));
        assert_eq!(session.visible_text().as_deref(), Some(""));
        // The previous turn is stale now.
        assert!(!turn.push_text("late"));
    }

    #[tokio::test]
    async fn blank_follow_up_ends_session() {
        let session = session();
        let ticket = start(&session, "mira");
        session.turn(&ticket).complete();
        assert_eq!(session.submit_follow_up(Some("   ")), FollowUpOutcome::Ended);
        assert!(!session.is_active());

        let ticket = start(&session, "mira");
        session.turn(&ticket).complete();
        assert_eq!(session.submit_follow_up(None), FollowUpOutcome::Ended);
        assert_invariant(&session);
    }

    #[tokio::test(start_paused = true)]
    async fn hostile_verdict_fills_roster_and_cools_down() {
        let session = session();
        let ticket = start(&session, "mira");
        assert_eq!(session.turn(&ticket).resolve_hostile(), Some(1));

        assert_eq!(session.state(), SessionState::CoolingDown);
        assert_eq!(session.input_mode(), Some(InputMode::Dismiss));
        assert_eq!(
            session.displayed_text().as_deref(),
            Some("You've angered: mira\n\n1/10")
        );
        assert_eq!(session.begin(&"bram".into()), BeginOutcome::Ignored);

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert_eq!(session.begin(&"bram".into()), BeginOutcome::Ignored);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(session.state(), SessionState::Dismissable);
        let ticket = start(&session, "bram");
        assert_eq!(ticket.target, TargetId::new("bram"));
        assert_invariant(&session);
    }

    #[tokio::test(start_paused = true)]
    async fn roster_short_circuits_forever() {
        let session = session();
        let ticket = start(&session, "mira");
        session.turn(&ticket).resolve_hostile();
        session.end();

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(
            session.begin(&"mira".into()),
            BeginOutcome::HostileGreeting { roster_count: 1 }
        );
        assert_eq!(session.state(), SessionState::CoolingDown);
        assert!(!session.turn_in_flight());
        assert!(session.is_hostile(&"mira".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_survives_end() {
        let session = session();
        let ticket = start(&session, "mira");
        session.turn(&ticket).resolve_hostile();
        session.end();
        assert_eq!(session.state(), SessionState::CoolingDown);
        assert!(!session.may_begin());
    }

    #[tokio::test(start_paused = true)]
    async fn verdict_left_open_is_dismissable_after_cooldown() {
        let session = session();
        let ticket = start(&session, "mira");
        session.turn(&ticket).resolve_hostile();
        tokio::time::advance(Duration::from_millis(2000)).await;

        assert_eq!(session.state(), SessionState::Dismissable);
        assert!(session.is_active());
        assert!(session.may_begin());

        session.end();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn transport_failure_closes_without_roster_change() {
        let session = session();
        let ticket = start(&session, "mira");
        assert!(session.turn(&ticket).fail());
        assert!(!session.is_active());
        assert!(session.roster().is_empty());
        assert!(session.may_begin());
    }

    #[tokio::test]
    async fn distance_check_ends_only_when_exceeded() {
        let session = session();
        assert!(!session.distance_check(500.0, 100.0));
        start(&session, "mira");
        assert!(!session.distance_check(99.0, 100.0));
        assert!(session.is_active());
        assert!(session.distance_check(101.0, 100.0));
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn stale_turn_cannot_touch_new_conversation() {
        let session = session();
        let first = start(&session, "mira");
        session.end();
        let second = start(&session, "bram");

        let stale = session.turn(&first);
        assert!(!stale.push_text("from mira"));
        assert_eq!(stale.resolve_hostile(), None);
        assert!(!stale.fail());
        assert!(session.is_active());
        assert!(session.turn(&second).push_text("from bram"));
        assert_eq!(session.visible_text().as_deref(), Some("from bram"));
    }
}
