//! The scene driver: routes player input into the session and runs turns.

use eldoria_core::EldoriaConfig;
use eldoria_core::session::{BeginOutcome, FollowUpOutcome, InputMode, SessionTurn};
use eldoria_core::turn::{TurnOutcome, TurnTicket};
use eldoria_core::{ConversationSession, TargetId, TurnSink};
use eldoria_llm::{ConversationController, DialogueTransport};
use tracing::debug;

use crate::characters::CharacterRegistry;
use crate::events::SceneEvent;
use crate::presentation::Presentation;

/// Owns one player's conversation state and dispatches scene events.
///
/// Turns run inside [`DialogueScene::handle`]. Anything that must reach the
/// session while a turn is streaming (a range check from the physics step,
/// say) goes through a [`ConversationSession`] handle from
/// [`DialogueScene::session`]; late text from a turn ended that way is
/// dropped.
pub struct DialogueScene<T, P> {
    session: ConversationSession,
    controller: ConversationController,
    transport: T,
    characters: CharacterRegistry,
    presentation: P,
    conversation_distance: f32,
}

impl<T, P> DialogueScene<T, P>
where
    T: DialogueTransport,
    P: Presentation,
{
    /// Build a scene from configuration.
    #[must_use]
    pub fn new(
        config: &EldoriaConfig,
        transport: T,
        characters: CharacterRegistry,
        presentation: P,
    ) -> Self {
        Self {
            session: ConversationSession::new(&config.session),
            controller: ConversationController::new(&config.stream),
            transport,
            characters,
            presentation,
            conversation_distance: config.session.conversation_distance,
        }
    }

    /// A handle to the shared session.
    #[must_use]
    pub fn session(&self) -> ConversationSession {
        self.session.clone()
    }

    /// Handle one input event. Returns the outcome of the turn it ran, if any.
    pub async fn handle(&mut self, event: SceneEvent) -> Option<TurnOutcome> {
        match event {
            SceneEvent::Interact(target) => self.interact(&target).await,
            SceneEvent::Answer => self.answer().await,
            SceneEvent::Cancel => {
                self.cancel();
                None
            }
            SceneEvent::Moved { distance } => {
                self.moved(distance);
                None
            }
        }
    }

    async fn interact(&mut self, target: &TargetId) -> Option<TurnOutcome> {
        match self.session.begin(target) {
            BeginOutcome::Ignored => None,
            BeginOutcome::HostileGreeting { roster_count } => {
                let tally = self.session.displayed_text().unwrap_or_default();
                self.presentation.on_hostile_greeting(roster_count, &tally);
                None
            }
            BeginOutcome::Started(ticket) => {
                self.presentation.disable_controls();
                let outcome = self.run(&ticket).await;
                self.presentation.enable_controls();
                Some(outcome)
            }
        }
    }

    async fn answer(&mut self) -> Option<TurnOutcome> {
        match self.session.input_mode()? {
            InputMode::Dismiss => {
                self.close();
                None
            }
            InputMode::Reply => {
                if self.session.turn_in_flight() {
                    debug!("answer ignored: reply still streaming");
                    return None;
                }
                self.presentation.disable_controls();
                let text = self.presentation.request_follow_up_text();
                self.presentation.enable_controls();

                match self.session.submit_follow_up(text.as_deref()) {
                    FollowUpOutcome::Started(ticket) => Some(self.run(&ticket).await),
                    FollowUpOutcome::Ended => {
                        self.presentation.on_dialogue_closed();
                        None
                    }
                    FollowUpOutcome::Ignored => None,
                }
            }
        }
    }

    fn cancel(&mut self) {
        if self.session.is_active() {
            self.close();
        }
    }

    fn moved(&mut self, distance: f32) {
        if self
            .session
            .distance_check(distance, self.conversation_distance)
        {
            self.presentation.on_dialogue_closed();
        }
    }

    fn close(&mut self) {
        self.session.end();
        self.presentation.on_dialogue_closed();
    }

    async fn run(&mut self, ticket: &TurnTicket) -> TurnOutcome {
        let lore = if ticket.opening {
            self.characters.lore(&ticket.target)
        } else {
            None
        };
        let mut sink = SceneSink {
            turn: self.session.turn(ticket),
            session: &self.session,
            presentation: &mut self.presentation,
        };
        let outcome = self
            .controller
            .run_turn(&self.transport, ticket, lore, &mut sink)
            .await;
        debug!(target = %ticket.target, ?outcome, hostile = outcome.is_hostile(), "turn finished");
        outcome
    }
}

/// Applies turn events to the session and forwards the ones it accepted.
struct SceneSink<'a, P> {
    turn: SessionTurn,
    session: &'a ConversationSession,
    presentation: &'a mut P,
}

impl<P: Presentation> TurnSink for SceneSink<'_, P> {
    fn on_text_increment(&mut self, text: &str) {
        if self.turn.push_text(text) {
            self.presentation.on_text_increment(text);
        }
    }

    fn on_hostile(&mut self) {
        if let Some(roster_count) = self.turn.resolve_hostile() {
            let tally = self.session.displayed_text().unwrap_or_default();
            self.presentation.on_hostile_greeting(roster_count, &tally);
        }
    }

    fn on_transport_error(&mut self, error: &dyn std::error::Error) {
        if self.turn.fail() {
            self.presentation.on_transport_error(error);
        }
    }

    fn on_complete(&mut self) {
        self.turn.complete();
    }
}
