//! Conversation controller: runs one turn end to end.
//!
//! ```text
//! open ─► next fragment ─► FrameDecoder ─► tokens ─► SignalDetector ─┬─► TextToken  → sink.on_text_increment
//!              ▲                                                     ├─► true       → sink.on_hostile, stop
//!              └──────────────────── more fragments ◄────────────────┴─► Pending / false
//! ```
//!
//! Exactly one read is outstanding at a time. A hostile verdict stops
//! consumption immediately; the stream is dropped without waiting for the
//! remote side to close it.

use eldoria_core::config::StreamConfig;
use eldoria_core::stream::{FrameDecoder, SignalDetector, SignalOutcome};
use eldoria_core::turn::{TurnOutcome, TurnSink, TurnTicket};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::transport::DialogueTransport;
use crate::types::ConversationRequest;

/// Drives a turn's stream through the decoder and signal detector.
///
/// Holds no per-turn state: every `run_turn` builds a fresh decoder and
/// detector, so one controller serves any number of sequential turns.
#[derive(Debug, Clone)]
pub struct ConversationController {
    max_partial_bytes: usize,
}

impl ConversationController {
    /// Create a controller with the configured stream limits.
    #[must_use]
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            max_partial_bytes: config.max_partial_bytes,
        }
    }

    /// Run one turn.
    ///
    /// `lore` is sent only on an opening turn. Every outcome is also reported
    /// through `sink`; the return value is for the caller's bookkeeping.
    pub async fn run_turn<T, S>(
        &self,
        transport: &T,
        ticket: &TurnTicket,
        lore: Option<&str>,
        sink: &mut S,
    ) -> TurnOutcome
    where
        T: DialogueTransport,
        S: TurnSink + ?Sized,
    {
        let request = ConversationRequest::for_turn(ticket, lore);
        debug!(turn = ticket.id, npc = %request.npc_name, opening = ticket.opening, "turn started");

        let mut stream = match transport.open(&request).await {
            Ok(stream) => stream,
            Err(e) => return Self::fail(ticket, &e, sink),
        };

        let mut frames = FrameDecoder::new(self.max_partial_bytes);
        let mut signal = SignalDetector::new();

        while let Some(fragment) = stream.next().await {
            let decoded = fragment.and_then(|bytes| frames.push(&bytes).map_err(LlmError::from));
            let tokens = match decoded {
                Ok(tokens) => tokens,
                Err(e) => return Self::fail(ticket, &e, sink),
            };
            if Self::feed(&mut signal, tokens, sink) {
                info!(turn = ticket.id, npc = %request.npc_name, "hostile verdict");
                return TurnOutcome::Hostile;
            }
        }

        let tail = match frames.finish() {
            Ok(tokens) => tokens,
            Err(e) => return Self::fail(ticket, &LlmError::from(e), sink),
        };
        if Self::feed(&mut signal, tail, sink) {
            info!(turn = ticket.id, npc = %request.npc_name, "hostile verdict");
            return TurnOutcome::Hostile;
        }

        match signal.resolution() {
            Some(_) => {
                debug!(turn = ticket.id, "turn complete");
                sink.on_complete();
                TurnOutcome::Continued
            }
            None => {
                warn!(turn = ticket.id, npc = %request.npc_name, "stream ended without a signal");
                sink.on_hostile();
                TurnOutcome::Unresolved
            }
        }
    }

    /// Push tokens through the detector. Returns `true` on a hostile verdict.
    fn feed<S: TurnSink + ?Sized>(
        signal: &mut SignalDetector,
        tokens: Vec<String>,
        sink: &mut S,
    ) -> bool {
        for token in tokens {
            match signal.observe(token) {
                SignalOutcome::Pending => {}
                SignalOutcome::SignalDetected(true) => {
                    sink.on_hostile();
                    return true;
                }
                SignalOutcome::SignalDetected(false) => debug!("signal resolved peaceful"),
                SignalOutcome::TextToken(text) => sink.on_text_increment(&text),
            }
        }
        false
    }

    fn fail<S: TurnSink + ?Sized>(
        ticket: &TurnTicket,
        error: &LlmError,
        sink: &mut S,
    ) -> TurnOutcome {
        warn!(turn = ticket.id, npc = %ticket.target, %error, "turn failed");
        sink.on_transport_error(error);
        TurnOutcome::TransportFailed
    }
}

impl Default for ConversationController {
    fn default() -> Self {
        Self::new(&StreamConfig::default())
    }
}
