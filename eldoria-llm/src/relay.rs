//! In-process conversation relay backed by a local Ollama.
//!
//! Plays the role a dialogue server would: it keeps one chat history per
//! NPC, seeded with the world prompt and the NPC's lore, streams the model's
//! reply from `/api/chat`, and re-frames every content delta as a `data:`
//! record so the controller sees exactly what the HTTP endpoint would send.
//!
//! The assistant reply is appended to the history only when the model
//! finishes. A turn abandoned early (hostile verdict, player walked off)
//! leaves just the player's message behind.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use bytes::Bytes;
use eldoria_core::TargetId;
use eldoria_core::config::{RelayConfig, StreamConfig};
use eldoria_core::stream::{DATA_MARKER, LineBuffer, Utf8Decoder};
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::prompt;
use crate::transport::{ByteStream, DialogueTransport};
use crate::types::{ChatChunk, ChatMessage, ChatRole, ConversationRequest};

/// One NPC's chat history.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    /// A fresh history seeded with the world prompt and `lore`.
    #[must_use]
    pub fn new(lore: &str) -> Self {
        Self {
            messages: prompt::seed_messages(lore),
        }
    }

    /// Append a message.
    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    /// All messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Drop everything and re-seed with `lore`.
    pub fn reset(&mut self, lore: &str) {
        self.messages = prompt::seed_messages(lore);
    }
}

type Histories = Arc<Mutex<HashMap<TargetId, ConversationHistory>>>;

/// Transport that talks to Ollama directly and keeps NPC histories in memory.
#[derive(Debug, Clone)]
pub struct ConversationRelay {
    http: Client,
    base_url: String,
    model: String,
    max_partial_bytes: usize,
    histories: Histories,
}

impl ConversationRelay {
    /// Create a relay for the configured Ollama instance.
    ///
    /// # Errors
    /// [`LlmError::ConfigError`] if the base URL or the model name is blank.
    pub fn new(config: &RelayConfig, stream: &StreamConfig) -> Result<Self, LlmError> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(LlmError::ConfigError("relay.base_url is empty".into()));
        }
        if config.model.trim().is_empty() {
            return Err(LlmError::ConfigError("relay.model is empty".into()));
        }
        Ok(Self {
            http: Client::new(),
            base_url: base_url.to_owned(),
            model: config.model.trim().to_owned(),
            max_partial_bytes: stream.max_partial_bytes,
            histories: Arc::default(),
        })
    }

    /// Load the model into memory with a throwaway generation.
    ///
    /// # Errors
    /// Returns an error if Ollama is unreachable or rejects the request.
    pub async fn preload(&self) -> Result<(), LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": self.model,
            "prompt": prompt::PRELOAD_PROMPT,
            "stream": false,
        });
        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        info!(model = %self.model, "model preloaded");
        Ok(())
    }

    /// Re-seed an NPC's history, creating it if needed.
    pub fn reset(&self, npc: &TargetId, lore: &str) {
        self.histories
            .lock()
            .entry(npc.clone())
            .and_modify(|h| h.reset(lore))
            .or_insert_with(|| ConversationHistory::new(lore));
    }

    /// Snapshot of an NPC's history.
    #[must_use]
    pub fn history(&self, npc: &TargetId) -> Option<Vec<ChatMessage>> {
        self.histories
            .lock()
            .get(npc)
            .map(|h| h.messages().to_vec())
    }

    /// Append the player's message to the NPC's history and return the
    /// messages to send.
    ///
    /// # Errors
    /// [`LlmError::MissingSystemPrompt`] when the NPC has no history yet and
    /// the request carries no lore to seed one.
    pub fn record_player_message(
        &self,
        request: &ConversationRequest,
    ) -> Result<Vec<ChatMessage>, LlmError> {
        let mut histories = self.histories.lock();
        let history = match histories.entry(TargetId::new(request.npc_name.as_str())) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let lore = request
                    .system
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| LlmError::MissingSystemPrompt(request.npc_name.clone()))?;
                debug!(npc = %request.npc_name, "new conversation history");
                entry.insert(ConversationHistory::new(lore))
            }
        };
        history.push(ChatRole::User, request.message.as_str());
        Ok(history.messages().to_vec())
    }
}

impl DialogueTransport for ConversationRelay {
    async fn open(&self, request: &ConversationRequest) -> Result<ByteStream, LlmError> {
        let messages = self.record_player_message(request)?;

        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });
        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "ollama rejected chat request");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let upstream: ByteStream = Box::pin(response.bytes_stream().map_err(LlmError::from));
        Ok(reframe(
            upstream,
            Arc::clone(&self.histories),
            TargetId::new(request.npc_name.as_str()),
            self.max_partial_bytes,
        ))
    }
}

// ---------------------------------------------------------------------------
// NDJSON → data records
// ---------------------------------------------------------------------------

struct Reframer {
    upstream: ByteStream,
    utf8: Utf8Decoder,
    lines: LineBuffer,
    reply: String,
    histories: Histories,
    npc: TargetId,
    finished: bool,
    recorded: bool,
}

impl Reframer {
    /// Turn complete NDJSON lines into data records. Also reports whether the
    /// model signalled `done`.
    fn frame(&mut self, lines: Vec<String>) -> Result<(String, bool), LlmError> {
        let mut out = String::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let chunk: ChatChunk =
                serde_json::from_str(line).map_err(|e| LlmError::ParseError(e.to_string()))?;
            if let Some(error) = chunk.error {
                warn!(npc = %self.npc, %error, "ollama failed mid-stream");
                return Err(LlmError::RequestFailed(error));
            }
            if let Some(message) = chunk.message {
                self.reply.push_str(&message.content);
                push_event(&mut out, &message.content);
            }
            if chunk.done {
                return Ok((out, true));
            }
        }
        Ok((out, false))
    }

    fn record_reply(&mut self) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        let reply = std::mem::take(&mut self.reply);
        if let Some(history) = self.histories.lock().get_mut(&self.npc) {
            history.push(ChatRole::Assistant, reply);
        }
    }
}

/// Append one event: a data record per line of `data`, then a blank line.
fn push_event(out: &mut String, data: &str) {
    for line in data.split('\n') {
        out.push_str(DATA_MARKER);
        out.push(' ');
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
}

fn reframe(
    upstream: ByteStream,
    histories: Histories,
    npc: TargetId,
    max_partial_bytes: usize,
) -> ByteStream {
    let state = Reframer {
        upstream,
        utf8: Utf8Decoder::new(),
        lines: LineBuffer::with_limit(max_partial_bytes),
        reply: String::new(),
        histories,
        npc,
        finished: false,
        recorded: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        while !state.finished {
            let lines = match state.upstream.next().await {
                Some(Ok(chunk)) => {
                    let text = state.utf8.decode(&chunk);
                    state.lines.append(&text)
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    let tail = state.utf8.finish();
                    state.lines.append(&tail).map(|mut lines| {
                        lines.extend(state.lines.finish());
                        lines
                    })
                }
            };

            match lines.map_err(LlmError::from).and_then(|lines| state.frame(lines)) {
                Ok((out, done)) => {
                    if done {
                        state.finished = true;
                    }
                    if state.finished {
                        state.record_reply();
                    }
                    if !out.is_empty() {
                        return Some((Ok(Bytes::from(out)), state));
                    }
                }
                Err(e) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
            }
        }
        None
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ConversationController;
    use eldoria_core::ConversationSession;
    use eldoria_core::config::SessionConfig;
    use eldoria_core::session::BeginOutcome;
    use eldoria_core::turn::TurnOutcome;

    fn relay() -> ConversationRelay {
        ConversationRelay::new(&RelayConfig::default(), &StreamConfig::default())
            .expect("default relay config")
    }

    #[test]
    fn blank_model_or_url_is_config_error() {
        for (base_url, model) in [("http://localhost:11434", "  "), ("/", "llama3")] {
            let err = ConversationRelay::new(
                &RelayConfig {
                    base_url: base_url.into(),
                    model: model.into(),
                },
                &StreamConfig::default(),
            )
            .expect_err("blank setting");
            assert!(matches!(err, LlmError::ConfigError(_)), "got {err:?}");
        }
    }

    fn request(message: &str, system: Option<&str>) -> ConversationRequest {
        ConversationRequest {
            message: message.into(),
            npc_name: "mira".into(),
            system: system.map(str::to_owned),
        }
    }

    fn upstream(chunks: &[&'static str]) -> ByteStream {
        let items: Vec<Result<Bytes, LlmError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        Box::pin(stream::iter(items))
    }

    async fn collect_text(stream: ByteStream) -> String {
        let chunks: Vec<Result<Bytes, LlmError>> = stream.collect().await;
        chunks
            .into_iter()
            .map(|c| String::from_utf8(c.expect("chunk").to_vec()).expect("utf8"))
            .collect()
    }

    #[test]
    fn first_message_needs_lore() {
        let relay = relay();
        let err = relay
            .record_player_message(&request("hello", None))
            .expect_err("no lore");
        assert!(matches!(err, LlmError::MissingSystemPrompt(ref npc) if npc == "mira"));
        assert!(relay.history(&"mira".into()).is_none());
    }

    #[test]
    fn history_grows_and_ignores_later_lore() {
        let relay = relay();
        let sent = relay
            .record_player_message(&request("hello", Some("A baker.")))
            .expect("seeded");
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].content, "A baker.");
        assert_eq!(sent[2], ChatMessage::new(ChatRole::User, "hello"));

        let sent = relay
            .record_player_message(&request("Nice hat.", Some("A pirate.")))
            .expect("existing history");
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[1].content, "A baker.");
    }

    #[test]
    fn reset_reseeds_history() {
        let relay = relay();
        relay
            .record_player_message(&request("hello", Some("A baker.")))
            .expect("seeded");
        relay.reset(&"mira".into(), "A retired baker.");
        let history = relay.history(&"mira".into()).expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "A retired baker.");
    }

    #[tokio::test]
    async fn ndjson_deltas_become_data_records() {
        let relay = relay();
        relay
            .record_player_message(&request("hello", Some("A baker.")))
            .expect("seeded");

        let stream = reframe(
            upstream(&[
                "{\"message\":{\"role\":\"assistant\",\"content\":\"{\\\"murder\\\": false\"},\"done\":false}\n{\"mess",
                "age\":{\"role\":\"assistant\",\"content\":\"}\"},\"done\":false}\n",
                "{\"message\":{\"role\":\"assistant\",\"content\":\" Good day.\"},\"done\":false}\n",
                "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
            ]),
            Arc::clone(&relay.histories),
            "mira".into(),
            1024,
        );
        let text = collect_text(stream).await;
        assert_eq!(
            text,
            "data: {\"murder\": false\n\ndata: }\n\ndata:  Good day.\n\ndata: \n\n"
        );

        let history = relay.history(&"mira".into()).expect("history");
        assert_eq!(
            history.last(),
            Some(&ChatMessage::new(ChatRole::Assistant, "{\"murder\": false} Good day."))
        );
    }

    #[test]
    fn multiline_delta_splits_into_records() {
        let mut out = String::new();
        push_event(&mut out, "one\ntwo");
        assert_eq!(out, "data: one\ndata: two\n\n");
    }

    #[tokio::test]
    async fn garbage_upstream_is_parse_error() {
        let stream = reframe(upstream(&["not json\n"]), Histories::default(), "mira".into(), 1024);
        let items: Vec<Result<Bytes, LlmError>> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(LlmError::ParseError(_))));
    }

    #[tokio::test]
    async fn upstream_error_line_fails_the_stream() {
        let stream = reframe(
            upstream(&[
                "{\"message\":{\"content\":\"{\\\"murder\\\": \"},\"done\":false}\n",
                "{\"error\":\"model runner has unexpectedly stopped\"}\n",
            ]),
            Histories::default(),
            "mira".into(),
            1024,
        );
        let items: Vec<Result<Bytes, LlmError>> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(
            matches!(items[1], Err(LlmError::RequestFailed(ref e)) if e.contains("unexpectedly stopped"))
        );
    }

    /// Hands out one prepared stream.
    struct Prepared(Mutex<Option<ByteStream>>);

    impl DialogueTransport for Prepared {
        async fn open(&self, _request: &ConversationRequest) -> Result<ByteStream, LlmError> {
            self.0
                .lock()
                .take()
                .ok_or_else(|| LlmError::Unavailable("stream already taken".into()))
        }
    }

    #[tokio::test]
    async fn model_crash_is_a_transport_failure_not_a_verdict() {
        let session = ConversationSession::new(&SessionConfig::default());
        let ticket = match session.begin(&"mira".into()) {
            BeginOutcome::Started(ticket) => ticket,
            other => panic!("expected a started turn, got {other:?}"),
        };
        let transport = Prepared(Mutex::new(Some(reframe(
            upstream(&["{\"error\":\"model runner has unexpectedly stopped\"}\n"]),
            Histories::default(),
            "mira".into(),
            1024,
        ))));

        let outcome = ConversationController::default()
            .run_turn(&transport, &ticket, None, &mut session.turn(&ticket))
            .await;

        assert_eq!(outcome, TurnOutcome::TransportFailed);
        assert!(session.roster().is_empty());
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn abandoned_stream_records_no_reply() {
        let relay = relay();
        relay
            .record_player_message(&request("hello", Some("A baker.")))
            .expect("seeded");

        let mut stream = reframe(
            upstream(&[
                "{\"message\":{\"content\":\"{\\\"murder\\\": true}\"},\"done\":false}\n",
                "{\"message\":{\"content\":\" DIE!\"},\"done\":false}\n",
            ]),
            Arc::clone(&relay.histories),
            "mira".into(),
            1024,
        );
        assert!(stream.next().await.is_some());
        drop(stream);

        let history = relay.history(&"mira".into()).expect("history");
        assert_eq!(history.last().map(|m| m.role), Some(ChatRole::User));
    }

    #[tokio::test]
    async fn unreachable_ollama_is_an_error() {
        let relay = ConversationRelay::new(
            &RelayConfig {
                base_url: "http://127.0.0.1:9".into(),
                model: "llama3".into(),
            },
            &StreamConfig::default(),
        )
        .expect("valid relay config");
        assert!(relay.open(&request("hello", Some("A baker."))).await.is_err());
        // The player's message was still recorded, as the server would have.
        assert_eq!(relay.history(&"mira".into()).map(|h| h.len()), Some(3));
    }
}
