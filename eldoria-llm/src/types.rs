//! Wire types for the dialogue endpoint and the chat backend.

use eldoria_core::turn::TurnTicket;
use serde::{Deserialize, Serialize};

/// Body of a `POST /conversation` request.
///
/// The opening turn carries the NPC's lore in `system`; follow-ups omit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRequest {
    /// What the player said.
    pub message: String,
    /// Target identity.
    pub npc_name: String,
    /// Lore/context for the target, opening turn only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl ConversationRequest {
    /// Build the request for a session-issued turn.
    ///
    /// `lore` is attached only when the ticket is an opening turn.
    #[must_use]
    pub fn for_turn(ticket: &TurnTicket, lore: Option<&str>) -> Self {
        Self {
            message: ticket.message.clone(),
            npc_name: ticket.target.as_str().to_owned(),
            system: if ticket.opening {
                lore.map(str::to_owned)
            } else {
                None
            },
        }
    }
}

/// Chat participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions and lore.
    System,
    /// The player.
    User,
    /// The NPC.
    Assistant,
}

/// One message of a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who said it.
    pub role: ChatRole,
    /// What was said.
    pub content: String,
}

impl ChatMessage {
    /// Create a message.
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One line of Ollama's streaming `/api/chat` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChatChunkMessage>,
    #[serde(default)]
    pub done: bool,
    /// Set when the model runner fails mid-stream (still HTTP 200).
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChunkMessage {
    #[serde(default)]
    pub content: String,
}
