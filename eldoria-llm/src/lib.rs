//! # eldoria-llm — the remote side of a conversation turn
//!
//! Everything that talks to a conversational agent goes through a
//! [`DialogueTransport`], which turns a [`ConversationRequest`] into a raw byte
//! stream of `data:` records:
//!
//!   - [`HttpTransport`] — POSTs to a dialogue server and streams its body
//!   - [`ConversationRelay`] — in-process: keeps per-NPC chat histories and
//!     streams straight from a local Ollama
//!   - [`ScriptedTransport`] — canned streams, for tests and benchmarks
//!
//! The [`ConversationController`] drives one turn over any transport and
//! reports into a [`TurnSink`](eldoria_core::TurnSink).
//!
//! ```text
//! TurnTicket ─► ConversationRequest ─► DialogueTransport ─► bytes
//!                                                             │
//!   TurnSink ◄── text / hostile / error ◄── ConversationController
//! ```

pub mod client;
pub mod controller;
pub mod error;
pub mod prompt;
pub mod relay;
pub mod transport;
pub mod types;

pub use client::HttpTransport;
pub use controller::ConversationController;
pub use error::LlmError;
pub use relay::ConversationRelay;
pub use transport::{ByteStream, DialogueTransport, ScriptedTransport};
pub use types::{ChatMessage, ChatRole, ConversationRequest};
