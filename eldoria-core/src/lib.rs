//! # Eldoria Core Library
//!
//! Transport-agnostic core for streamed NPC conversations.
//!
//! A conversation turn arrives as an incrementally delivered, line-oriented
//! event stream. Ahead of the visible reply the remote agent embeds a small
//! JSON object (`{"murder": bool}`); the token right before its closing brace
//! decides whether the NPC turned hostile.
//!
//! ```text
//! bytes ──► Utf8Decoder ──► LineBuffer ──► EventExtractor ──► SignalDetector
//!                                                                 │
//!                           ConversationSession ◄── TurnSink ◄────┘
//! ```
//!
//! - [`stream`] — the incremental decoder pipeline
//! - [`session`] — the conversation state machine, hostility roster and cooldown
//! - [`turn`] — the seam through which a running turn reports back
//! - [`display`] — what the dialogue box shows

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod display;
pub mod error;
pub mod session;
pub mod stream;
pub mod turn;
pub mod types;

pub use config::EldoriaConfig;
pub use error::EldoriaError;
pub use session::{ConversationSession, SessionState};
pub use turn::{TurnOutcome, TurnSink};
pub use types::TargetId;
