//! # eldoria-scene — game-scene integration for Eldoria
//!
//! Glue between a game's scene loop and the conversation core. The game
//! reports what the player did as [`SceneEvent`]s; the [`DialogueScene`]
//! turns them into session operations and turns, and reports back through
//! the game's [`Presentation`].
//!
//! ```text
//! ┌──────────────── game ─────────────────┐
//! │  input / physics          renderer    │
//! └─────┬──────────────────────────▲──────┘
//!       │ SceneEvent               │ Presentation
//!       ▼                          │
//! ┌─────────────── DialogueScene ─────────┐
//! │  ConversationSession   (eldoria-core) │
//! │  ConversationController (eldoria-llm) │
//! │  CharacterRegistry                    │
//! └───────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events` — what the player did
//! - `presentation` — callbacks the renderer implements
//! - `characters` — NPC lore lookup for opening turns
//! - `scene` — the dispatcher

pub mod characters;
pub mod events;
pub mod presentation;
pub mod scene;

pub use characters::CharacterRegistry;
pub use events::SceneEvent;
pub use presentation::Presentation;
pub use scene::DialogueScene;
