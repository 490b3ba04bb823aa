//! Prompts used by the in-process relay.
//!
//! Every NPC history starts with [`WORLD_PROMPT`] followed by that NPC's own
//! lore. The world prompt is what makes the model open each reply with the
//! `{"murder": bool}` object the signal detector looks for.

use crate::types::{ChatMessage, ChatRole};

/// Shared setting and the reply contract every NPC follows.
pub const WORLD_PROMPT: &str = r#"You live in Eldoria, a prosperous seaside city where the monsters are long gone, magic serves everyone and the king is kind. It is a sunny morning and a breeze comes in from the ocean.
You are talking to the main character, who is arrogant and full of themselves. You have met plenty of people like them, so you stay calm; you grow annoyed only slowly, but everyone has a limit. You have a life, worries and a history of your own, and you talk about the things you care about, not just about Eldoria.
Rules you always follow, without exception:
- Answer in at most 2 sentences.
- If they keep greeting you, keep your answers short and natural.
- Never answer with only an emote; always say something.
- Begin EVERY answer with a valid JSON object of the form {"murder": boolean}.
- Set "murder" to true only if the main character has made you angry enough to kill them; otherwise set it to false.
- Always answer.
- If the main character says something so vile you cannot bear it, answer with {"murder": true} DIE! which ends the conversation. Never leave out the JSON object, or the game breaks."#;

/// Throwaway prompt used to load the model into memory.
pub const PRELOAD_PROMPT: &str = r#"Preloading the model into memory. Just reply with "ok"."#;

/// The two system messages that open an NPC's history.
#[must_use]
pub fn seed_messages(lore: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(ChatRole::System, WORLD_PROMPT),
        ChatMessage::new(ChatRole::System, lore),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_prompt_demands_signal_object() {
        assert!(WORLD_PROMPT.contains(r#"{"murder": boolean}"#));
        assert!(WORLD_PROMPT.contains(r#"{"murder": true} DIE!"#));
    }

    #[test]
    fn seed_is_world_then_lore() {
        let seed = seed_messages("You are Mira, the baker.");
        assert_eq!(seed.len(), 2);
        assert_eq!(seed[0].content, WORLD_PROMPT);
        assert_eq!(seed[1], ChatMessage::new(ChatRole::System, "You are Mira, the baker."));
    }
}
