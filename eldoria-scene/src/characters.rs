//! NPC lore registry.
//!
//! The opening turn of every conversation carries the NPC's lore so the
//! remote side can seed its history. Lore lives in a TOML file:
//!
//! ```toml
//! [characters]
//! mira = "You are Mira, the baker on Harbour Street..."
//! ```

use std::collections::BTreeMap;

use eldoria_core::error::Result;
use eldoria_core::{EldoriaError, TargetId};
use serde::{Deserialize, Serialize};

/// Identity → lore lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterRegistry {
    #[serde(default)]
    characters: BTreeMap<TargetId, String>,
}

impl CharacterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML string.
    ///
    /// # Errors
    /// Returns `EldoriaError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| EldoriaError::Config(e.to_string()))
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Add or replace a character.
    pub fn insert(&mut self, target: impl Into<TargetId>, lore: impl Into<String>) {
        self.characters.insert(target.into(), lore.into());
    }

    /// Lore for `target`, if known.
    #[must_use]
    pub fn lore(&self, target: &TargetId) -> Option<&str> {
        self.characters.get(target).map(String::as_str)
    }

    /// Every known character, sorted by identity.
    pub fn names(&self) -> impl Iterator<Item = &TargetId> {
        self.characters.keys()
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether no characters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
