//! Script Navigator
//!
//! A cursor over the ordered list of script names published on the bus,
//! plus numbered favorite slots remembering cursor positions.
//!
//! Not synchronized by itself; the orchestrator keeps it behind one lock.

use crate::error::ValidationError;
use std::collections::HashMap;
use tracing::{debug, info};

/// Favorite slot number
pub type Slot = u32;

#[derive(Debug, Default)]
pub struct ScriptNavigator {
    /// Script identifiers in bus order
    scripts: Vec<String>,
    /// Always a valid index into `scripts`, or `None` when it is empty
    position: Option<usize>,
    /// Positions captured by `set_favorite`; may go stale after `set_scripts`
    favorites: HashMap<Slot, usize>,
}

impl ScriptNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list from a JSON array of strings.
    ///
    /// On error nothing changes.
    pub fn set_scripts(&mut self, json: &str) -> Result<(), ValidationError> {
        let scripts: Vec<String> = serde_json::from_str(json).map_err(ValidationError::Scripts)?;
        info!("📋 Script list replaced: {} scripts", scripts.len());
        self.position = if scripts.is_empty() { None } else { Some(0) };
        self.scripts = scripts;
        Ok(())
    }

    /// Move to the next script, wrapping to the first
    pub fn increment(&mut self) {
        if let Some(pos) = self.position {
            self.position = Some((pos + 1) % self.scripts.len());
            debug!("Script cursor -> {:?}", self.position);
        }
    }

    /// Move to the previous script, wrapping to the last
    pub fn decrement(&mut self) {
        if let Some(pos) = self.position {
            let len = self.scripts.len();
            self.position = Some((pos + len - 1) % len);
            debug!("Script cursor -> {:?}", self.position);
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.position.map(|pos| self.scripts[pos].as_str())
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Remember the current position under `slot`
    pub fn set_favorite(&mut self, slot: Slot) {
        if let Some(pos) = self.position {
            info!("⭐ Favorite {} -> {}", slot, self.scripts[pos]);
            self.favorites.insert(slot, pos);
        }
    }

    /// Script stored under `slot`, if the slot is set and still in range
    pub fn get_favorite(&self, slot: Slot) -> Option<&str> {
        let pos = self.valid_favorite(slot)?;
        Some(self.scripts[pos].as_str())
    }

    /// Jump the cursor to the favorite in `slot` and return its script
    pub fn recall_favorite(&mut self, slot: Slot) -> Option<&str> {
        let pos = self.valid_favorite(slot)?;
        self.position = Some(pos);
        Some(self.scripts[pos].as_str())
    }

    fn valid_favorite(&self, slot: Slot) -> Option<usize> {
        let pos = *self.favorites.get(&slot)?;
        if pos < self.scripts.len() {
            Some(pos)
        } else {
            debug!("Favorite {} points past the current list", slot);
            None
        }
    }
}
