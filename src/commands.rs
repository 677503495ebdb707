//! Command processing module
//!
//! Maps bus topic suffixes to actions and runs them against the shared
//! navigator, the speech cache and the audio gate.

use crate::audio::AudioGate;
use crate::bus::{BusHandle, Topics};
use crate::error::{ButlerError, ButlerResult, ValidationError};
use crate::navigator::{ScriptNavigator, Slot};
use crate::tts::SpeechCache;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Payload published on `<prefix>/action` when the button fires
pub const BUTTON_PAYLOAD: &str = "button pressed";

/// A decoded bus command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Speak the text
    Say(String),
    /// Set the mixer volume, in percent
    Volume(u8),
    /// Play `<sounds>/<name>.wav`
    Play(String),
    /// Replace the script list (raw JSON)
    Scripts(String),
    Next,
    Previous,
    /// Remember the current script in a slot
    Favorite(Slot),
    /// Jump to the script remembered in a slot
    Recall(Slot),
}

impl Command {
    /// Decode a command. `Ok(None)` means the suffix is not a command.
    pub fn parse(suffix: &str, payload: &str) -> Result<Option<Self>, ValidationError> {
        let command = match suffix {
            "say" => {
                let text = payload.trim();
                if text.is_empty() {
                    return Err(ValidationError::EmptySpeech);
                }
                Command::Say(text.to_string())
            }
            "volume" => Command::Volume(parse_volume(payload)?),
            "play" => Command::Play(parse_sound(payload)?),
            "scripts" => Command::Scripts(payload.to_string()),
            "next" => Command::Next,
            "previous" => Command::Previous,
            "favorite" => Command::Favorite(parse_slot(payload)?),
            "recall" => Command::Recall(parse_slot(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

fn parse_volume(payload: &str) -> Result<u8, ValidationError> {
    let text = payload.trim();
    let digits = text.strip_suffix('%').unwrap_or(text);
    match digits.parse::<u8>() {
        Ok(percent) if percent <= 100 => Ok(percent),
        _ => Err(ValidationError::Volume(payload.to_string())),
    }
}

fn parse_sound(payload: &str) -> Result<String, ValidationError> {
    let name = payload.trim();
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0']);
    if plain {
        Ok(name.to_string())
    } else {
        Err(ValidationError::SoundName(payload.to_string()))
    }
}

fn parse_slot(payload: &str) -> Result<Slot, ValidationError> {
    payload
        .trim()
        .parse()
        .map_err(|_| ValidationError::Slot(payload.to_string()))
}

/// Routes decoded commands to their handlers
#[derive(Debug)]
pub struct CommandRouter {
    navigator: Arc<Mutex<ScriptNavigator>>,
    speech: Arc<SpeechCache>,
    gate: Arc<AudioGate>,
    bus: BusHandle,
    topics: Topics,
    sounds_dir: PathBuf,
}

impl CommandRouter {
    pub fn new(
        navigator: Arc<Mutex<ScriptNavigator>>,
        speech: Arc<SpeechCache>,
        gate: Arc<AudioGate>,
        bus: BusHandle,
        topics: Topics,
        sounds_dir: PathBuf,
    ) -> Self {
        Self {
            navigator,
            speech,
            gate,
            bus,
            topics,
            sounds_dir,
        }
    }

    /// Handle one inbound message. Failures are logged, never returned.
    pub async fn handle(&self, suffix: &str, payload: &str) {
        let command = match Command::parse(suffix, payload) {
            Ok(Some(command)) => command,
            Ok(None) => {
                debug!("Ignoring unrecognized topic suffix '{}'", suffix);
                return;
            }
            Err(e) => {
                warn!("⚠️ Dropping '{}' command: {}", suffix, e);
                return;
            }
        };

        match self.execute(command).await {
            Ok(()) => {}
            Err(ButlerError::Validation(e)) => warn!("⚠️ Dropping '{}' command: {}", suffix, e),
            Err(e) => error!("❌ '{}' command failed: {}", suffix, e),
        }
    }

    /// Run a decoded command to completion
    pub async fn execute(&self, command: Command) -> ButlerResult<()> {
        match command {
            Command::Say(text) => {
                let path = self.speech.render_or_fetch(&text).await?;
                self.gate.play(&path).await?;
            }
            Command::Volume(percent) => {
                self.gate.set_volume(percent).await?;
                info!("✅ Volume set to {}%", percent);
                self.gate.play(&self.beep_path()).await?;
            }
            Command::Play(name) => {
                self.gate
                    .play(&self.sounds_dir.join(format!("{name}.wav")))
                    .await?;
            }
            Command::Scripts(json) => {
                self.navigator.lock()?.set_scripts(&json)?;
            }
            Command::Next => {
                let current = {
                    let mut navigator = self.navigator.lock()?;
                    navigator.increment();
                    navigator.current().map(str::to_owned)
                };
                self.announce(current).await;
            }
            Command::Previous => {
                let current = {
                    let mut navigator = self.navigator.lock()?;
                    navigator.decrement();
                    navigator.current().map(str::to_owned)
                };
                self.announce(current).await;
            }
            Command::Favorite(slot) => {
                self.navigator.lock()?.set_favorite(slot);
            }
            Command::Recall(slot) => {
                let recalled = self.navigator.lock()?.recall_favorite(slot).map(str::to_owned);
                if recalled.is_none() {
                    info!("Favorite {} is not set", slot);
                }
                self.announce(recalled).await;
            }
        }
        Ok(())
    }

    /// React to a physical button press
    pub async fn button_pressed(&self) -> ButlerResult<()> {
        let current = self.navigator.lock()?.current().map(str::to_owned);
        info!(
            "🔘 Button pressed (current script: {})",
            current.as_deref().unwrap_or("none")
        );

        if let Err(e) = self
            .bus
            .publish(&self.topics.topic("action"), BUTTON_PAYLOAD)
            .await
        {
            warn!("⚠️ Could not announce button press: {}", e);
        }
        self.gate.play(&self.beep_path()).await?;
        Ok(())
    }

    /// Publish the current script on `<prefix>/current`
    async fn announce(&self, current: Option<String>) {
        let Some(name) = current else {
            return;
        };
        if let Err(e) = self.bus.publish(&self.topics.topic("current"), &name).await {
            warn!("⚠️ Could not publish current script: {}", e);
        }
    }

    fn beep_path(&self) -> PathBuf {
        self.sounds_dir.join("beep.wav")
    }
}
