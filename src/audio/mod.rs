//! Audio output
//!
//! Every sound the butler makes goes through one [`AudioGate`], which holds
//! the speaker for the whole duration of a playback or mixer call.

use crate::error::PlaybackError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub mod alsa;

pub use alsa::AlsaOutput;

/// Capability to drive the physical output device
#[async_trait]
pub trait AudioOutput: Send + Sync + std::fmt::Debug {
    /// Play a WAV file to completion
    async fn play_file(&self, path: &Path) -> Result<(), PlaybackError>;

    /// Set the master volume, in percent
    async fn set_volume(&self, percent: u8) -> Result<(), PlaybackError>;
}

/// Exclusive-access serializer around an [`AudioOutput`].
///
/// Waiters are served in arrival order.
#[derive(Debug)]
pub struct AudioGate {
    output: Arc<dyn AudioOutput>,
    turn: Mutex<()>,
}

impl AudioGate {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            turn: Mutex::new(()),
        }
    }

    /// Play `path` once nothing else is using the device
    pub async fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        let _turn = self.turn.lock().await;
        info!("🔊 Playing {}", path.display());
        let result = self.output.play_file(path).await;
        match &result {
            Ok(()) => debug!("Playback of {} finished", path.display()),
            Err(e) => error!("❌ Playback failed for {}: {}", path.display(), e),
        }
        result
    }

    /// Change the volume once nothing else is using the device
    pub async fn set_volume(&self, percent: u8) -> Result<(), PlaybackError> {
        let _turn = self.turn.lock().await;
        info!("🎚️ Setting volume to {}%", percent);
        let result = self.output.set_volume(percent).await;
        if let Err(e) = &result {
            error!("❌ Set volume failed: {}", e);
        }
        result
    }
}
