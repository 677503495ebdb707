//! TTS (Text-to-Speech) Module
//!
//! Rendered speech is cached on disk so each phrase is synthesized once.

use crate::error::SynthesisError;
use async_trait::async_trait;
use std::path::Path;

pub mod cache;
pub mod piper;

pub use cache::SpeechCache;
pub use piper::PiperSynthesizer;

/// Trait for speech synthesis backends
#[async_trait]
pub trait Synthesizer: Send + Sync + std::fmt::Debug {
    /// Render `text` with the voice in `model` into a WAV file at `output`
    async fn synthesize(&self, text: &str, model: &Path, output: &Path)
        -> Result<(), SynthesisError>;

    /// Get the engine name
    fn name(&self) -> &str;
}
