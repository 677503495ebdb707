//! Mock Synthesizer for Testing
//!
//! Writes the text itself as the "waveform" and counts invocations.

use async_trait::async_trait;
use butler::error::SynthesisError;
use butler::tts::Synthesizer;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MockSynth {
    pub calls: AtomicUsize,
    /// Simulate a broken voice model
    pub should_fail: AtomicBool,
}

impl MockSynth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for MockSynth {
    async fn synthesize(
        &self,
        text: &str,
        model: &Path,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SynthesisError::ModelMissing(model.to_path_buf()));
        }
        tokio::fs::write(output, text.as_bytes()).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
