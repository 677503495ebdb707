//! Piper TTS backend calling a local binary

use super::Synthesizer;
use crate::error::SynthesisError;
use crate::process;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    program: String,
}

impl PiperSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Synthesizer for PiperSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        model: &Path,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        if !tokio::fs::try_exists(model).await.unwrap_or(false) {
            return Err(SynthesisError::ModelMissing(model.to_path_buf()));
        }

        info!("🗣️ Synthesizing speech with {}", model.display());
        let args: [OsString; 4] = [
            "-m".into(),
            model.as_os_str().to_os_string(),
            "-f".into(),
            output.as_os_str().to_os_string(),
        ];
        let finished = process::run(&self.program, args, Some(text.as_bytes()))
            .await
            .map_err(|source| {
                error!("❌ Failed to spawn {}: {}", self.program, source);
                SynthesisError::Spawn {
                    program: self.program.clone(),
                    source,
                }
            })?;

        if !finished.success() {
            return Err(SynthesisError::Failed {
                program: self.program.clone(),
                status: finished.status.to_string(),
                stderr: finished.stderr,
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "piper"
    }
}
