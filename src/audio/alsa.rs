//! ALSA backend calling `aplay` and `amixer`

use super::AudioOutput;
use crate::config::Config;
use crate::error::PlaybackError;
use crate::process;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AlsaOutput {
    aplay_bin: String,
    amixer_bin: String,
    device: String,
    mixer_card: u32,
    mixer_control: String,
}

impl AlsaOutput {
    pub fn new(config: &Config) -> Self {
        Self {
            aplay_bin: config.aplay_bin.clone(),
            amixer_bin: config.amixer_bin.clone(),
            device: config.device.clone(),
            mixer_card: config.mixer_card,
            mixer_control: config.mixer_control.clone(),
        }
    }

    fn play_args(&self, path: &Path) -> Vec<OsString> {
        vec![
            path.as_os_str().to_os_string(),
            format!("--device={}", self.device).into(),
        ]
    }

    fn volume_args(&self, percent: u8) -> Vec<OsString> {
        vec![
            "-c".into(),
            self.mixer_card.to_string().into(),
            "set".into(),
            self.mixer_control.clone().into(),
            format!("{percent}%").into(),
        ]
    }
}

async fn invoke(program: &str, args: Vec<OsString>) -> Result<(), PlaybackError> {
    let finished = process::run(program, args, None)
        .await
        .map_err(|source| PlaybackError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !finished.success() {
        return Err(PlaybackError::Failed {
            program: program.to_string(),
            status: finished.status.to_string(),
            stderr: finished.stderr,
        });
    }
    debug!("{} succeeded", program);
    Ok(())
}

#[async_trait]
impl AudioOutput for AlsaOutput {
    async fn play_file(&self, path: &Path) -> Result<(), PlaybackError> {
        invoke(&self.aplay_bin, self.play_args(path)).await
    }

    async fn set_volume(&self, percent: u8) -> Result<(), PlaybackError> {
        invoke(&self.amixer_bin, self.volume_args(percent)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(aplay: &str) -> AlsaOutput {
        AlsaOutput {
            aplay_bin: aplay.to_string(),
            amixer_bin: "true".to_string(),
            device: "plughw:1,0".to_string(),
            mixer_card: 0,
            mixer_control: "Master".to_string(),
        }
    }

    #[test]
    fn test_command_lines() {
        let alsa = output("aplay");
        assert_eq!(
            alsa.play_args(Path::new("/s/beep.wav")),
            vec![OsString::from("/s/beep.wav"), OsString::from("--device=plughw:1,0")]
        );
        assert_eq!(
            alsa.volume_args(35),
            ["-c", "0", "set", "Master", "35%"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_playback_error() {
        let err = output("false")
            .play_file(Path::new("beep.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        tokio_test::assert_ok!(output("true").set_volume(50).await);
    }
}
