//! Mock Audio Output for Testing
//!
//! Records every device call with its start and end time.

use async_trait::async_trait;
use butler::audio::AudioOutput;
use butler::error::PlaybackError;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One completed device call
#[derive(Debug, Clone)]
pub struct DeviceCall {
    /// File name for playback, `volume:<n>` for mixer calls
    pub what: String,
    pub start: Instant,
    pub end: Instant,
}

#[derive(Debug)]
pub struct RecordingOutput {
    pub calls: Mutex<Vec<DeviceCall>>,
    /// Simulated duration of each call
    pub delay: Duration,
    /// Calls whose `what` is listed here fail
    pub failing: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingOutput {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delay,
            failing: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn fail_on(&self, what: &str) {
        self.failing.lock().unwrap().push(what.to_string());
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn played(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.what).collect()
    }

    /// Most calls ever in flight at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn device_call(&self, what: String) -> Result<(), PlaybackError> {
        let start = Instant::now();
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        let end = Instant::now();
        let fail = self.failing.lock().unwrap().contains(&what);
        self.calls.lock().unwrap().push(DeviceCall {
            what: what.clone(),
            start,
            end,
        });

        if fail {
            return Err(PlaybackError::Failed {
                program: "mock".into(),
                status: "exit status: 1".into(),
                stderr: format!("cannot play {what}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AudioOutput for RecordingOutput {
    async fn play_file(&self, path: &Path) -> Result<(), PlaybackError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.device_call(name).await
    }

    async fn set_volume(&self, percent: u8) -> Result<(), PlaybackError> {
        self.device_call(format!("volume:{percent}")).await
    }
}
