#![allow(dead_code)]

pub mod mock_audio;
pub mod mock_bus;
pub mod mock_line;
pub mod mock_tts;

use butler::audio::AudioGate;
use butler::bus::{BusHandle, Topics};
use butler::commands::CommandRouter;
use butler::config::Config;
use butler::navigator::ScriptNavigator;
use butler::orchestrator::{Adapters, Orchestrator};
use butler::tts::SpeechCache;
use mock_audio::RecordingOutput;
use mock_bus::MockBroker;
use mock_line::MockLine;
use mock_tts::MockSynth;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const PREFIX: &str = "butler";

/// Temp directories, config and mocks shared by one test
pub struct TestContext {
    pub temp_dir: TempDir,
    pub config: Config,
    pub broker: MockBroker,
    pub output: Arc<RecordingOutput>,
    pub synth: Arc<MockSynth>,
    pub line: MockLine,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(5))
    }

    /// Every device call takes `delay`
    pub fn with_delay(delay: Duration) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("sounds")).expect("Failed to create sounds dir");

        let yaml = format!(
            "mqtt_host: localhost\n\
             mqtt_prefix: {PREFIX}\n\
             interval: 1\n\
             poll_interval_ms: 10\n\
             sounds_path: {root}/sounds\n\
             speech_path: {root}/speech\n\
             model: {root}/voice.onnx\n\
             device: default\n",
            root = root.display()
        );
        let config = Config::from_yaml(&yaml).expect("Failed to parse test config");

        Self {
            temp_dir,
            config,
            broker: MockBroker::new(),
            output: Arc::new(RecordingOutput::new(delay)),
            synth: Arc::new(MockSynth::new()),
            line: MockLine::new(),
        }
    }

    pub fn adapters(&self) -> Adapters {
        Adapters {
            transport: Arc::new(self.broker.clone()),
            output: self.output.clone(),
            synthesizer: self.synth.clone(),
            button: Box::new(self.line.clone()),
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(&self.config, self.adapters())
    }

    /// A router wired to the mocks, without any running tasks
    pub fn router(&self) -> (Arc<CommandRouter>, Arc<Mutex<ScriptNavigator>>) {
        let navigator = Arc::new(Mutex::new(ScriptNavigator::new()));
        let router = CommandRouter::new(
            navigator.clone(),
            Arc::new(SpeechCache::new(
                self.config.speech_path.clone(),
                self.config.model.clone(),
                self.synth.clone(),
            )),
            Arc::new(AudioGate::new(self.output.clone())),
            BusHandle::new(),
            Topics::new(PREFIX),
            self.config.sounds_path.clone(),
        );
        (Arc::new(router), navigator)
    }

    pub fn topic(suffix: &str) -> String {
        format!("{PREFIX}/{suffix}")
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn eventually<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
