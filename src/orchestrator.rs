//! Orchestrator
//!
//! Owns the shared state, wires the components together and supervises the
//! three long-running tasks. The first task to stop takes the others down.

use crate::audio::{AlsaOutput, AudioGate, AudioOutput};
use crate::bus::{BusHandle, BusTransport, ListenerState, MqttTransport, ReconnectingBusListener, Topics};
use crate::button::{ButtonWatcher, InputLine, SysfsLine};
use crate::clock::ClockTicker;
use crate::commands::CommandRouter;
use crate::config::Config;
use crate::error::{ButlerError, ButlerResult};
use crate::navigator::ScriptNavigator;
use crate::tts::{PiperSynthesizer, SpeechCache, Synthesizer};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// External collaborators the orchestrator drives
pub struct Adapters {
    pub transport: Arc<dyn BusTransport>,
    pub output: Arc<dyn AudioOutput>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub button: Box<dyn InputLine>,
}

impl Adapters {
    /// Production adapters: MQTT, ALSA tools, piper and a sysfs GPIO line
    pub async fn from_config(config: &Config) -> ButlerResult<Self> {
        let button = SysfsLine::open(&config.gpio_root, config.button_pin).await?;
        Ok(Self {
            transport: Arc::new(MqttTransport::new(config)),
            output: Arc::new(AlsaOutput::new(config)),
            synthesizer: Arc::new(PiperSynthesizer::new(config.piper_bin.clone())),
            button: Box::new(button),
        })
    }
}

pub struct Orchestrator {
    navigator: Arc<Mutex<ScriptNavigator>>,
    bus: BusHandle,
    listener: ReconnectingBusListener,
    button: ButtonWatcher,
    clock: ClockTicker,
}

impl Orchestrator {
    pub fn new(config: &Config, adapters: Adapters) -> Self {
        let navigator = Arc::new(Mutex::new(ScriptNavigator::new()));
        let bus = BusHandle::new();
        let topics = Topics::new(config.prefix());
        let gate = Arc::new(AudioGate::new(adapters.output));
        let speech = Arc::new(SpeechCache::new(
            config.speech_path.clone(),
            config.model.clone(),
            adapters.synthesizer,
        ));

        let router = Arc::new(CommandRouter::new(
            navigator.clone(),
            speech,
            gate,
            bus.clone(),
            topics.clone(),
            config.sounds_path.clone(),
        ));
        let listener = ReconnectingBusListener::new(
            adapters.transport,
            router.clone(),
            topics,
            bus.clone(),
            config.retry_interval(),
        );
        let button = ButtonWatcher::new(adapters.button, router, config.poll_interval());
        let clock = ClockTicker::new(config.tick_interval());

        Self {
            navigator,
            bus,
            listener,
            button,
            clock,
        }
    }

    pub fn navigator(&self) -> Arc<Mutex<ScriptNavigator>> {
        self.navigator.clone()
    }

    pub fn bus(&self) -> BusHandle {
        self.bus.clone()
    }

    pub fn listener_state(&self) -> watch::Receiver<ListenerState> {
        self.listener.state()
    }

    /// Run until SIGINT/SIGTERM or until a task fails
    pub async fn run(self) -> ButlerResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves or until a task fails
    pub async fn run_until<F>(self, shutdown: F) -> ButlerResult<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            button,
            clock,
            ..
        } = self;

        let mut tasks = JoinSet::new();
        info!("Creating bus listener");
        tasks.spawn(async move { ("bus listener", listener.run().await) });
        info!("Creating button watcher");
        tasks.spawn(async move { ("button watcher", button.run().await) });
        info!("Creating clock worker");
        tasks.spawn(async move { ("clock", clock.run().await) });

        let outcome = tokio::select! {
            _ = shutdown => {
                info!("🛑 Shutdown requested");
                Ok(())
            }
            Some(joined) = tasks.join_next() => Err(match joined {
                Ok((name, Ok(()))) => ButlerError::Task(name, "exited".to_string()),
                Ok((name, Err(e))) => ButlerError::Task(name, e.to_string()),
                Err(e) => ButlerError::Task("task", e.to_string()),
            }),
        };

        if let Err(e) = &outcome {
            error!("💥 {}; shutting down", e);
        }
        // Aborting drops in-flight subprocess handles, which kills them
        tasks.shutdown().await;
        info!("Main loop completed.");
        outcome
    }
}

/// Resolves on the first SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("⚠️ Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
