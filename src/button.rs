//! Push button input
//!
//! The button pulls its line low when pressed. The line is sampled at a fixed
//! interval and every low sample is a press; there is no debounce, so holding
//! the button repeats the press on each poll.

use crate::commands::CommandRouter;
use crate::error::ButlerResult;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Electrical level of a digital line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// A readable digital input
#[async_trait]
pub trait InputLine: Send {
    async fn read(&mut self) -> io::Result<Level>;
}

/// GPIO line exposed through the sysfs interface
#[derive(Debug)]
pub struct SysfsLine {
    value: PathBuf,
}

impl SysfsLine {
    /// Export `pin` under `root` if needed and configure it as an input
    pub async fn open(root: &Path, pin: u32) -> io::Result<Self> {
        let dir = root.join(format!("gpio{pin}"));
        if !tokio::fs::try_exists(&dir).await? {
            info!("🔌 Exporting GPIO {}", pin);
            tokio::fs::write(root.join("export"), pin.to_string()).await?;
        }
        tokio::fs::write(dir.join("direction"), "in").await?;
        Ok(Self {
            value: dir.join("value"),
        })
    }
}

#[async_trait]
impl InputLine for SysfsLine {
    async fn read(&mut self) -> io::Result<Level> {
        let raw = tokio::fs::read_to_string(&self.value).await?;
        match raw.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected GPIO value {other:?} in {}", self.value.display()),
            )),
        }
    }
}

pub struct ButtonWatcher {
    line: Box<dyn InputLine>,
    router: Arc<CommandRouter>,
    poll: Duration,
}

impl ButtonWatcher {
    pub fn new(line: Box<dyn InputLine>, router: Arc<CommandRouter>, poll: Duration) -> Self {
        Self { line, router, poll }
    }

    /// Poll until the line can no longer be read
    pub async fn run(mut self) -> ButlerResult<()> {
        info!("🔘 Watching button every {:?}", self.poll);
        loop {
            if self.line.read().await? == Level::Low {
                if let Err(e) = self.router.button_pressed().await {
                    error!("❌ Button press handling failed: {}", e);
                }
            }
            tokio::time::sleep(self.poll).await;
        }
    }
}
