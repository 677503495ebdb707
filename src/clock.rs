//! Heartbeat clock

use crate::error::ButlerResult;
use chrono::NaiveDateTime;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ClockTicker {
    interval: Duration,
}

impl ClockTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub async fn run(self) -> ButlerResult<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            info!("🕒 {}", heartbeat(&chrono::Local::now().naive_local()));
        }
    }
}

pub fn heartbeat(now: &NaiveDateTime) -> String {
    now.format("%a, %b %d %H:%M %p").to_string()
}
